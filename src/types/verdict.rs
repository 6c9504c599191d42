//! Risk verdicts produced for scored contracts and batches

use serde::{Deserialize, Serialize};

/// Round to a fixed number of decimals, resolving exact ties to the even digit
/// (`round_dp(0.03125, 4) == 0.0312`).
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Severity attached to a rule-based fraud signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Heuristic that produced a fraud signal, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    RoundNumber,
    SingleBidder,
    VagueTitle,
    CostOverrun,
    SundayAward,
    DecemberRush,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        SignalKind::RoundNumber,
        SignalKind::SingleBidder,
        SignalKind::VagueTitle,
        SignalKind::CostOverrun,
        SignalKind::SundayAward,
        SignalKind::DecemberRush,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            SignalKind::RoundNumber => "round_number",
            SignalKind::SingleBidder => "single_bidder",
            SignalKind::VagueTitle => "vague_title",
            SignalKind::CostOverrun => "cost_overrun",
            SignalKind::SundayAward => "sunday_award",
            SignalKind::DecemberRush => "december_rush",
        }
    }

    /// Human-facing name
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::RoundNumber => "Round Number Trap",
            SignalKind::SingleBidder => "Single Bidder",
            SignalKind::VagueTitle => "Vague Title",
            SignalKind::CostOverrun => "Cost Overrun",
            SignalKind::SundayAward => "Sunday Award",
            SignalKind::DecemberRush => "December Rush",
        }
    }
}

/// A rule-based fraud indicator detected on one contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudSignal {
    pub signal: SignalKind,
    pub description: String,
    pub severity: Severity,
}

impl FraudSignal {
    pub fn new(signal: SignalKind, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            signal,
            description: description.into(),
            severity,
        }
    }
}

/// Discrete risk tier derived from the corruption risk index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from a CRI. Tiers are closed below, open above.
    pub fn from_cri(cri: f64, thresholds: &RiskLevelThresholds) -> Self {
        if cri >= thresholds.critical {
            RiskLevel::Critical
        } else if cri >= thresholds.high {
            RiskLevel::High
        } else if cri >= thresholds.moderate {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "IMMEDIATE INVESTIGATION REQUIRED",
            RiskLevel::High => "Detailed audit recommended",
            RiskLevel::Moderate => "Enhanced monitoring advised",
            RiskLevel::Low => "Standard oversight sufficient",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Low => "low",
        }
    }
}

/// Lower bounds of the moderate, high and critical tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub moderate: f64,
    pub high: f64,
    pub critical: f64,
}

impl RiskLevelThresholds {
    /// Tiers must not overlap
    pub fn is_ascending(&self) -> bool {
        self.moderate < self.high && self.high < self.critical
    }
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.3,
            high: 0.5,
            critical: 0.7,
        }
    }
}

/// Diagnostic subset of the derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBreakdown {
    pub price_efficiency: f64,
    pub is_round_number: bool,
    pub single_bidder: bool,
    pub title_length: usize,
    pub award_month: u32,
    pub cost_overrun_percent: f64,
}

/// Verdict for a single contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub contract_name: String,
    /// Corruption risk index, rounded to 4 decimals
    pub predicted_cri: f64,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub fraud_signals: Vec<FraudSignal>,
    pub feature_breakdown: FeatureBreakdown,
}

/// Verdict counts per tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Moderate => self.moderate += 1,
            RiskLevel::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }
}

/// Distribution summary over a scored batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_contracts: usize,
    pub average_cri: f64,
    pub max_cri: f64,
    pub min_cri: f64,
    pub risk_distribution: RiskDistribution,
}

impl BatchSummary {
    /// Summarize scored contracts. Returns `None` for an empty slice.
    pub fn from_predictions(predictions: &[PredictionResult]) -> Option<Self> {
        if predictions.is_empty() {
            return None;
        }

        let mut distribution = RiskDistribution::default();
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for prediction in predictions {
            distribution.record(prediction.risk_level);
            sum += prediction.predicted_cri;
            min = min.min(prediction.predicted_cri);
            max = max.max(prediction.predicted_cri);
        }

        let mean = sum / predictions.len() as f64;

        Some(Self {
            total_contracts: predictions.len(),
            // Rounding can push the mean a hair outside the grid points it sits between
            average_cri: round_dp(mean, 4).clamp(round_dp(min, 4), round_dp(max, 4)),
            max_cri: round_dp(max, 4),
            min_cri: round_dp(min, 4),
            risk_distribution: distribution,
        })
    }
}

/// Batch verdicts in input order together with their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub predictions: Vec<PredictionResult>,
}
