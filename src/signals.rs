//! Rule-based fraud signal detection over single contracts.
//!
//! Rules run in a fixed order and the output preserves it.

use crate::types::contract::ContractRecord;
use crate::types::verdict::{FraudSignal, Severity, SignalKind};

/// Titles shorter than this (in characters) are considered vague
pub const VAGUE_TITLE_CHARS: usize = 30;
/// Overrun percentage above which a cost overrun is flagged
pub const OVERRUN_FLAG_PCT: f64 = 5.0;
/// Overrun percentage above which a cost overrun is high severity
pub const OVERRUN_HIGH_PCT: f64 = 20.0;

/// True when the amount is an exact multiple of 1000
pub fn is_round_thousand(amount: f64) -> bool {
    amount % 1000.0 == 0.0
}

/// Evaluates the fixed heuristic rule set
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSignalDetector;

impl RuleSignalDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect every signal the contract triggers. Pure; the record is not touched.
    pub fn detect(&self, contract: &ContractRecord) -> Vec<FraudSignal> {
        let mut signals = Vec::new();

        if is_round_thousand(contract.final_price) {
            signals.push(FraudSignal::new(
                SignalKind::RoundNumber,
                format!(
                    "Final price ({}) is a round number (divisible by 1000)",
                    group_thousands(contract.final_price)
                ),
                Severity::Medium,
            ));
        }

        if contract.bidders == 1 {
            signals.push(FraudSignal::new(
                SignalKind::SingleBidder,
                "Only one bidder participated - indicates potential bid rigging",
                Severity::High,
            ));
        }

        let title_length = contract.title_length();
        if title_length < VAGUE_TITLE_CHARS {
            signals.push(FraudSignal::new(
                SignalKind::VagueTitle,
                format!(
                    "Contract title is too short ({} chars) - may hide true purpose",
                    title_length
                ),
                Severity::Medium,
            ));
        }

        if let Some(overrun) = overrun_percent(contract) {
            if overrun > OVERRUN_FLAG_PCT {
                let severity = if overrun > OVERRUN_HIGH_PCT {
                    Severity::High
                } else {
                    Severity::Medium
                };
                signals.push(FraudSignal::new(
                    SignalKind::CostOverrun,
                    format!("Final price exceeds estimate by {:.1}%", overrun),
                    severity,
                ));
            }
        }

        if contract.is_sunday {
            signals.push(FraudSignal::new(
                SignalKind::SundayAward,
                "Contract awarded on Sunday - unusual timing",
                Severity::Low,
            ));
        }

        if contract.is_december {
            signals.push(FraudSignal::new(
                SignalKind::DecemberRush,
                "Contract awarded in December - year-end budget spending rush",
                Severity::Low,
            ));
        }

        signals
    }
}

/// Whole-number amount with comma thousands separators, e.g. `1,250,000`
pub fn group_thousands(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0.0 && digits != "0" {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Percentage by which the final price exceeds a positive estimate
fn overrun_percent(contract: &ContractRecord) -> Option<f64> {
    contract
        .usable_estimate()
        .map(|estimate| (contract.final_price - estimate) / estimate * 100.0)
}
