//! Procurement contract records submitted for risk scoring

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};

/// Award month assumed when the record does not carry one
pub const DEFAULT_AWARD_MONTH: u32 = 6;

/// A single public-procurement contract as decoded from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Contract / tender title
    #[serde(alias = "contract_title")]
    pub name: String,

    /// Contracting department
    #[serde(default)]
    pub department: Option<String>,

    /// Estimated contract value
    #[serde(default)]
    pub estimated_price: Option<f64>,

    /// Final (awarded) contract value
    pub final_price: f64,

    /// Number of recorded bidders
    pub bidders: u32,

    /// Month of award (1-12)
    #[serde(default)]
    pub award_month: Option<u32>,

    /// Awarded on a Sunday
    #[serde(default)]
    pub is_sunday: bool,

    /// Awarded in December
    #[serde(default)]
    pub is_december: bool,
}

impl ContractRecord {
    /// Create a record with the required fields and default timing flags
    pub fn new(name: impl Into<String>, estimated_price: f64, final_price: f64, bidders: u32) -> Self {
        Self {
            name: name.into(),
            department: None,
            estimated_price: Some(estimated_price),
            final_price,
            bidders,
            award_month: None,
            is_sunday: false,
            is_december: false,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_award_month(mut self, month: u32) -> Self {
        self.award_month = Some(month);
        self
    }

    pub fn with_timing(mut self, is_sunday: bool, is_december: bool) -> Self {
        self.is_sunday = is_sunday;
        self.is_december = is_december;
        self
    }

    /// Award month, falling back to mid-year when absent
    pub fn month(&self) -> u32 {
        match self.award_month {
            Some(month) if month > 0 => month,
            _ => DEFAULT_AWARD_MONTH,
        }
    }

    /// Estimated price only when it is usable as a denominator
    pub fn usable_estimate(&self) -> Option<f64> {
        self.estimated_price.filter(|price| *price > 0.0)
    }

    /// Title length in characters, not bytes
    pub fn title_length(&self) -> usize {
        self.name.chars().count()
    }

    /// Check the field invariants before the record reaches the model
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.name.trim().is_empty() {
            return Err(ScoringError::validation("non-empty contract name", "empty name"));
        }

        if !self.final_price.is_finite() || self.final_price <= 0.0 {
            return Err(ScoringError::validation(
                "final_price > 0",
                format!("final_price = {}", self.final_price),
            ));
        }

        if let Some(estimate) = self.estimated_price {
            if !estimate.is_finite() || estimate <= 0.0 {
                return Err(ScoringError::validation(
                    "estimated_price > 0",
                    format!("estimated_price = {}", estimate),
                ));
            }
        }

        if self.bidders < 1 {
            return Err(ScoringError::validation(
                "bidders >= 1",
                format!("bidders = {}", self.bidders),
            ));
        }

        if let Some(month) = self.award_month {
            if !(1..=12).contains(&month) {
                return Err(ScoringError::validation(
                    "award_month in 1..=12",
                    format!("award_month = {}", month),
                ));
            }
        }

        Ok(())
    }
}
