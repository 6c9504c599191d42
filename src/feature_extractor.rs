//! Feature extraction for corruption-risk model inference.
//!
//! This module maps contracts onto the feature columns the regression model
//! was trained with. Target-encoded categorical columns cannot be looked up at
//! inference time and receive a single historical prior instead.

use crate::signals::is_round_thousand;
use crate::types::contract::ContractRecord;
use crate::types::features::{FeatureSchema, FeatureVector};
use crate::types::verdict::{round_dp, FeatureBreakdown};

/// Historical mean target encoding used for every `*_encoded` column
pub const DEFAULT_ENCODED_PRIOR: f64 = 0.445;

/// Marker for target-encoded columns
const ENCODED_MARKER: &str = "_encoded";

/// Quantities derived from a contract before schema alignment
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub final_price: f64,
    pub estimated_price: Option<f64>,
    pub bidders: u32,
    pub is_round_1000: bool,
    pub single_bidder: bool,
    pub title_length: usize,
    pub is_medium_title: bool,
    pub price_efficiency: f64,
    pub month: u32,
    pub is_sunday: bool,
    pub is_december: bool,
}

impl DerivedFeatures {
    pub fn from_contract(contract: &ContractRecord) -> Self {
        let title_length = contract.title_length();

        Self {
            final_price: contract.final_price,
            estimated_price: contract.estimated_price,
            bidders: contract.bidders,
            is_round_1000: is_round_thousand(contract.final_price),
            single_bidder: contract.bidders == 1,
            title_length,
            is_medium_title: (100..=200).contains(&title_length),
            price_efficiency: contract
                .usable_estimate()
                .map(|estimate| contract.final_price / estimate)
                .unwrap_or(1.0),
            month: contract.month(),
            is_sunday: contract.is_sunday,
            is_december: contract.is_december,
        }
    }

    /// Value for a named model column, if derived from the contract
    pub fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "tender_finalprice" => self.final_price,
            // Missing estimate is a null in the training frame, filled with 0
            "tender_estimatedprice" => self.estimated_price.unwrap_or(0.0),
            "tender_recordedbidscount" => self.bidders as f64,
            "is_round_1000" => flag(self.is_round_1000),
            "single_bidder_proxy" => flag(self.single_bidder),
            "title_length" => self.title_length as f64,
            "is_medium_title" => flag(self.is_medium_title),
            "price_efficiency" => self.price_efficiency,
            // Unobservable for contracts not yet in the history
            "winner_dominance" => 0.0,
            "month" => self.month as f64,
            "is_sunday" => flag(self.is_sunday),
            "is_december" => flag(self.is_december),
            _ => return None,
        };
        Some(value)
    }

    /// Diagnostic subset reported alongside the verdict
    pub fn breakdown(&self) -> FeatureBreakdown {
        let cost_overrun_percent = if self.price_efficiency > 1.0 {
            round_dp((self.price_efficiency - 1.0) * 100.0, 2)
        } else {
            0.0
        };

        FeatureBreakdown {
            price_efficiency: round_dp(self.price_efficiency, 3),
            is_round_number: self.is_round_1000,
            single_bidder: self.single_bidder,
            title_length: self.title_length,
            award_month: self.month,
            cost_overrun_percent,
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Feature extractor that transforms contracts into model input features.
///
/// Output always has exactly the schema's columns, in schema order.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    encoded_prior: f64,
}

impl FeatureExtractor {
    /// Create a new feature extractor with the default encoding prior.
    pub fn new() -> Self {
        Self::with_encoded_prior(DEFAULT_ENCODED_PRIOR)
    }

    pub fn with_encoded_prior(encoded_prior: f64) -> Self {
        Self { encoded_prior }
    }

    /// Extract features from a contract.
    pub fn extract(&self, contract: &ContractRecord, schema: &FeatureSchema) -> FeatureVector {
        self.align(&DerivedFeatures::from_contract(contract), schema)
    }

    /// Align already-derived quantities with the schema
    pub fn align(&self, derived: &DerivedFeatures, schema: &FeatureSchema) -> FeatureVector {
        let values = schema
            .columns()
            .iter()
            .map(|column| {
                derived.value(column).unwrap_or_else(|| {
                    if column.contains(ENCODED_MARKER) {
                        self.encoded_prior
                    } else {
                        0.0
                    }
                })
            })
            .collect();

        FeatureVector::new(schema.clone(), values)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new([
            "buyer_name_encoded",
            "price_efficiency",
            "tender_finalprice",
            "lot_bidscount",
            "is_round_1000",
            "month",
            "single_bidder_proxy",
            "tender_estimatedprice",
            "winner_dominance",
            "is_medium_title",
        ])
        .unwrap()
    }

    #[test]
    fn test_feature_extraction_follows_schema() {
        let extractor = FeatureExtractor::new();
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);
        let schema = schema();

        let features = extractor.extract(&contract, &schema);

        assert_eq!(features.len(), schema.len());
        assert_eq!(features.names(), schema.columns());
        assert_eq!(features.get("buyer_name_encoded"), Some(DEFAULT_ENCODED_PRIOR));
        assert_eq!(features.get("tender_finalprice"), Some(100_000.0));
        assert_eq!(features.get("lot_bidscount"), Some(0.0));
        assert_eq!(features.get("is_round_1000"), Some(1.0));
        assert_eq!(features.get("month"), Some(6.0));
        assert_eq!(features.get("single_bidder_proxy"), Some(1.0));
        assert_eq!(features.get("winner_dominance"), Some(0.0));
        assert_eq!(features.get("is_medium_title"), Some(0.0));
        let efficiency = features.get("price_efficiency").unwrap();
        assert!((efficiency - 100_000.0 / 90_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_estimate_defaults() {
        let extractor = FeatureExtractor::new();
        let mut contract = ContractRecord::new("Consulting", 1.0, 4_200.0, 2);
        contract.estimated_price = None;

        let features = extractor.extract(&contract, &schema());
        assert_eq!(features.get("price_efficiency"), Some(1.0));
        assert_eq!(features.get("tender_estimatedprice"), Some(0.0));
    }

    #[test]
    fn test_configured_prior() {
        let extractor = FeatureExtractor::with_encoded_prior(0.3);
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);
        let features = extractor.extract(&contract, &schema());
        assert_eq!(features.get("buyer_name_encoded"), Some(0.3));
    }

    #[test]
    fn test_medium_title_band() {
        let short = DerivedFeatures::from_contract(&ContractRecord::new("a".repeat(99), 1.0, 1.0, 2));
        let lower = DerivedFeatures::from_contract(&ContractRecord::new("a".repeat(100), 1.0, 1.0, 2));
        let upper = DerivedFeatures::from_contract(&ContractRecord::new("a".repeat(200), 1.0, 1.0, 2));
        let long = DerivedFeatures::from_contract(&ContractRecord::new("a".repeat(201), 1.0, 1.0, 2));

        assert!(!short.is_medium_title);
        assert!(lower.is_medium_title);
        assert!(upper.is_medium_title);
        assert!(!long.is_medium_title);
    }

    #[test]
    fn test_breakdown() {
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1).with_award_month(12);
        let breakdown = DerivedFeatures::from_contract(&contract).breakdown();

        assert_eq!(breakdown.price_efficiency, 1.111);
        assert_eq!(breakdown.cost_overrun_percent, 11.11);
        assert!(breakdown.is_round_number);
        assert!(breakdown.single_bidder);
        assert_eq!(breakdown.title_length, 10);
        assert_eq!(breakdown.award_month, 12);

        let under = ContractRecord::new("Consulting", 100_000.0, 90_000.5, 3);
        let breakdown = DerivedFeatures::from_contract(&under).breakdown();
        assert_eq!(breakdown.cost_overrun_percent, 0.0);
        assert!(!breakdown.is_round_number);
    }

    #[test]
    fn test_feature_count_matches_any_schema() {
        let extractor = FeatureExtractor::new();
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);

        for width in 1..20 {
            let schema = FeatureSchema::new((0..width).map(|i| format!("col_{i}"))).unwrap();
            let features = extractor.extract(&contract, &schema);
            assert_eq!(features.len(), width);
            assert!(features.values().iter().all(|&v| v == 0.0));
        }
    }
}
