//! Single-contract risk scoring.
//!
//! Combines the model's corruption risk index with the rule-based signals
//! into one verdict. Both halves stay independently usable.

use crate::error::ScoringError;
use crate::feature_extractor::{DerivedFeatures, FeatureExtractor};
use crate::models::inference::RiskModel;
use crate::signals::RuleSignalDetector;
use crate::types::contract::ContractRecord;
use crate::types::features::FeatureSchema;
use crate::types::verdict::{round_dp, PredictionResult, RiskLevel, RiskLevelThresholds};
use std::sync::Arc;
use tracing::debug;

/// Scores contracts against a shared, read-only model handle
#[derive(Clone)]
pub struct RiskScorer {
    model: Arc<dyn RiskModel>,
    extractor: FeatureExtractor,
    detector: RuleSignalDetector,
    thresholds: RiskLevelThresholds,
}

impl RiskScorer {
    pub fn new(
        model: Arc<dyn RiskModel>,
        extractor: FeatureExtractor,
        thresholds: RiskLevelThresholds,
    ) -> Self {
        Self {
            model,
            extractor,
            detector: RuleSignalDetector::new(),
            thresholds,
        }
    }

    /// Scorer with the default prior and tier thresholds
    pub fn with_defaults(model: Arc<dyn RiskModel>) -> Self {
        Self::new(model, FeatureExtractor::new(), RiskLevelThresholds::default())
    }

    pub fn model(&self) -> &Arc<dyn RiskModel> {
        &self.model
    }

    pub fn thresholds(&self) -> &RiskLevelThresholds {
        &self.thresholds
    }

    /// Fail fast when the model never loaded
    pub fn ensure_available(&self) -> Result<&FeatureSchema, ScoringError> {
        if !self.model.is_available() {
            return Err(ScoringError::ServiceUnavailable(
                "Fraud detection model not loaded. Please check server logs.".to_string(),
            ));
        }

        self.model.feature_schema().ok_or_else(|| {
            ScoringError::ServiceUnavailable(format!(
                "model {} has no feature schema",
                self.model.name()
            ))
        })
    }

    /// Produce the verdict for one contract
    pub fn score(&self, contract: &ContractRecord) -> Result<PredictionResult, ScoringError> {
        let schema = self.ensure_available()?;
        contract.validate()?;
        self.score_validated(contract, schema)
    }

    /// Score a contract that already passed validation
    pub(crate) fn score_validated(
        &self,
        contract: &ContractRecord,
        schema: &FeatureSchema,
    ) -> Result<PredictionResult, ScoringError> {
        let derived = DerivedFeatures::from_contract(contract);
        let features = self.extractor.align(&derived, schema);

        let raw = self.model.predict(&features)?;
        if !raw.is_finite() {
            return Err(ScoringError::Inference(format!(
                "{} returned a non-finite score",
                self.model.name()
            )));
        }

        let cri = round_dp(raw, 4);
        let risk_level = RiskLevel::from_cri(cri, &self.thresholds);
        let fraud_signals = self.detector.detect(contract);

        debug!(
            contract = %contract.name,
            cri = cri,
            risk_level = ?risk_level,
            signals = fraud_signals.len(),
            "Contract scored"
        );

        Ok(PredictionResult {
            contract_name: contract.name.clone(),
            predicted_cri: cri,
            risk_level,
            recommendation: risk_level.recommendation().to_string(),
            fraud_signals,
            feature_breakdown: derived.breakdown(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::inference::UnavailableModel;
    use crate::types::features::FeatureVector;
    use crate::types::verdict::SignalKind;

    /// Linear stand-in for the trained regressor
    pub(crate) struct StubModel {
        schema: FeatureSchema,
    }

    impl StubModel {
        pub(crate) fn new() -> Self {
            Self {
                schema: FeatureSchema::new([
                    "single_bidder_proxy",
                    "is_round_1000",
                    "price_efficiency",
                    "buyer_name_encoded",
                    "lot_bidscount",
                ])
                .unwrap(),
            }
        }
    }

    impl RiskModel for StubModel {
        fn name(&self) -> &str {
            "stub"
        }

        fn feature_schema(&self) -> Option<&FeatureSchema> {
            Some(&self.schema)
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
            let single = features.get("single_bidder_proxy").unwrap_or(0.0);
            let round = features.get("is_round_1000").unwrap_or(0.0);
            let efficiency = features.get("price_efficiency").unwrap_or(1.0);
            let prior = features.get("buyer_name_encoded").unwrap_or(0.0);
            Ok(0.1 + 0.35 * single + 0.15 * round + 0.2 * (efficiency - 1.0) + 0.1 * prior)
        }
    }

    fn scorer() -> RiskScorer {
        RiskScorer::with_defaults(Arc::new(StubModel::new()))
    }

    #[test]
    fn test_score_merges_model_and_rules() {
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);
        let result = scorer().score(&contract).unwrap();

        // 0.1 + 0.35 + 0.15 + 0.2 * 0.1111 + 0.0445
        assert_eq!(result.predicted_cri, 0.6667);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.recommendation, "Detailed audit recommended");
        assert_eq!(result.fraud_signals.len(), 4);
        assert_eq!(result.fraud_signals[0].signal, SignalKind::RoundNumber);
        assert_eq!(result.feature_breakdown.cost_overrun_percent, 11.11);
        assert_eq!(result.contract_name, "Consulting");
    }

    #[test]
    fn test_score_is_idempotent() {
        let scorer = scorer();
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1).with_timing(true, false);

        assert_eq!(scorer.score(&contract).unwrap(), scorer.score(&contract).unwrap());
    }

    #[test]
    fn test_unavailable_model() {
        let scorer = RiskScorer::with_defaults(Arc::new(UnavailableModel::new("missing")));
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);

        let err = scorer.score(&contract).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_invalid_contract_rejected() {
        let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 0);
        let err = scorer().score(&contract).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputValidation);
    }

    #[test]
    fn test_low_risk_contract() {
        let contract = ContractRecord::new(
            "Supply of laboratory reagents for the county public health directorate",
            50_000.0,
            48_250.5,
            5,
        );
        let result = scorer().score(&contract).unwrap();

        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.fraud_signals.is_empty());
        assert_eq!(result.recommendation, "Standard oversight sufficient");
    }
}
