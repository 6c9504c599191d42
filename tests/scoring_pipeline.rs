//! End-to-end scoring against the deployed feature schema with stand-in models

use procurement_risk_pipeline::error::{ErrorKind, ScoringError};
use procurement_risk_pipeline::models::{BatchAggregator, ModelInfo, RiskModel, RiskScorer, UnavailableModel};
use procurement_risk_pipeline::types::{
    ContractRecord, FeatureSchema, FeatureVector, RiskLevel, RiskLevelThresholds, Severity, SignalKind,
};
use procurement_risk_pipeline::FeatureExtractor;
use std::sync::Arc;

fn deployed_schema() -> FeatureSchema {
    FeatureSchema::load(concat!(env!("CARGO_MANIFEST_DIR"), "/models/feature_columns.json")).unwrap()
}

/// Returns the same CRI for every contract
struct FixedModel {
    schema: FeatureSchema,
    cri: f64,
}

impl RiskModel for FixedModel {
    fn name(&self) -> &str {
        "fixed"
    }

    fn feature_schema(&self) -> Option<&FeatureSchema> {
        Some(&self.schema)
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        assert_eq!(features.len(), self.schema.len());
        Ok(self.cri)
    }
}

/// Risk rises with overrun and missing competition
struct LinearModel {
    schema: FeatureSchema,
}

impl RiskModel for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn feature_schema(&self) -> Option<&FeatureSchema> {
        Some(&self.schema)
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let efficiency = features.get("price_efficiency").unwrap_or(1.0);
        let single = features.get("single_bidder_proxy").unwrap_or(0.0);
        let december = features.get("is_december").unwrap_or(0.0);
        Ok(0.05 + 0.4 * single + 0.5 * (efficiency - 1.0).max(0.0) + 0.1 * december)
    }
}

fn fixed_scorer(cri: f64) -> RiskScorer {
    RiskScorer::with_defaults(Arc::new(FixedModel {
        schema: deployed_schema(),
        cri,
    }))
}

fn linear_scorer() -> RiskScorer {
    RiskScorer::with_defaults(Arc::new(LinearModel {
        schema: deployed_schema(),
    }))
}

fn clean_contract() -> ContractRecord {
    ContractRecord::new(
        "Rehabilitation of the water supply network in the eastern district",
        250_000.0,
        243_517.25,
        6,
    )
    .with_award_month(4)
}

#[test]
fn tier_boundaries_are_closed_below() {
    let cases = [
        (0.7, RiskLevel::Critical),
        (0.6999, RiskLevel::High),
        (0.5, RiskLevel::High),
        (0.4999, RiskLevel::Moderate),
        (0.3, RiskLevel::Moderate),
        (0.2999, RiskLevel::Low),
    ];

    for (cri, expected) in cases {
        let result = fixed_scorer(cri).score(&clean_contract()).unwrap();
        assert_eq!(result.risk_level, expected, "cri {}", cri);
        assert_eq!(result.recommendation, expected.recommendation());
    }
}

#[test]
fn cri_is_rounded_before_tiering() {
    let result = fixed_scorer(0.69996).score(&clean_contract()).unwrap();
    assert_eq!(result.predicted_cri, 0.7);
    assert_eq!(result.risk_level, RiskLevel::Critical);
}

#[test]
fn deployed_schema_alignment() {
    let schema = deployed_schema();
    let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1).with_timing(true, true);
    let features = FeatureExtractor::new().extract(&contract, &schema);

    assert_eq!(features.names(), schema.columns());
    assert_eq!(features.get("buyer_name_encoded"), Some(0.445));
    assert_eq!(features.get("tender_maincpv_encoded"), Some(0.445));
    assert_eq!(features.get("lot_bidscount"), Some(0.0));
    assert_eq!(features.get("winner_dominance"), Some(0.0));
    assert_eq!(features.get("month"), Some(6.0));
    assert_eq!(features.get("is_sunday"), Some(1.0));
    assert_eq!(features.get("title_length"), Some(10.0));
}

#[test]
fn configured_prior_reaches_the_model() {
    let schema = deployed_schema();
    let features = FeatureExtractor::with_encoded_prior(0.3).extract(&clean_contract(), &schema);
    assert_eq!(features.get("buyer_name_encoded"), Some(0.3));
}

#[test]
fn verdict_merges_rule_signals_unchanged() {
    let contract = ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1);
    let result = linear_scorer().score(&contract).unwrap();

    let kinds: Vec<SignalKind> = result.fraud_signals.iter().map(|s| s.signal).collect();
    assert_eq!(
        kinds,
        vec![
            SignalKind::RoundNumber,
            SignalKind::SingleBidder,
            SignalKind::VagueTitle,
            SignalKind::CostOverrun
        ]
    );
    assert_eq!(result.fraud_signals[3].severity, Severity::Medium);
    assert_eq!(result.feature_breakdown.price_efficiency, 1.111);
    assert_eq!(result.feature_breakdown.award_month, 6);
}

#[test]
fn single_bidder_only_yields_one_high_signal() {
    let mut contract = clean_contract();
    contract.bidders = 1;

    let result = linear_scorer().score(&contract).unwrap();
    assert_eq!(result.fraud_signals.len(), 1);
    assert_eq!(result.fraud_signals[0].signal, SignalKind::SingleBidder);
    assert_eq!(result.fraud_signals[0].severity, Severity::High);
}

#[test]
fn scoring_is_bit_identical_across_calls() {
    let scorer = linear_scorer();
    let contract = ContractRecord::new("Road works", 1_000.0, 1_337.5, 2).with_timing(false, true);

    let first = scorer.score(&contract).unwrap();
    let second = scorer.score(&contract).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.predicted_cri.to_bits(), second.predicted_cri.to_bits());
}

#[test]
fn missing_estimate_means_neutral_efficiency() {
    let mut contract = clean_contract();
    contract.estimated_price = None;

    let result = linear_scorer().score(&contract).unwrap();
    assert_eq!(result.feature_breakdown.price_efficiency, 1.0);
    assert_eq!(result.feature_breakdown.cost_overrun_percent, 0.0);
    assert!(result
        .fraud_signals
        .iter()
        .all(|s| s.signal != SignalKind::CostOverrun));
}

#[test]
fn batch_summary_invariants() {
    let aggregator = BatchAggregator::new(linear_scorer());
    let contracts = vec![
        clean_contract(),
        ContractRecord::new("Consulting", 90_000.0, 100_000.0, 1),
        ContractRecord::new("IT", 10_000.0, 18_000.0, 1).with_timing(false, true),
        ContractRecord::new("Office furniture for the district planning office", 5_000.0, 5_200.0, 2),
        ContractRecord::new("Fuel", 10_000.0, 11_000.0, 3),
    ];

    let report = aggregator.aggregate(&contracts).unwrap();
    let summary = &report.summary;

    assert_eq!(summary.total_contracts, contracts.len());
    assert_eq!(summary.risk_distribution.total(), contracts.len());
    assert!(summary.min_cri <= summary.average_cri && summary.average_cri <= summary.max_cri);

    let names: Vec<&str> = report.predictions.iter().map(|p| p.contract_name.as_str()).collect();
    assert_eq!(names, vec![contracts[0].name.as_str(), "Consulting", "IT", contracts[3].name.as_str(), "Fuel"]);
    assert_eq!(report.predictions[2].risk_level, RiskLevel::Critical);
}

#[test]
fn unavailable_model_fails_every_request() {
    let scorer = RiskScorer::new(
        Arc::new(UnavailableModel::new("models/cri_regressor.onnx: not found")),
        FeatureExtractor::new(),
        RiskLevelThresholds::default(),
    );

    let err = scorer.score(&clean_contract()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

    let err = BatchAggregator::new(scorer.clone())
        .aggregate(&[clean_contract(), clean_contract()])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(err.status_code(), 503);

    let info = ModelInfo::describe(scorer.model().as_ref());
    assert!(!info.model_loaded);
    assert_eq!(info.fraud_signals_detected.len(), 6);
}
