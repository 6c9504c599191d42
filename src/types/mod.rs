//! Type definitions for the procurement risk pipeline

pub mod contract;
pub mod features;
pub mod verdict;

pub use contract::ContractRecord;
pub use features::{FeatureSchema, FeatureVector};
pub use verdict::{
    BatchReport, BatchSummary, FeatureBreakdown, FraudSignal, PredictionResult, RiskLevel,
    RiskLevelThresholds, Severity, SignalKind,
};
