//! Risk model handle, single-contract scoring and batch aggregation

pub mod aggregator;
pub mod inference;
pub mod loader;
pub mod scorer;

pub use aggregator::BatchAggregator;
pub use inference::{ModelInfo, OnnxRiskModel, RiskModel, UnavailableModel};
pub use loader::ModelLoader;
pub use scorer::RiskScorer;
