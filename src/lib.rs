//! Procurement Risk Pipeline Library
//!
//! Scores public-procurement contracts for corruption risk by combining an
//! ONNX regressor's corruption risk index with rule-based fraud signals,
//! and analyzes uploaded fiscal, welfare and training datasets.

pub mod audit;
pub mod benford;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod handler;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod signals;
pub mod types;

pub use audit::{AuditEntry, AuditLog};
pub use benford::DigitConformityAnalyzer;
pub use config::AppConfig;
pub use consumer::{RequestConsumer, RequestKind, SubjectRouter};
pub use error::{ErrorKind, ErrorResponse, ScoringError};
pub use feature_extractor::FeatureExtractor;
pub use handler::{Reply, RequestHandler};
pub use models::{BatchAggregator, ModelInfo, ModelLoader, RiskModel, RiskScorer};
pub use producer::VerdictProducer;
pub use signals::RuleSignalDetector;
pub use types::{BatchReport, ContractRecord, PredictionResult, RiskLevel};
