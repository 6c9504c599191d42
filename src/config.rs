//! Configuration management for the procurement risk pipeline

use crate::feature_extractor::DEFAULT_ENCODED_PRIOR;
use crate::types::verdict::RiskLevelThresholds;
use anyhow::{bail, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for single-contract scoring requests
    pub contract_subject: String,
    /// Subject for batch scoring requests
    pub batch_subject: String,
    /// Subject for published verdicts
    pub verdict_subject: String,
    /// Subject for published failures
    pub error_subject: String,
    /// Subject for dataset uploads
    #[serde(default = "default_ingest_subject")]
    pub ingest_subject: String,
}

fn default_ingest_subject() -> String {
    "procurement.ingest".to_string()
}

/// Regression model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// ONNX regressor producing the corruption risk index
    pub model_path: String,
    /// JSON array with the ordered training feature columns
    pub feature_columns_path: String,
    /// Name reported in logs and model info
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Value used for every `*_encoded` feature at inference time
    #[serde(default = "default_encoded_prior")]
    pub encoded_prior: f64,
}

fn default_model_name() -> String {
    "xgboost_cri".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_encoded_prior() -> f64 {
    DEFAULT_ENCODED_PRIOR
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "models/cri_regressor.onnx".to_string(),
            feature_columns_path: "models/feature_columns.json".to_string(),
            model_name: default_model_name(),
            onnx_threads: default_onnx_threads(),
            encoded_prior: default_encoded_prior(),
        }
    }
}

/// Verdict configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    /// Lower bounds of the risk tiers
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests scored concurrently
    pub workers: usize,
}

/// Audit trail configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Write audit entries at all
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// JSON-lines file receiving audit entries
    #[serde(default = "default_audit_path")]
    pub path: String,
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_path() -> String {
    "data/chainlog.jsonl".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: default_audit_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scorer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.scoring.risk_levels.is_ascending() {
            bail!(
                "Risk level thresholds must be ascending: moderate={} high={} critical={}",
                self.scoring.risk_levels.moderate,
                self.scoring.risk_levels.high,
                self.scoring.risk_levels.critical
            );
        }
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        if !self.model.encoded_prior.is_finite() {
            bail!("model.encoded_prior must be a finite number");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                contract_subject: "procurement.contracts".to_string(),
                batch_subject: "procurement.contracts.batch".to_string(),
                verdict_subject: "procurement.verdicts".to_string(),
                error_subject: "procurement.errors".to_string(),
                ingest_subject: default_ingest_subject(),
            },
            model: ModelConfig::default(),
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            audit: AuditConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
