//! ONNX model loader

use crate::config::ModelConfig;
use crate::models::inference::{OnnxRiskModel, RiskModel, UnavailableModel};
use crate::types::features::FeatureSchema;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Loader for the corruption-risk regression model
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the model and its feature schema into a shared, read-only handle.
    ///
    /// Never fails: any load error yields an [`UnavailableModel`] so the process
    /// still starts and scoring requests report the model as unavailable.
    pub fn load(config: &ModelConfig) -> Arc<dyn RiskModel> {
        let loaded = FeatureSchema::load(&config.feature_columns_path).and_then(|schema| {
            let loader = Self::with_threads(config.onnx_threads)?;
            loader.load_model(&config.model_path, &config.model_name, schema)
        });

        match loaded {
            Ok(model) => Arc::new(model),
            Err(e) => {
                error!(
                    model_path = %config.model_path,
                    error = format!("{:#}", e),
                    "Failed to load fraud detection model"
                );
                Arc::new(UnavailableModel::new(format!("{:#}", e)))
            }
        }
    }

    /// Load a single ONNX regressor from file
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        schema: FeatureSchema,
    ) -> Result<OnnxRiskModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Regressors export a single "variable" output; prefer it when present
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            features = schema.len(),
            "Model loaded successfully"
        );

        Ok(OnnxRiskModel::new(
            name.to_string(),
            session,
            input_name,
            output_name,
            schema,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_yield_unavailable_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            model_path: dir.path().join("missing.onnx").display().to_string(),
            feature_columns_path: dir.path().join("missing.json").display().to_string(),
            ..ModelConfig::default()
        };

        let model = ModelLoader::load(&config);
        assert!(!model.is_available());
        assert!(model.feature_schema().is_none());
    }
}
