//! Model capability and ONNX-backed regression inference

use crate::error::ScoringError;
use crate::types::features::{FeatureSchema, FeatureVector};
use crate::types::verdict::SignalKind;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque scoring function with a declared input schema.
///
/// Implementations must be safe to call from many scoring tasks at once.
pub trait RiskModel: Send + Sync {
    /// Model identifier for logs and model info
    fn name(&self) -> &str;

    /// Whether the model loaded and can be invoked
    fn is_available(&self) -> bool {
        true
    }

    /// Ordered feature columns the model expects
    fn feature_schema(&self) -> Option<&FeatureSchema>;

    /// Continuous corruption risk index for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError>;
}

/// ONNX Runtime regressor producing a single scalar per row
pub struct OnnxRiskModel {
    name: String,
    /// ONNX sessions need exclusive access while running
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    schema: FeatureSchema,
}

impl OnnxRiskModel {
    pub(crate) fn new(
        name: String,
        session: Session,
        input_name: String,
        output_name: String,
        schema: FeatureSchema,
    ) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            schema,
        }
    }

    fn run(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let inference_error = |e: ort::Error| ScoringError::Inference(format!("{}: {}", self.name, e));

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_f32())).map_err(inference_error)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(inference_error)?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ScoringError::Inference(format!(
                "{}: output '{}' missing from session outputs",
                self.name, self.output_name
            ))
        })?;
        let (_, data) = output.try_extract_tensor::<f32>().map_err(inference_error)?;

        data.first().copied().map(f64::from).ok_or_else(|| {
            ScoringError::Inference(format!("{}: empty output tensor", self.name))
        })
    }
}

impl RiskModel for OnnxRiskModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_schema(&self) -> Option<&FeatureSchema> {
        Some(&self.schema)
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        if features.len() != self.schema.len() {
            return Err(ScoringError::validation(
                format!("{} features", self.schema.len()),
                format!("{} features", features.len()),
            ));
        }

        let score = self.run(features)?;

        if !score.is_finite() {
            return Err(ScoringError::Inference(format!(
                "{} produced a non-finite score",
                self.name
            )));
        }

        debug!(model = %self.name, score = score, "ONNX regression complete");
        Ok(score)
    }
}

/// Placeholder installed when the model could not be loaded at start-up
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl RiskModel for UnavailableModel {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn feature_schema(&self) -> Option<&FeatureSchema> {
        None
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64, ScoringError> {
        Err(ScoringError::ServiceUnavailable(self.reason.clone()))
    }
}

/// Description of the loaded model for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub model_name: Option<String>,
    pub feature_count: usize,
    pub features: Vec<String>,
    pub fraud_signals_detected: Vec<String>,
}

impl ModelInfo {
    pub fn describe(model: &dyn RiskModel) -> Self {
        let loaded = model.is_available();
        let features = model
            .feature_schema()
            .map(|schema| schema.columns().to_vec())
            .unwrap_or_default();

        Self {
            model_loaded: loaded,
            model_name: loaded.then(|| model.name().to_string()),
            feature_count: features.len(),
            features,
            fraud_signals_detected: SignalKind::ALL
                .iter()
                .map(|kind| kind.label().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unavailable_model_fails_with_service_unavailable() {
        let model = UnavailableModel::new("model file missing");
        let schema = FeatureSchema::new(["month"]).unwrap();
        let features = FeatureVector::new(schema, vec![6.0]);

        assert!(!model.is_available());
        let err = model.predict(&features).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_string().contains("model file missing"));
    }

    #[test]
    fn test_model_info_for_unavailable_model() {
        let info = ModelInfo::describe(&UnavailableModel::new("boom"));

        assert!(!info.model_loaded);
        assert_eq!(info.model_name, None);
        assert_eq!(info.feature_count, 0);
        assert_eq!(info.fraud_signals_detected.len(), 6);
        assert_eq!(info.fraud_signals_detected[0], "Round Number Trap");
    }
}
