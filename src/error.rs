//! Error taxonomy for the scoring core.
//!
//! Degenerate inputs (empty digit series, missing estimate) are not errors:
//! they resolve to fixed fallback values inside the analyzers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-distinguishable failure kind exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputValidation,
    ServiceUnavailable,
    Inference,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputValidation => "input_validation",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Inference => "inference",
        }
    }
}

/// Errors raised while scoring contracts
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// Malformed or missing input, local to one request
    #[error("invalid input: expected {expected}, found {found}")]
    InputValidation { expected: String, found: String },

    /// The scoring model failed to load at process start
    #[error("fraud detection model not loaded: {0}")]
    ServiceUnavailable(String),

    /// The model was loaded but could not produce a score
    #[error("prediction failed: {0}")]
    Inference(String),
}

impl ScoringError {
    pub fn validation(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ScoringError::InputValidation {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::InputValidation { .. } => ErrorKind::InputValidation,
            ScoringError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ScoringError::Inference(_) => ErrorKind::Inference,
        }
    }

    /// HTTP-equivalent status at the service boundary
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InputValidation => 422,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::Inference => 500,
        }
    }

    /// Whether a client may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::ServiceUnavailable)
    }
}

/// Structured failure payload published back to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub status: u16,
    /// The same request may succeed later, e.g. once the model is loaded
    pub retryable: bool,
    pub message: String,
}

impl From<&ScoringError> for ErrorResponse {
    fn from(err: &ScoringError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status_code(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_boundary_status() {
        let invalid = ScoringError::validation("bidders >= 1", "0");
        let unavailable = ScoringError::ServiceUnavailable("missing file".to_string());
        let inference = ScoringError::Inference("bad tensor".to_string());

        assert_eq!(invalid.status_code(), 422);
        assert_eq!(unavailable.status_code(), 503);
        assert_eq!(inference.status_code(), 500);
        assert!(unavailable.is_retryable());
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_error_response_serialization() {
        let err = ScoringError::ServiceUnavailable("no model".to_string());
        let response = ErrorResponse::from(&err);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "service_unavailable");
        assert_eq!(json["status"], 503);
        assert_eq!(json["retryable"], true);
        assert!(json["message"].as_str().unwrap().contains("no model"));
    }

    #[test]
    fn test_validation_message_names_expected_and_found() {
        let err = ScoringError::validation("award_month in 1..=12", "13");
        assert_eq!(
            err.to_string(),
            "invalid input: expected award_month in 1..=12, found 13"
        );
    }
}
