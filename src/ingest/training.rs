//! Intake of labelled training data. Retraining itself is not performed here.

use crate::ingest::dataset::{Dataset, DatasetKind, IngestError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingIntake {
    pub rows_received: usize,
    pub columns: Vec<String>,
    /// Rows whose audit outcome is not numeric and would be dropped
    pub invalid_outcomes: usize,
    pub outcome_distribution: BTreeMap<String, usize>,
}

impl TrainingIntake {
    pub fn analyze(dataset: &Dataset) -> Result<Self, IngestError> {
        dataset.require_columns(DatasetKind::Training)?;

        let outcomes = dataset.numeric_column("audit_outcome");
        let invalid_outcomes = outcomes.iter().filter(|o| o.is_none()).count();

        let mut outcome_distribution = BTreeMap::new();
        for outcome in outcomes.iter().flatten() {
            *outcome_distribution.entry(outcome.to_string()).or_insert(0) += 1;
        }

        if invalid_outcomes > 0 {
            warn!(
                invalid = invalid_outcomes,
                "Rows with non-numeric audit_outcome will be dropped during training"
            );
        }

        info!(
            rows = dataset.len(),
            distribution = ?outcome_distribution,
            "Model retraining queued with training intake"
        );

        Ok(Self {
            rows_received: dataset.len(),
            columns: dataset.columns().to_vec(),
            invalid_outcomes,
            outcome_distribution,
        })
    }
}
