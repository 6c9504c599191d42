//! Batch scoring with distributional summaries

use crate::error::ScoringError;
use crate::models::scorer::RiskScorer;
use crate::types::contract::ContractRecord;
use crate::types::verdict::{BatchReport, BatchSummary, PredictionResult};
use tracing::info;

/// Runs the scorer over an ordered batch and summarizes the verdicts.
///
/// A batch either scores completely or fails as a whole.
pub struct BatchAggregator {
    scorer: RiskScorer,
}

impl BatchAggregator {
    pub fn new(scorer: RiskScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Score every contract in order and summarize.
    ///
    /// Empty batches are rejected as invalid input.
    pub fn aggregate(&self, contracts: &[ContractRecord]) -> Result<BatchReport, ScoringError> {
        if contracts.is_empty() {
            return Err(ScoringError::validation(
                "at least one contract",
                "empty batch",
            ));
        }

        let schema = self.scorer.ensure_available()?;

        for (index, contract) in contracts.iter().enumerate() {
            contract.validate().map_err(|e| match e {
                ScoringError::InputValidation { expected, found } => ScoringError::InputValidation {
                    expected,
                    found: format!("{} in contract #{}", found, index),
                },
                other => other,
            })?;
        }

        let predictions = contracts
            .iter()
            .map(|contract| self.scorer.score_validated(contract, schema))
            .collect::<Result<Vec<PredictionResult>, ScoringError>>()?;

        let summary = BatchSummary::from_predictions(&predictions).ok_or_else(|| {
            ScoringError::validation("at least one contract", "empty batch")
        })?;

        info!(
            contracts = summary.total_contracts,
            average_cri = summary.average_cri,
            critical = summary.risk_distribution.critical,
            high = summary.risk_distribution.high,
            "Batch scored"
        );

        Ok(BatchReport {
            summary,
            predictions,
        })
    }
}
