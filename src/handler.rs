//! Request dispatch for the worker loop.
//!
//! Turns a raw message payload into either a reply document or an
//! [`ErrorResponse`], recording metrics and audit entries on the way.

use crate::audit::{AuditEntry, AuditLog};
use crate::consumer::RequestKind;
use crate::error::{ErrorKind, ErrorResponse, ScoringError};
use crate::ingest::{self, IngestError, IngestOutcome, IngestRequest};
use crate::metrics::PipelineMetrics;
use crate::models::aggregator::BatchAggregator;
use crate::types::contract::ContractRecord;
use crate::types::verdict::{BatchReport, PredictionResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Actor recorded in audit entries written by the worker
pub const WORKER_ACTOR: &str = "scoring-worker";

/// Payload of a batch scoring request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub contracts: Vec<ContractRecord>,
}

/// Successful reply to a request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Verdict(PredictionResult),
    Batch(BatchReport),
    Ingest(IngestOutcome),
}

impl From<&IngestError> for ErrorResponse {
    fn from(err: &IngestError) -> Self {
        Self {
            kind: ErrorKind::InputValidation,
            status: err.status_code(),
            retryable: false,
            message: err.to_string(),
        }
    }
}

/// Shared, read-only state behind every worker task
pub struct RequestHandler {
    aggregator: BatchAggregator,
    audit: AuditLog,
    metrics: Arc<PipelineMetrics>,
}

impl RequestHandler {
    pub fn new(aggregator: BatchAggregator, audit: AuditLog, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            aggregator,
            audit,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Handle a request on tokio's blocking pool.
    ///
    /// Model runs and audit appends block, so async workers call this instead of [`Self::handle`].
    pub async fn handle_blocking<P>(
        self: Arc<Self>,
        kind: RequestKind,
        payload: P,
        request_id: String,
    ) -> Result<Reply, ErrorResponse>
    where
        P: AsRef<[u8]> + Send + 'static,
    {
        let task_request_id = request_id.clone();
        tokio::task::spawn_blocking(move || self.handle(kind, payload.as_ref(), &task_request_id))
            .await
            .unwrap_or_else(|e| {
                error!(request_id = %request_id, error = %e, "Request task aborted");
                Err(ErrorResponse::from(&ScoringError::Inference(format!(
                    "request task aborted: {}",
                    e
                ))))
            })
    }

    /// Handle one request payload
    pub fn handle(
        &self,
        kind: RequestKind,
        payload: &[u8],
        request_id: &str,
    ) -> Result<Reply, ErrorResponse> {
        let start = Instant::now();

        let outcome = match kind {
            RequestKind::Contract => self.handle_contract(payload, request_id),
            RequestKind::Batch => self.handle_batch(payload, request_id),
            RequestKind::Ingest => self.handle_ingest(payload),
        };

        self.metrics.record_latency(start.elapsed());
        if let Err(response) = &outcome {
            self.metrics.record_failure(response.kind);
            warn!(
                request_id = %request_id,
                kind = response.kind.as_str(),
                status = response.status,
                retryable = response.retryable,
                error = %response.message,
                "Request failed"
            );
        }
        outcome
    }

    fn handle_contract(&self, payload: &[u8], request_id: &str) -> Result<Reply, ErrorResponse> {
        let contract: ContractRecord = parse_payload(payload, "contract record JSON")?;
        let prediction = self
            .aggregator
            .scorer()
            .score(&contract)
            .map_err(|e| ErrorResponse::from(&e))?;

        self.metrics.record_prediction(&prediction);
        self.audit.record(
            &AuditEntry::new("score_contract", WORKER_ACTOR, contract.name.as_str())
                .with_meta("request_id", request_id)
                .with_meta("predicted_cri", prediction.predicted_cri)
                .with_meta("risk_level", prediction.risk_level.as_str()),
        );

        debug!(
            request_id = %request_id,
            contract = %prediction.contract_name,
            cri = prediction.predicted_cri,
            "Contract verdict ready"
        );
        Ok(Reply::Verdict(prediction))
    }

    fn handle_batch(&self, payload: &[u8], request_id: &str) -> Result<Reply, ErrorResponse> {
        let request: BatchRequest = parse_payload(payload, "{\"contracts\": [...]} JSON")?;
        let report = self
            .aggregator
            .aggregate(&request.contracts)
            .map_err(|e| ErrorResponse::from(&e))?;

        self.metrics.record_batch(&report.predictions);
        self.audit.record(
            &AuditEntry::new("score_batch", WORKER_ACTOR, format!("batch:{}", request_id))
                .with_meta("request_id", request_id)
                .with_meta("total_contracts", report.summary.total_contracts)
                .with_meta("average_cri", report.summary.average_cri)
                .with_meta("critical", report.summary.risk_distribution.critical),
        );

        Ok(Reply::Batch(report))
    }

    fn handle_ingest(&self, payload: &[u8]) -> Result<Reply, ErrorResponse> {
        let request: IngestRequest = parse_payload(payload, "ingest request JSON")?;
        let outcome =
            ingest::ingest(&request, &self.audit).map_err(|e| ErrorResponse::from(&e))?;

        info!(
            uploader = %outcome.uploaded_by,
            rows = outcome.rows_received,
            "Dataset ingested"
        );
        Ok(Reply::Ingest(outcome))
    }
}

fn parse_payload<T: DeserializeOwned>(payload: &[u8], expected: &str) -> Result<T, ErrorResponse> {
    serde_json::from_slice(payload)
        .map_err(|e| ErrorResponse::from(&ScoringError::validation(expected, e.to_string())))
}
