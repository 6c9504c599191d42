//! Dataset ingestion for training, fiscal and welfare uploads

pub mod dataset;
pub mod fiscal;
pub mod training;
pub mod welfare;

pub use dataset::{Dataset, DatasetKind, IngestError};
pub use fiscal::FiscalSummary;
pub use training::TrainingIntake;
pub use welfare::WelfareReport;

use crate::audit::{AuditEntry, AuditLog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// An uploaded file with the identity of whoever uploaded it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub data_type: String,
    pub filename: String,
    pub uploader_name: String,
    pub uploader_department: String,
    /// Raw CSV or JSON text
    pub content: String,
}

/// Result of analyzing one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "lowercase")]
pub enum IngestAnalysis {
    Training(TrainingIntake),
    Fiscal(FiscalSummary),
    Welfare(WelfareReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub uploaded_by: String,
    pub department: String,
    pub uploaded_at: DateTime<Utc>,
    pub rows_received: usize,
    pub analysis: IngestAnalysis,
}

/// Decode, validate and analyze an upload, leaving an audit entry on success
pub fn ingest(request: &IngestRequest, audit: &AuditLog) -> Result<IngestOutcome, IngestError> {
    let uploaded_at = Utc::now();
    let kind: DatasetKind = request.data_type.parse()?;

    info!(
        uploader = %request.uploader_name,
        department = %request.uploader_department,
        data_type = %kind,
        file = %request.filename,
        "Dataset ingestion requested"
    );

    let dataset = Dataset::decode(request.content.as_bytes(), &request.filename)?;

    let analysis = match kind {
        DatasetKind::Training => IngestAnalysis::Training(TrainingIntake::analyze(&dataset)?),
        DatasetKind::Fiscal => IngestAnalysis::Fiscal(FiscalSummary::analyze(&dataset)?),
        DatasetKind::Welfare => IngestAnalysis::Welfare(WelfareReport::analyze(&dataset)?),
    };

    audit.record(
        &AuditEntry::new(
            format!("ingest_{}", kind),
            request.uploader_name.as_str(),
            request.filename.as_str(),
        )
        .with_content(request.content.as_bytes())
        .with_meta("department", request.uploader_department.as_str())
        .with_meta("rows", dataset.len()),
    );

    Ok(IngestOutcome {
        uploaded_by: request.uploader_name.clone(),
        department: request.uploader_department.clone(),
        uploaded_at,
        rows_received: dataset.len(),
        analysis,
    })
}
