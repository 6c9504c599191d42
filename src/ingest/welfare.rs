//! Welfare beneficiary gap analysis.
//!
//! A district enrolling more active beneficiaries than its below-poverty-line
//! population is flagged as a potential ghost-beneficiary case.

use crate::ingest::dataset::{Dataset, DatasetKind, IngestError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictGap {
    pub district_name: String,
    pub population_bpl: f64,
    pub active_beneficiaries: f64,
    pub gap: f64,
}

/// Districts whose enrolment exceeds the eligible baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelfareReport {
    pub total_districts_analyzed: usize,
    /// Names of critical districts, in input order
    pub critical_districts: Vec<String>,
    pub total_excess_beneficiaries: i64,
    pub details: Vec<DistrictGap>,
}

impl WelfareReport {
    pub fn analyze(dataset: &Dataset) -> Result<Self, IngestError> {
        dataset.require_columns(DatasetKind::Welfare)?;

        let names = dataset.text_column("district_name");
        let baseline = dataset.numeric_column("population_bpl");
        let active = dataset.numeric_column("active_beneficiaries");

        let details: Vec<DistrictGap> = names
            .into_iter()
            .zip(baseline)
            .zip(active)
            .filter_map(|((name, bpl), active)| {
                let (bpl, active) = (bpl?, active?);
                let gap = active - bpl;
                (gap > 0.0).then(|| DistrictGap {
                    district_name: name.unwrap_or_default(),
                    population_bpl: bpl,
                    active_beneficiaries: active,
                    gap,
                })
            })
            .collect();

        let excess: f64 = details.iter().map(|d| d.gap).sum();

        Ok(Self {
            total_districts_analyzed: dataset.len(),
            critical_districts: details.iter().map(|d| d.district_name.clone()).collect(),
            total_excess_beneficiaries: excess.trunc() as i64,
            details,
        })
    }
}
