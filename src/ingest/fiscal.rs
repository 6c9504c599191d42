//! Fiscal transaction log analysis: spend totals and digit conformity

use crate::benford::DigitConformityAnalyzer;
use crate::ingest::dataset::{Dataset, DatasetKind, IngestError};
use crate::types::verdict::round_dp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of departments reported by spend
pub const TOP_DEPARTMENTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSpend {
    pub department: String,
    pub spend: f64,
}

/// Summary of an ingested fiscal log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalSummary {
    pub total_transactions: usize,
    pub total_spend: f64,
    pub benford_conformity_score: f64,
    /// Highest-spending departments, descending; empty without a department column
    pub top_departments: Vec<DepartmentSpend>,
}

impl FiscalSummary {
    pub fn analyze(dataset: &Dataset) -> Result<Self, IngestError> {
        dataset.require_columns(DatasetKind::Fiscal)?;

        let amounts = dataset.numeric_column("amount");
        let total_spend: f64 = amounts.iter().flatten().sum();
        let benford_conformity_score = DigitConformityAnalyzer::new().score(amounts.iter().copied());

        let top_departments = if dataset.has_column("department") {
            top_departments(&dataset.text_column("department"), &amounts)
        } else {
            Vec::new()
        };

        Ok(Self {
            total_transactions: dataset.len(),
            total_spend: round_dp(total_spend, 2),
            benford_conformity_score,
            top_departments,
        })
    }
}

fn top_departments(departments: &[Option<String>], amounts: &[Option<f64>]) -> Vec<DepartmentSpend> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for (department, amount) in departments.iter().zip(amounts) {
        if let Some(department) = department {
            *totals.entry(department.as_str()).or_insert(0.0) += amount.unwrap_or(0.0);
        }
    }

    let mut ranked: Vec<DepartmentSpend> = totals
        .into_iter()
        .map(|(department, spend)| DepartmentSpend {
            department: department.to_string(),
            spend,
        })
        .collect();

    // Ties broken by name so the ranking is stable
    ranked.sort_by(|a, b| {
        b.spend
            .total_cmp(&a.spend)
            .then_with(|| a.department.cmp(&b.department))
    });
    ranked.truncate(TOP_DEPARTMENTS);
    ranked
}
