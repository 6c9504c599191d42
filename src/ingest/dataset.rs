//! Decoding of uploaded CSV / JSON datasets into loosely-typed rows

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while decoding or checking an uploaded dataset
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0}. Upload CSV or JSON.")]
    UnsupportedFormat(String),

    #[error("Uploaded file is empty.")]
    Empty,

    #[error("Failed to parse file: {0}")]
    Parse(String),

    #[error("Missing required columns for {dataset}: {missing:?}. Found columns: {found:?}")]
    MissingColumns {
        dataset: &'static str,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Invalid data_type '{0}'. Must be one of: [\"training\", \"fiscal\", \"welfare\"]")]
    InvalidDatasetKind(String),
}

impl IngestError {
    /// HTTP-equivalent status at the service boundary
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::MissingColumns { .. } => 422,
            _ => 400,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Parse(e.to_string())
    }
}

/// Purpose of an uploaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Training,
    Fiscal,
    Welfare,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Training => "training",
            DatasetKind::Fiscal => "fiscal",
            DatasetKind::Welfare => "welfare",
        }
    }

    /// Name used in validation messages
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Training => "training data",
            DatasetKind::Fiscal => "fiscal logs",
            DatasetKind::Welfare => "welfare stats",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Training => &["contract_title", "final_price", "audit_outcome"],
            DatasetKind::Fiscal => &["transaction_id", "amount"],
            DatasetKind::Welfare => &["district_name", "population_bpl", "active_beneficiaries"],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(DatasetKind::Training),
            "fiscal" => Ok(DatasetKind::Fiscal),
            "welfare" => Ok(DatasetKind::Welfare),
            other => Err(IngestError::InvalidDatasetKind(other.to_string())),
        }
    }
}

/// Ordered rows with a known column set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Dataset {
    /// Decode by file extension: `.csv` or `.json`
    pub fn decode(content: &[u8], filename: &str) -> Result<Self, IngestError> {
        if content.is_empty() {
            return Err(IngestError::Empty);
        }

        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Self::from_csv(content)
        } else if lower.ends_with(".json") {
            Self::from_json(content)
        } else {
            Err(IngestError::UnsupportedFormat(filename.to_string()))
        }
    }

    /// Header row names the columns; cells are typed the way a data frame infers them
    pub fn from_csv(content: &[u8]) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();

        for record in reader.records() {
            let record = record?;
            let row: Map<String, Value> = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), infer_cell(cell)))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Array of objects, or an object wrapping one under `data`, `records` or `rows`
    pub fn from_json(content: &[u8]) -> Result<Self, IngestError> {
        let value: Value = serde_json::from_slice(content)?;

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut object) => {
                let wrapped = ["data", "records", "rows"]
                    .iter()
                    .find(|key| matches!(object.get(**key), Some(Value::Array(_))))
                    .copied();
                match wrapped.and_then(|key| object.remove(key)) {
                    Some(Value::Array(items)) => items,
                    _ => vec![Value::Object(object)],
                }
            }
            _ => {
                return Err(IngestError::Parse(
                    "JSON must be an array or object with a data array.".to_string(),
                ))
            }
        };

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(IngestError::Parse(format!(
                        "expected an object per row, found {}",
                        other
                    )))
                }
            }
        }

        Ok(Self::from_rows(rows))
    }

    /// Build from rows; columns are collected in first-seen order
    pub fn from_rows(rows: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Check that every column the dataset kind needs is present
    pub fn require_columns(&self, kind: DatasetKind) -> Result<(), IngestError> {
        let missing: BTreeSet<String> = kind
            .required_columns()
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        let found: BTreeSet<String> = self.columns.iter().cloned().collect();
        Err(IngestError::MissingColumns {
            dataset: kind.label(),
            missing: missing.into_iter().collect(),
            found: found.into_iter().collect(),
        })
    }

    /// Column coerced to numbers; anything non-numeric becomes `None`
    pub fn numeric_column(&self, column: &str) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| row.get(column).and_then(coerce_number))
            .collect()
    }

    /// Column rendered as text; nulls become `None`
    pub fn text_column(&self, column: &str) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| match row.get(column) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect()
    }
}

/// Numeric value of a cell, parsing numeric strings
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(cell.to_string())
}
