//! Feature schema and feature vectors exchanged with the scoring model

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Ordered list of input names the model was trained with.
///
/// Loaded once at start-up and shared read-only between scoring tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Arc<[String]>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty or duplicated column lists
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if columns.is_empty() {
            bail!("Feature schema has no columns");
        }

        {
            let mut seen = HashSet::with_capacity(columns.len());
            for column in &columns {
                if !seen.insert(column.as_str()) {
                    bail!("Feature schema lists column '{}' more than once", column);
                }
            }
        }

        Ok(Self {
            columns: columns.into(),
        })
    }

    /// Load a schema from a JSON array of column names
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature schema from {:?}", path))?;
        let columns: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("Feature schema {:?} is not a JSON array of names", path))?;
        Self::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Model input: one value per schema column, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair schema columns with values. Non-finite values are coerced to 0.
    pub(crate) fn new(schema: FeatureSchema, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn names(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema
            .columns()
            .iter()
            .position(|column| column == name)
            .map(|index| self.values[index])
    }

    /// Single-precision copy for tensor input
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    /// Iterate `(name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_schema_rejects_duplicates_and_empty() {
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
        assert!(FeatureSchema::new(["month", "month"]).is_err());
        assert_eq!(FeatureSchema::new(["month", "is_sunday"]).unwrap().len(), 2);
    }

    #[test]
    fn test_schema_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["price_efficiency", "buyer_encoded"]"#).unwrap();

        let schema = FeatureSchema::load(file.path()).unwrap();
        assert_eq!(schema.columns(), &["price_efficiency", "buyer_encoded"]);
    }

    #[test]
    fn test_vector_coerces_non_finite_values() {
        let schema = FeatureSchema::new(["a", "b", "c"]).unwrap();
        let vector = FeatureVector::new(schema, vec![1.5, f64::NAN, f64::INFINITY]);

        assert_eq!(vector.values(), &[1.5, 0.0, 0.0]);
        assert_eq!(vector.get("a"), Some(1.5));
        assert_eq!(vector.get("missing"), None);
    }
}
