use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// In-memory relation flowing through an ETL run: named columns plus rows
/// in arrival order. Owned by the run that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularDataset {
    /// Build a dataset from a JSON array of records. Columns are the union
    /// of record keys in first-appearance order; a record missing a column
    /// yields null in that cell.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| record.get(col).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Remove the named columns from every row. Every name must be present;
    /// the first absent one fails the transform.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(Error::schema_missing_column(
                    name.to_string(),
                    self.columns.clone(),
                ));
            }
        }

        for name in names {
            let idx = self
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| Error::internal_unexpected(format!("column '{}' vanished", name)))?;
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn from_records_builds_columns_and_rows() {
        let records = vec![
            record(json!({"id": 1, "name": "A"})),
            record(json!({"id": 2, "name": "B"})),
        ];
        let ds = TabularDataset::from_records(&records);
        assert_eq!(ds.row_count(), 2);
        assert!(ds.has_column("id"));
        assert!(ds.has_column("name"));
    }

    #[test]
    fn missing_key_becomes_null() {
        let records = vec![
            record(json!({"id": 1, "name": "A"})),
            record(json!({"id": 2})),
        ];
        let ds = TabularDataset::from_records(&records);
        let name_idx = ds.columns().iter().position(|c| c == "name").unwrap();
        assert_eq!(ds.rows()[1][name_idx], Value::Null);
    }

    #[test]
    fn drop_columns_removes_cells() {
        let records = vec![record(json!({
            "id": 1, "address": "x", "company": "y", "name": "A"
        }))];
        let mut ds = TabularDataset::from_records(&records);
        ds.drop_columns(&["address", "company"]).unwrap();

        let mut cols: Vec<_> = ds.columns().to_vec();
        cols.sort();
        assert_eq!(cols, ["id", "name"]);
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.rows()[0].len(), 2);
    }

    #[test]
    fn drop_missing_column_is_a_schema_error() {
        let records = vec![record(json!({"id": 1}))];
        let mut ds = TabularDataset::from_records(&records);
        let err = ds.drop_columns(&["address"]).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::SchemaMissingColumn);
        // Nothing was removed
        assert!(ds.has_column("id"));
    }
}
