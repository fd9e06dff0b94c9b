// Extract / transform / load primitives.
//
// extract: HTTP GET against the configured endpoint, JSON array body.
// transform: drop the fixed nested columns the warehouse never needs.
// load: write the dataset to SQLite, replace semantics by default, no
// synthetic primary-key column. The connection lives for the duration
// of the load call only and is released on scope exit even when the
// write fails.

use std::time::Duration;

use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};

use crate::config::{EtlConfig, WriteMode};
use crate::dataset::TabularDataset;
use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Columns removed by the transform step.
pub const DROPPED_COLUMNS: [&str; 2] = ["address", "company"];

pub fn extract(endpoint: &str) -> Result<TabularDataset> {
    log_status!("etl", "Extracting data from {}", endpoint);

    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("flowctl/{}", VERSION))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

    let response = client
        .get(endpoint)
        .send()
        .map_err(|e| Error::fetch_failed(endpoint, e.status().map(|s| s.as_u16()), Some(e.to_string())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::fetch_failed(endpoint, Some(status.as_u16()), None));
    }

    let records: Vec<Map<String, Value>> = response.json().map_err(|e| {
        Error::fetch_failed(endpoint, None, Some(format!("invalid JSON body: {}", e)))
    })?;

    let dataset = TabularDataset::from_records(&records);
    log_status!("etl", "Extracted {} records", dataset.row_count());
    Ok(dataset)
}

pub fn transform(dataset: &mut TabularDataset) -> Result<()> {
    log_status!("etl", "Dropping columns: {}", DROPPED_COLUMNS.join(", "));
    dataset.drop_columns(&DROPPED_COLUMNS)
}

/// Persist the dataset and return the row count written.
pub fn load(dataset: &TabularDataset, config: &EtlConfig) -> Result<usize> {
    let table = config.table_name.as_str();

    if dataset.columns().is_empty() {
        return Err(Error::persist_failed(table, "dataset has no columns"));
    }

    let mut conn = Connection::open(config.database_path())
        .map_err(|e| Error::persist_failed(table, e.to_string()))?;

    let tx = conn
        .transaction()
        .map_err(|e| Error::persist_failed(table, e.to_string()))?;

    let create = create_table_sql(table, dataset, config.write_mode);
    tx.execute_batch(&create)
        .map_err(|e| Error::persist_failed(table, e.to_string()))?;

    let insert = insert_sql(table, dataset);
    {
        let mut stmt = tx
            .prepare(&insert)
            .map_err(|e| Error::persist_failed(table, e.to_string()))?;
        for row in dataset.rows() {
            stmt.execute(params_from_iter(row.iter().map(to_sql_value)))
                .map_err(|e| Error::persist_failed(table, e.to_string()))?;
        }
    }

    tx.commit()
        .map_err(|e| Error::persist_failed(table, e.to_string()))?;

    log_status!("etl", "Loaded {} rows into table '{}'", dataset.row_count(), table);
    Ok(dataset.row_count())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &str, dataset: &TabularDataset, mode: WriteMode) -> String {
    let columns: Vec<String> = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let ty = dataset
                .rows()
                .first()
                .map(|row| column_type(&row[idx]))
                .unwrap_or("TEXT");
            format!("{} {}", quote_ident(name), ty)
        })
        .collect();

    let table = quote_ident(table);
    match mode {
        WriteMode::Replace => format!(
            "DROP TABLE IF EXISTS {};\nCREATE TABLE {} ({});",
            table,
            table,
            columns.join(", ")
        ),
        WriteMode::Append => {
            format!("CREATE TABLE IF NOT EXISTS {} ({});", table, columns.join(", "))
        }
    }
}

fn insert_sql(table: &str, dataset: &TabularDataset) -> String {
    let columns: Vec<String> = dataset.columns().iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<&str> = dataset.columns().iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn column_type(value: &Value) -> &'static str {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => "INTEGER",
        Value::Number(_) => "REAL",
        Value::Bool(_) => "INTEGER",
        _ => "TEXT",
    }
}

/// Scalars map to native SQLite types; nested objects and arrays are
/// stored as their JSON text.
fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Sql::Integer(i)
            } else {
                Sql::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Sql::Text(s.clone()),
        other => Sql::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn dataset() -> TabularDataset {
        let records: Vec<Map<String, Value>> = [
            json!({"id": 1, "name": "A", "score": 1.5}),
            json!({"id": 2, "name": "B", "score": 2.5}),
            json!({"id": 3, "name": "C", "score": 3.5}),
        ]
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        })
        .collect();
        TabularDataset::from_records(&records)
    }

    fn config(dir: &std::path::Path, mode: WriteMode) -> EtlConfig {
        EtlConfig {
            database: dir.join("test.db").to_string_lossy().to_string(),
            write_mode: mode,
            ..EtlConfig::default()
        }
    }

    fn count_rows(config: &EtlConfig) -> i64 {
        let conn = Connection::open(config.database_path()).unwrap();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(&config.table_name)),
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn load_returns_row_count() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Replace);

        let written = load(&dataset(), &config).unwrap();
        assert_eq!(written, 3);
        assert_eq!(count_rows(&config), 3);
    }

    #[test]
    fn replace_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Replace);
        let ds = dataset();

        load(&ds, &config).unwrap();
        load(&ds, &config).unwrap();
        assert_eq!(count_rows(&config), 3);
    }

    #[test]
    fn append_accumulates() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Append);
        let ds = dataset();

        load(&ds, &config).unwrap();
        load(&ds, &config).unwrap();
        assert_eq!(count_rows(&config), 6);
    }

    #[test]
    fn no_synthetic_index_column() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Replace);
        let ds = dataset();

        load(&ds, &config).unwrap();

        let conn = Connection::open(config.database_path()).unwrap();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(&config.table_name)))
            .unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(columns.len(), ds.columns().len());
        for col in ds.columns() {
            assert!(columns.contains(col));
        }
    }

    #[test]
    fn nested_values_stored_as_json_text() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Replace);

        let records: Vec<Map<String, Value>> = [json!({"id": 1, "tags": ["a", "b"]})]
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect();
        let ds = TabularDataset::from_records(&records);
        load(&ds, &config).unwrap();

        let conn = Connection::open(config.database_path()).unwrap();
        let tags: String = conn
            .query_row(
                &format!("SELECT tags FROM {}", quote_ident(&config.table_name)),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tags, r#"["a","b"]"#);
    }

    #[test]
    fn empty_dataset_is_a_persist_error() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), WriteMode::Replace);
        let ds = TabularDataset::from_records(&[]);

        let err = load(&ds, &config).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::PersistFailed);
    }
}
