use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::discovery::DiscoveryMode;
use crate::error::{Error, Result};
use crate::local_files::{local, FileSystem};
use crate::paths;

/// Parse JSON string into typed value.
pub(crate) fn from_str<T: DeserializeOwned>(s: &str, path: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|e| Error::config_invalid_json(path, e))
}

/// How the load step treats an existing table of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Destructive overwrite: drop and recreate the table.
    #[default]
    Replace,
    Append,
}

/// Configuration for the extract-transform-load pipeline.
///
/// All fields have defaults matching the demo data source; unknown keys
/// are rejected so a typo never silently falls back to a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EtlConfig {
    /// JSON endpoint returning an array of records.
    pub endpoint: String,
    /// Destination table name.
    pub table_name: String,
    /// SQLite database file path (`~` expanded).
    pub database: String,
    pub write_mode: WriteMode,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://jsonplaceholder.typicode.com/users".to_string(),
            table_name: "users_api".to_string(),
            database: "flowctl.db".to_string(),
            write_mode: WriteMode::Replace,
        }
    }
}

impl EtlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = local().read(path)?;
        let config: EtlConfig = from_str(&content, &path.display().to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::config_invalid_value(
                "endpoint",
                None,
                "endpoint must not be empty",
            ));
        }
        if self.table_name.is_empty() {
            return Err(Error::config_invalid_value(
                "tableName",
                None,
                "table name must not be empty",
            ));
        }
        if self.database.is_empty() {
            return Err(Error::config_invalid_value(
                "database",
                None,
                "database path must not be empty",
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        paths::expand(&self.database)
    }
}

/// Configuration for the dbt-style transform pipeline.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub discovery: DiscoveryMode,
}

impl TransformConfig {
    /// Profiles dir defaults to the project dir, as the engine's own
    /// convention for self-contained demo projects.
    pub fn new(project_dir: &str, profiles_dir: Option<&str>, discovery: DiscoveryMode) -> Self {
        let project_dir = paths::expand(project_dir);
        let profiles_dir = profiles_dir
            .map(paths::expand)
            .unwrap_or_else(|| project_dir.clone());
        Self {
            project_dir,
            profiles_dir,
            discovery,
        }
    }
}
