use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::local_files::{local, FileSystem};
use crate::paths;
use crate::selection::Selection;

/// A transformation unit discovered on disk: one file, one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Seed,
}

/// How to treat an absent or unreadable artifact directory.
///
/// Lenient maps both to an empty list (soft-fail); strict surfaces a
/// discovery error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    #[default]
    Lenient,
    Strict,
}

/// List artifact names in a directory: the base name of every regular file
/// whose extension matches, in directory-listing order. No recursion.
pub fn discover(
    dir: &Path,
    extension: &str,
    kind: ArtifactKind,
    mode: DiscoveryMode,
) -> Result<Vec<Artifact>> {
    if !dir.exists() {
        return match mode {
            DiscoveryMode::Lenient => Ok(Vec::new()),
            DiscoveryMode::Strict => Err(Error::discovery_failed(
                dir.display().to_string(),
                "directory does not exist",
            )),
        };
    }

    let entries = match local().list(dir) {
        Ok(entries) => entries,
        Err(e) => {
            return match mode {
                DiscoveryMode::Lenient => Ok(Vec::new()),
                DiscoveryMode::Strict => {
                    Err(Error::discovery_failed(dir.display().to_string(), e.message))
                }
            }
        }
    };

    let artifacts = entries
        .iter()
        .filter(|e| !e.is_dir && e.has_extension(extension))
        .filter_map(|e| e.stem())
        .map(|name| Artifact { name, kind })
        .collect();

    Ok(artifacts)
}

/// Artifacts of one dbt-style project: models (`.sql`) and seeds (`.csv`).
#[derive(Debug, Clone, Serialize)]
pub struct ProjectArtifacts {
    pub models: Vec<Artifact>,
    pub seeds: Vec<Artifact>,
}

impl ProjectArtifacts {
    pub fn discover(project_dir: &Path, mode: DiscoveryMode) -> Result<Self> {
        let models = discover(
            &paths::models_dir(project_dir),
            "sql",
            ArtifactKind::Model,
            mode,
        )?;
        let seeds = discover(
            &paths::seeds_dir(project_dir),
            "csv",
            ArtifactKind::Seed,
            mode,
        )?;
        Ok(Self { models, seeds })
    }

    pub fn model_selection(&self) -> Selection {
        let names: Vec<&str> = self.models.iter().map(|a| a.name.as_str()).collect();
        Selection::from_names(&names)
    }

    pub fn seed_selection(&self) -> Selection {
        let names: Vec<&str> = self.seeds.iter().map(|a| a.name.as_str()).collect();
        Selection::from_names(&names)
    }
}
