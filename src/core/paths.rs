use std::path::{Path, PathBuf};

/// Models directory inside a dbt-style project
pub fn models_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("models")
}

/// Seeds directory inside a dbt-style project
pub fn seeds_dir(project_dir: &Path) -> PathBuf {
    project_dir.join("seeds")
}

/// Expand a leading tilde in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
