use clap::Args;
use serde::Serialize;

use flowctl::discovery::{DiscoveryMode, ProjectArtifacts};
use flowctl::paths;
use flowctl::Selection;

use super::CmdResult;

#[derive(Args)]
pub struct DiscoverArgs {
    /// dbt-style project directory (contains models/ and seeds/)
    #[arg(long, default_value = ".")]
    pub project_dir: String,

    /// Fail when models/ or seeds/ is missing instead of treating it as empty
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
pub struct DiscoverOutput {
    pub command: String,
    pub project_dir: String,
    #[serde(flatten)]
    pub artifacts: ProjectArtifacts,
    pub model_selection: Selection,
    pub seed_selection: Selection,
}

pub fn run(args: DiscoverArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DiscoverOutput> {
    let mode = if args.strict {
        DiscoveryMode::Strict
    } else {
        DiscoveryMode::Lenient
    };

    let project_dir = paths::expand(&args.project_dir);
    let artifacts = ProjectArtifacts::discover(&project_dir, mode)?;
    let model_selection = artifacts.model_selection();
    let seed_selection = artifacts.seed_selection();

    Ok((
        DiscoverOutput {
            command: "discover.run".to_string(),
            project_dir: args.project_dir,
            artifacts,
            model_selection,
            seed_selection,
        },
        0,
    ))
}
