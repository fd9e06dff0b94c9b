use clap::Args;
use serde::Serialize;

use flowctl::config::TransformConfig;
use flowctl::discovery::DiscoveryMode;
use flowctl::transform_flow::{self, TransformOptions, TransformRun};

use super::CmdResult;

#[derive(Args)]
pub struct TransformArgs {
    /// dbt-style project directory (contains models/ and seeds/)
    #[arg(long, default_value = ".")]
    pub project_dir: String,

    /// Profiles directory (defaults to the project directory)
    #[arg(long)]
    pub profiles_dir: Option<String>,

    /// Seed a single named artifact; always runs with --full-refresh
    /// and ignores the discovered seed selection
    #[arg(long)]
    pub seed: Option<String>,

    /// Request a full-refresh seed run (auto-discovery mode only)
    #[arg(long)]
    pub full_refresh: bool,

    /// Fail when models/ or seeds/ is missing instead of treating it as empty
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
pub struct TransformOutput {
    pub command: String,
    pub project_dir: String,
    #[serde(flatten)]
    pub run: TransformRun,
}

pub fn run(args: TransformArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<TransformOutput> {
    let discovery = if args.strict {
        DiscoveryMode::Strict
    } else {
        DiscoveryMode::Lenient
    };
    let config = TransformConfig::new(&args.project_dir, args.profiles_dir.as_deref(), discovery);
    let options = TransformOptions {
        seed_name: args.seed,
        full_refresh: args.full_refresh,
    };

    let run = transform_flow::run(&config, &options).map_err(|e| {
        if args.strict {
            e.with_hint("Drop --strict to treat missing artifact directories as empty")
        } else {
            e
        }
    })?;

    Ok((
        TransformOutput {
            command: "transform.run".to_string(),
            project_dir: args.project_dir,
            run,
        },
        0,
    ))
}
