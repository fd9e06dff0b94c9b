use std::path::Path;

use clap::Args;
use serde::Serialize;

use flowctl::config::EtlConfig;
use flowctl::etl_flow;
use flowctl::pipeline::PipelineRunResult;

use super::CmdResult;

#[derive(Args)]
pub struct EtlArgs {
    /// JSON config file (endpoint, tableName, database, writeMode);
    /// compiled-in defaults are used when omitted
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
pub struct EtlOutput {
    pub command: String,
    pub endpoint: String,
    pub table_name: String,
    pub result: PipelineRunResult,
}

pub fn run(args: EtlArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<EtlOutput> {
    let config = match &args.config {
        Some(path) => EtlConfig::load(Path::new(path))?,
        None => EtlConfig::default(),
    };

    let result = etl_flow::run(&config)?;

    Ok((
        EtlOutput {
            command: "etl.run".to_string(),
            endpoint: config.endpoint,
            table_name: config.table_name,
            result,
        },
        0,
    ))
}
