use clap::Args;
use serde::Serialize;

use flowctl::pipeline::PipelineRunResult;
use flowctl::transform_flow;
use flowctl::Selection;

use super::CmdResult;

#[derive(Args)]
pub struct TestArgs {
    /// Selection expression for the engine test run (e.g. "users, orders")
    #[arg(long)]
    pub select: Option<String>,
}

#[derive(Serialize)]
pub struct TestOutput {
    pub command: String,
    pub result: PipelineRunResult,
}

pub fn run(args: TestArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<TestOutput> {
    let selection = args.select.as_deref().map(Selection::single);
    let result = transform_flow::run_tests(selection.as_ref())?;

    Ok((
        TestOutput {
            command: "engine.test".to_string(),
            result,
        },
        0,
    ))
}
