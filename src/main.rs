use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{discover, etl, test, transform, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "flowctl")]
#[command(version = VERSION)]
#[command(about = "CLI coordinator for local data pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dbt-style transform pipeline (discover, seed, models)
    Transform(transform::TransformArgs),
    /// Run the extract-transform-load pipeline
    Etl(etl::EtlArgs),
    /// Run engine tests for a selection (not yet implemented)
    Test(test::TestArgs),
    /// Discover project artifacts and the selections they produce
    Discover(discover::DiscoverArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
