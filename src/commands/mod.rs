pub type CmdResult<T> = flowctl::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod discover;
pub mod etl;
pub mod test;
pub mod transform;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (flowctl::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Transform(args) => dispatch!(args, global, transform),
        crate::Commands::Etl(args) => dispatch!(args, global, etl),
        crate::Commands::Test(args) => dispatch!(args, global, test),
        crate::Commands::Discover(args) => dispatch!(args, global, discover),
    }
}
