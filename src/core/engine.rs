// External transformation-engine collaborator.
//
// Commands are immutable token sequences built through a small builder
// with a fixed clause order (verb, select, full-refresh), never ad-hoc
// string joining. The engine only reports pass/fail plus captured
// output; structured engine output is never inspected.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{EngineCommandFailedDetails, Error, Result};
use crate::selection::Selection;
use crate::utils::shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineVerb {
    Seed,
    Run,
    Test,
}

impl EngineVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineVerb::Seed => "seed",
            EngineVerb::Run => "run",
            EngineVerb::Test => "test",
        }
    }
}

/// One engine invocation, e.g. `dbt seed --select test.csv --full-refresh`.
/// Immutable after construction; built once per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    tokens: Vec<String>,
}

impl EngineCommand {
    pub fn seed() -> EngineCommandBuilder {
        EngineCommandBuilder::new(EngineVerb::Seed)
    }

    pub fn run() -> EngineCommandBuilder {
        EngineCommandBuilder::new(EngineVerb::Run)
    }

    pub fn test() -> EngineCommandBuilder {
        EngineCommandBuilder::new(EngineVerb::Test)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The logical command string, logged before execution.
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

impl std::fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[derive(Debug)]
pub struct EngineCommandBuilder {
    verb: EngineVerb,
    selection: Option<Selection>,
    full_refresh: bool,
}

impl EngineCommandBuilder {
    fn new(verb: EngineVerb) -> Self {
        Self {
            verb,
            selection: None,
            full_refresh: false,
        }
    }

    /// Qualify the command with `--select <selection>`. A wildcard
    /// selection means "all", which is already the engine default, so it
    /// produces no clause.
    pub fn select(mut self, selection: &Selection) -> Self {
        if !selection.is_wildcard() {
            self.selection = Some(selection.clone());
        }
        self
    }

    pub fn select_opt(self, selection: Option<&Selection>) -> Self {
        match selection {
            Some(s) => self.select(s),
            None => self,
        }
    }

    pub fn full_refresh(mut self, full_refresh: bool) -> Self {
        self.full_refresh = full_refresh;
        self
    }

    pub fn build(self) -> EngineCommand {
        let mut tokens = vec!["dbt".to_string(), self.verb.as_str().to_string()];
        if let Some(selection) = &self.selection {
            tokens.push("--select".to_string());
            tokens.push(selection.as_str().to_string());
        }
        if self.full_refresh {
            tokens.push("--full-refresh".to_string());
        }
        EngineCommand { tokens }
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// The dbt CLI, addressed by project and profiles directory.
pub struct DbtEngine {
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl DbtEngine {
    pub fn new(project_dir: &Path, profiles_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            profiles_dir: profiles_dir.to_path_buf(),
        }
    }

    /// Execute one command, blocking until the engine exits. Non-zero
    /// exit surfaces as an error carrying the captured output.
    pub fn execute(&self, command: &EngineCommand) -> Result<CommandOutput> {
        log_status!("engine", "Running: {}", command.render());

        let line = self.shell_line(command);
        let output = execute_local_command(&line);

        if output.success {
            Ok(output)
        } else {
            Err(Error::engine_command_failed(EngineCommandFailedDetails {
                command: command.render(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            })
            .with_hint("Run the command manually from the project directory to inspect engine output"))
        }
    }

    /// Full shell line: quoted command tokens plus the project/profiles
    /// directory flags the engine needs to locate its configuration.
    fn shell_line(&self, command: &EngineCommand) -> String {
        format!(
            "{} --project-dir {} --profiles-dir {}",
            shell::quote_args(command.tokens()),
            shell::quote_path(&self.project_dir.to_string_lossy()),
            shell::quote_path(&self.profiles_dir.to_string_lossy()),
        )
    }
}

pub fn execute_local_command(command: &str) -> CommandOutput {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Command error: {}", e),
            success: false,
            exit_code: -1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_with_selection_and_full_refresh() {
        let command = EngineCommand::seed()
            .select(&Selection::single("test.csv"))
            .full_refresh(true)
            .build();
        assert_eq!(command.render(), "dbt seed --select test.csv --full-refresh");
    }

    #[test]
    fn clause_order_is_fixed_regardless_of_builder_call_order() {
        let command = EngineCommand::seed()
            .full_refresh(true)
            .select(&Selection::single("test.csv"))
            .build();
        assert_eq!(command.render(), "dbt seed --select test.csv --full-refresh");
    }

    #[test]
    fn run_with_multi_name_selection() {
        let command = EngineCommand::run()
            .select(&Selection::from_names(&["users", "orders"]))
            .build();
        assert_eq!(command.render(), "dbt run --select users, orders");
        assert_eq!(
            command.tokens(),
            ["dbt", "run", "--select", "users, orders"]
        );
    }

    #[test]
    fn wildcard_selection_produces_no_select_clause() {
        let command = EngineCommand::run().select(&Selection::wildcard()).build();
        assert_eq!(command.render(), "dbt run");
    }

    #[test]
    fn bare_test_command() {
        let command = EngineCommand::test().select_opt(None).build();
        assert_eq!(command.render(), "dbt test");
    }

    #[test]
    fn test_command_with_selection() {
        let command = EngineCommand::test()
            .select_opt(Some(&Selection::single("users")))
            .build();
        assert_eq!(command.render(), "dbt test --select users");
    }

    #[test]
    fn shell_line_quotes_selection_and_directories() {
        let engine = DbtEngine::new(Path::new("/srv/dbt_demo"), Path::new("/srv/dbt_demo"));
        let command = EngineCommand::run()
            .select(&Selection::from_names(&["users", "orders"]))
            .build();
        assert_eq!(
            engine.shell_line(&command),
            "dbt run --select 'users, orders' --project-dir '/srv/dbt_demo' --profiles-dir '/srv/dbt_demo'"
        );
    }

    #[test]
    fn execute_local_command_captures_exit_status() {
        let ok = execute_local_command("true");
        assert!(ok.success);
        assert_eq!(ok.exit_code, 0);

        let bad = execute_local_command("exit 3");
        assert!(!bad.success);
        assert_eq!(bad.exit_code, 3);
    }
}
