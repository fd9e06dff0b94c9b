//! The dbt-style transform pipeline: discover → seed → model subflow.

use std::cell::RefCell;

use serde::Serialize;

use crate::config::TransformConfig;
use crate::discovery::ProjectArtifacts;
use crate::engine::{DbtEngine, EngineCommand};
use crate::error::{Error, Result};
use crate::paths;
use crate::pipeline::{self, PipelineRunResult, PipelineStep, StepExecutor, StepResult};
use crate::selection::Selection;

const STEP_DISCOVER: &str = "discover";
const STEP_SEED: &str = "seed";
const STEP_MODELS: &str = "models";

#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Explicit seed artifact. When set, the seed run is always a full
    /// refresh and the discovered seed selection is ignored entirely.
    pub seed_name: Option<String>,
    /// Requested full-refresh flag, honored only in the auto-discovery
    /// seed mode (the explicit mode forces it on).
    pub full_refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRun {
    pub model_selection: Selection,
    pub seed_selection: Selection,
    pub result: PipelineRunResult,
    /// The model phase runs as a logically separate sub-pipeline sharing
    /// the parent's discovered selection.
    pub models: PipelineRunResult,
}

/// Seed command construction, including the explicit-override vs
/// auto-discovery policy fork.
fn seed_command(options: &TransformOptions, discovered_seeds: &Selection) -> EngineCommand {
    match &options.seed_name {
        Some(name) => EngineCommand::seed()
            .select(&Selection::single(name))
            .full_refresh(true)
            .build(),
        None => EngineCommand::seed()
            .select(discovered_seeds)
            .full_refresh(options.full_refresh)
            .build(),
    }
}

fn model_command(model_selection: &Selection) -> EngineCommand {
    EngineCommand::run().select(model_selection).build()
}

struct TransformStepExecutor<'a> {
    config: &'a TransformConfig,
    options: &'a TransformOptions,
    engine: DbtEngine,
    selections: RefCell<Option<(Selection, Selection)>>,
}

impl<'a> TransformStepExecutor<'a> {
    fn new(config: &'a TransformConfig, options: &'a TransformOptions) -> Self {
        Self {
            config,
            options,
            engine: DbtEngine::new(&config.project_dir, &config.profiles_dir),
            selections: RefCell::new(None),
        }
    }

    fn discovered(&self) -> Result<(Selection, Selection)> {
        self.selections
            .borrow()
            .clone()
            .ok_or_else(|| Error::internal_unexpected("discovery has not run yet"))
    }
}

impl StepExecutor for TransformStepExecutor<'_> {
    fn execute_step(&self, step: &PipelineStep) -> Result<StepResult> {
        match step.id.as_str() {
            STEP_DISCOVER => {
                log_status!(
                    "discover",
                    "Project: {} (models: {}, seeds: {})",
                    self.config.project_dir.display(),
                    paths::models_dir(&self.config.project_dir).display(),
                    paths::seeds_dir(&self.config.project_dir).display()
                );

                let project =
                    ProjectArtifacts::discover(&self.config.project_dir, self.config.discovery)?;
                let models = project.model_selection();
                let seeds = project.seed_selection();
                let output = format!(
                    "{} models, {} seeds",
                    project.models.len(),
                    project.seeds.len()
                );
                *self.selections.borrow_mut() = Some((models, seeds));
                Ok(StepResult::success(&step.id).with_output(output))
            }
            STEP_SEED => {
                let (_, seeds) = self.discovered()?;
                let command = seed_command(self.options, &seeds);
                let output = self.engine.execute(&command)?;
                Ok(StepResult::success(&step.id).with_output(output.stdout))
            }
            STEP_MODELS => {
                let (models, _) = self.discovered()?;
                let command = model_command(&models);
                let output = self.engine.execute(&command)?;
                Ok(StepResult::success(&step.id).with_output(output.stdout))
            }
            other => Err(Error::internal_unexpected(format!(
                "unknown transform step '{}'",
                other
            ))),
        }
    }
}

/// Run the transform pipeline: discovery and seed phase first, then the
/// model run as a sub-pipeline.
pub fn run(config: &TransformConfig, options: &TransformOptions) -> Result<TransformRun> {
    let executor = TransformStepExecutor::new(config, options);

    let parent_steps = vec![
        PipelineStep::new(STEP_DISCOVER).with_label("scan models/ and seeds/"),
        PipelineStep::new(STEP_SEED).with_label(match &options.seed_name {
            Some(name) => format!("seed '{}' (full refresh)", name),
            None => "seed discovered artifacts".to_string(),
        }),
    ];
    let result = pipeline::run("transform", &parent_steps, &executor)?;

    let model_steps = vec![PipelineStep::new(STEP_MODELS).with_label("run discovered models")];
    let models = pipeline::run("transform.models", &model_steps, &executor)?;

    let (model_selection, seed_selection) = executor.discovered()?;

    Ok(TransformRun {
        model_selection,
        seed_selection,
        result,
        models,
    })
}

/// The engine test phase. Its command shape is defined (`dbt test
/// [--select <selection>]`) but its pass/fail contract is not, so
/// invoking it fails loudly instead of masking a no-op as success.
pub fn run_tests(selection: Option<&Selection>) -> Result<PipelineRunResult> {
    let command = EngineCommand::test().select_opt(selection).build();
    log_status!("engine", "Test phase requested: {}", command.render());

    Err(Error::engine_not_implemented("test")
        .with_hint(format!("The test phase would execute: {}", command.render()))
        .with_hint("Define a pass/fail contract for engine tests before enabling this phase"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryMode;
    use tempfile::tempdir;

    #[test]
    fn explicit_seed_always_forces_full_refresh() {
        let discovered = Selection::from_names(&["raw_users", "raw_orders"]);

        for requested in [false, true] {
            let options = TransformOptions {
                seed_name: Some("test.csv".to_string()),
                full_refresh: requested,
            };
            let command = seed_command(&options, &discovered);
            assert_eq!(command.render(), "dbt seed --select test.csv --full-refresh");
        }
    }

    #[test]
    fn auto_discovery_seed_uses_discovered_selection() {
        let discovered = Selection::from_names(&["raw_users"]);
        let options = TransformOptions::default();

        let command = seed_command(&options, &discovered);
        assert_eq!(command.render(), "dbt seed --select raw_users");
    }

    #[test]
    fn auto_discovery_seed_honors_requested_full_refresh() {
        let discovered = Selection::wildcard();
        let options = TransformOptions {
            seed_name: None,
            full_refresh: true,
        };

        let command = seed_command(&options, &discovered);
        assert_eq!(command.render(), "dbt seed --full-refresh");
    }

    #[test]
    fn model_command_carries_discovered_selection() {
        let command = model_command(&Selection::from_names(&["users", "orders"]));
        assert_eq!(command.render(), "dbt run --select users, orders");
    }

    #[test]
    fn discover_step_records_selections() {
        let dir = tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir(&models).unwrap();
        std::fs::write(models.join("users.sql"), "select 1").unwrap();

        let config = TransformConfig::new(
            &dir.path().to_string_lossy(),
            None,
            DiscoveryMode::Lenient,
        );
        let options = TransformOptions::default();
        let executor = TransformStepExecutor::new(&config, &options);

        let result = executor
            .execute_step(&PipelineStep::new(STEP_DISCOVER))
            .unwrap();
        assert_eq!(result.output.as_deref(), Some("1 models, 0 seeds"));

        let (model_sel, seed_sel) = executor.discovered().unwrap();
        assert_eq!(model_sel.as_str(), "users");
        assert_eq!(seed_sel.as_str(), "*");
    }

    #[test]
    fn seed_before_discovery_is_an_error() {
        let dir = tempdir().unwrap();
        let config = TransformConfig::new(
            &dir.path().to_string_lossy(),
            None,
            DiscoveryMode::Lenient,
        );
        let options = TransformOptions::default();
        let executor = TransformStepExecutor::new(&config, &options);

        let err = executor
            .execute_step(&PipelineStep::new(STEP_SEED))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::InternalUnexpected);
    }

    #[test]
    fn test_phase_is_explicitly_unimplemented() {
        let err = run_tests(Some(&Selection::single("users"))).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::EngineNotImplemented);
        assert!(err
            .hints
            .iter()
            .any(|h| h.message.contains("dbt test --select users")));
    }
}
