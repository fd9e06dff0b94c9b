//! The extract → transform → load pipeline.

use std::cell::RefCell;

use crate::config::EtlConfig;
use crate::dataset::TabularDataset;
use crate::error::{Error, Result};
use crate::etl;
use crate::pipeline::{self, PipelineRunResult, PipelineStep, StepExecutor, StepResult};

const STEP_EXTRACT: &str = "extract";
const STEP_TRANSFORM: &str = "transform";
const STEP_LOAD: &str = "load";

/// Executes the three ETL steps, handing the dataset forward from one
/// step to the next. The dataset is owned by this run alone.
struct EtlStepExecutor<'a> {
    config: &'a EtlConfig,
    dataset: RefCell<Option<TabularDataset>>,
}

impl<'a> EtlStepExecutor<'a> {
    fn new(config: &'a EtlConfig) -> Self {
        Self {
            config,
            dataset: RefCell::new(None),
        }
    }

    fn take_dataset(&self, step: &str) -> Result<TabularDataset> {
        self.dataset
            .borrow_mut()
            .take()
            .ok_or_else(|| Error::internal_unexpected(format!("no dataset available for '{}'", step)))
    }
}

impl StepExecutor for EtlStepExecutor<'_> {
    fn execute_step(&self, step: &PipelineStep) -> Result<StepResult> {
        match step.id.as_str() {
            STEP_EXTRACT => {
                let dataset = etl::extract(&self.config.endpoint)?;
                let count = dataset.row_count();
                *self.dataset.borrow_mut() = Some(dataset);
                Ok(StepResult::success(&step.id).with_output(format!("{} records", count)))
            }
            STEP_TRANSFORM => {
                let mut dataset = self.take_dataset(&step.id)?;
                etl::transform(&mut dataset)?;
                *self.dataset.borrow_mut() = Some(dataset);
                Ok(StepResult::success(&step.id))
            }
            STEP_LOAD => {
                let dataset = self.take_dataset(&step.id)?;
                let rows = etl::load(&dataset, self.config)?;
                Ok(StepResult::success(&step.id).with_rows(rows))
            }
            other => Err(Error::internal_unexpected(format!(
                "unknown etl step '{}'",
                other
            ))),
        }
    }
}

pub fn steps(config: &EtlConfig) -> Vec<PipelineStep> {
    vec![
        PipelineStep::new(STEP_EXTRACT).with_label(format!("GET {}", config.endpoint)),
        PipelineStep::new(STEP_TRANSFORM)
            .with_label(format!("drop columns {}", etl::DROPPED_COLUMNS.join(", "))),
        PipelineStep::new(STEP_LOAD).with_label(format!(
            "{:?} into '{}'",
            config.write_mode, config.table_name
        )),
    ]
}

/// Run the whole ETL pipeline against the given configuration.
pub fn run(config: &EtlConfig) -> Result<PipelineRunResult> {
    config.validate()?;
    let executor = EtlStepExecutor::new(config);
    pipeline::run("etl", &steps(config), &executor)
}
