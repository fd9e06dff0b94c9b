// Linear pipeline runner.
//
// One logical thread per run: steps execute strictly in sequence, each
// blocking until its external call completes. The first failing step
// halts the chain with no retry and no rollback of earlier steps
// (at-most-once, no compensation).

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PipelineStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

pub trait StepExecutor {
    fn execute_step(&self, step: &PipelineStep) -> Result<StepResult>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub id: String,
    pub status: RunStatus,
    /// Row count written, for the load step only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Raw collaborator output, opaque to the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl StepResult {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RunStatus::Success,
            rows: None,
            output: None,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunResult {
    pub pipeline: String,
    pub steps: Vec<StepResult>,
    pub status: RunStatus,
}

/// Run the steps in order, feeding each executor call in sequence. On
/// the first failure the run stops and the terminal error names the
/// failing step and carries the collaborator's detail.
pub fn run(
    pipeline: &str,
    steps: &[PipelineStep],
    executor: &dyn StepExecutor,
) -> Result<PipelineRunResult> {
    let mut results = Vec::with_capacity(steps.len());

    for step in steps {
        match &step.label {
            Some(label) => log_status!("pipeline", "{}: {} ({})", pipeline, step.id, label),
            None => log_status!("pipeline", "{}: {}", pipeline, step.id),
        }

        let result = executor
            .execute_step(step)
            .map_err(|e| Error::pipeline_step_failed(pipeline, &step.id, e))?;
        results.push(result);
    }

    log_status!("pipeline", "{}: completed successfully", pipeline);

    Ok(PipelineRunResult {
        pipeline: pipeline.to_string(),
        steps: results,
        status: RunStatus::Success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingExecutor {
        executed: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingExecutor {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                executed: RefCell::new(Vec::new()),
                fail_on: fail_on.map(|s| s.to_string()),
            }
        }
    }

    impl StepExecutor for RecordingExecutor {
        fn execute_step(&self, step: &PipelineStep) -> Result<StepResult> {
            self.executed.borrow_mut().push(step.id.clone());
            if self.fail_on.as_deref() == Some(step.id.as_str()) {
                return Err(Error::internal_unexpected("boom"));
            }
            Ok(StepResult::success(&step.id))
        }
    }

    fn steps() -> Vec<PipelineStep> {
        vec![
            PipelineStep::new("extract"),
            PipelineStep::new("transform"),
            PipelineStep::new("load"),
        ]
    }

    #[test]
    fn runs_all_steps_in_order() {
        let executor = RecordingExecutor::new(None);
        let result = run("etl", &steps(), &executor).unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(
            *executor.executed.borrow(),
            ["extract", "transform", "load"]
        );
    }

    #[test]
    fn first_failure_halts_the_chain() {
        let executor = RecordingExecutor::new(Some("transform"));
        let err = run("etl", &steps(), &executor).unwrap_err();

        assert_eq!(err.code, crate::ErrorCode::PipelineStepFailed);
        assert!(err.message.contains("'transform'"));
        assert!(err.message.contains("'etl'"));
        // load never ran
        assert_eq!(*executor.executed.borrow(), ["extract", "transform"]);
    }

    #[test]
    fn terminal_error_carries_step_and_cause() {
        let executor = RecordingExecutor::new(Some("extract"));
        let err = run("etl", &steps(), &executor).unwrap_err();

        assert_eq!(err.details["step"], "extract");
        assert_eq!(err.details["pipeline"], "etl");
        assert_eq!(err.details["code"], "internal.unexpected");
    }
}
