//! Summarize step - emits the final count line for the batch.

use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct SummarizeStep;

impl SummarizeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SummarizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SummarizeStep {
    fn name(&self) -> &str {
        "Summarize"
    }

    fn description(&self) -> &str {
        "Report what the batch produced"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if let Some(summary) = state.summary() {
            let line = format!("Summary: {}", summary);
            if summary.failed > 0 {
                ctx.logger.warn(&line);
            } else {
                ctx.logger.info(&line);
            }
        }

        let outputs = state.outputs();
        ctx.logger.info(&format!(
            "{} output files in {}",
            outputs.len(),
            ctx.job_dir.display()
        ));
        for path in &outputs {
            ctx.logger.debug(&path.display().to_string());
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }
}
