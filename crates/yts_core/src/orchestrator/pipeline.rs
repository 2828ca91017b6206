//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in order, running validation before
/// and after each step, and tracks which steps ran or were skipped.
/// The first failing step ends the batch.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each step in order:
    /// 1. Run `validate_input`
    /// 2. Run `execute`
    /// 3. Run `validate_output` (if execute returned Success)
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            ctx.logger.phase(step_name);

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Execution failed: {}", e));
                PipelineError::step_failed(&ctx.job_name, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    ctx.logger
                        .debug(&format!("Validating output for '{}'", step_name));
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.logger.success("Pipeline completed successfully");
        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::StepError;
    use crate::orchestrator::types::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        outcome: fn() -> Result<StepOutcome, StepError>,
    }

    impl CountingStep {
        fn new(name: &'static str, count: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                execute_count: Arc::clone(count),
                outcome: || Ok(StepOutcome::Success),
            }
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Step1", &count))
            .with_step(CountingStep::new("Step2", &count));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn records_completed_and_skipped_steps() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let count = Arc::new(AtomicUsize::new(0));
        let mut skipping = CountingStep::new("Skipper", &count);
        skipping.outcome = || Ok(StepOutcome::Skipped("not needed".to_string()));

        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("First", &count))
            .with_step(skipping);
        let mut state = JobState::new("job");
        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_completed, vec!["First"]);
        assert_eq!(result.steps_skipped, vec!["Skipper"]);
        assert!(!result.all_completed());
        assert_eq!(result.total_steps(), 2);
    }

    #[test]
    fn first_failure_stops_the_pipeline() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let count = Arc::new(AtomicUsize::new(0));
        let mut failing = CountingStep::new("Broken", &count);
        failing.outcome = || Err(StepError::precondition_failed("nothing to do"));

        let pipeline = Pipeline::new()
            .with_step(failing)
            .with_step(CountingStep::new("Never", &count));
        let mut state = JobState::new("job");
        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StepFailed { ref step_name, .. } if step_name == "Broken"
        ));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
