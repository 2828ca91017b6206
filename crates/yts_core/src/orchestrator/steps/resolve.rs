//! ResolveTimestamps step - parses each track's raw timestamp.
//!
//! Every track that cannot be placed gets a `[skipped]` line here, since it
//! never reaches the split step.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::split::{report_unresolved, resolve_items};

/// Parsing timestamps. Unparseable tracks are kept, unresolved.
pub struct ResolveTimestampsStep;

impl ResolveTimestampsStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResolveTimestampsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ResolveTimestampsStep {
    fn name(&self) -> &str {
        "ResolveTimestamps"
    }

    fn description(&self) -> &str {
        "Parse track timestamps"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if !ctx.job_spec.mode.is_tracklist() {
            return Ok(StepOutcome::Skipped("Not a tracklist batch".to_string()));
        }
        let items = state
            .tracklist
            .as_deref()
            .ok_or_else(|| StepError::precondition_failed("No tracklist recorded"))?;

        let resolved = resolve_items(items);
        let unresolved = report_unresolved(&resolved, Some(&*ctx.logger));
        ctx.logger.info(&format!(
            "Resolved {} of {} timestamps",
            resolved.len() - unresolved,
            resolved.len()
        ));

        state.resolved = Some(resolved);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let same_len = matches!(
            (&state.tracklist, &state.resolved),
            (Some(items), Some(resolved)) if items.len() == resolved.len()
        );
        if !same_len {
            return Err(StepError::invalid_output(
                "Resolved list does not match the tracklist",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobMode, JobSpec, TimedItem};
    use crate::orchestrator::types::fixtures::{context_with, fake_toolchain};
    use tempfile::tempdir;

    #[test]
    fn keeps_unresolved_items() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            JobSpec::new(
                "https://example.com/watch/abc",
                JobMode::Tracklist { tracks: None },
            ),
            fake_toolchain(),
        );
        let mut state = JobState::new("job");
        state.tracklist = Some(vec![
            TimedItem::new(1, "A", None, Some("0:00".into())),
            TimedItem::new(2, "B", None, Some("soon".into())),
            TimedItem::new(3, "C", None, None),
        ]);

        let step = ResolveTimestampsStep::new();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let resolved = state.resolved.as_ref().unwrap();
        assert_eq!(resolved[0].resolved_seconds, Some(0));
        assert_eq!(resolved[1].resolved_seconds, None);
        assert_eq!(state.unresolved_count(), 2);
    }

    #[test]
    fn reports_each_unresolved_track() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            JobSpec::new(
                "https://example.com/watch/abc",
                JobMode::Tracklist { tracks: None },
            ),
            fake_toolchain(),
        );
        let mut state = JobState::new("job");
        state.tracklist = Some(vec![
            TimedItem::new(1, "Intro", None, Some("0:00".into())),
            TimedItem::new(2, "LostTrack", None, Some("later".into())),
        ]);

        ResolveTimestampsStep::new().execute(&ctx, &mut state).unwrap();
        ctx.logger.flush();

        let log = std::fs::read_to_string(ctx.logger.log_path()).unwrap();
        assert!(log.contains("[skipped] 002 LostTrack: no usable timestamp (later)"));
        assert!(!log.contains("[skipped] 001"));
    }

    #[test]
    fn requires_a_tracklist() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            JobSpec::new(
                "https://example.com/watch/abc",
                JobMode::Tracklist { tracks: None },
            ),
            fake_toolchain(),
        );
        let mut state = JobState::new("job");
        assert!(matches!(
            ResolveTimestampsStep::new().execute(&ctx, &mut state),
            Err(StepError::PreconditionFailed(_))
        ));
    }
}
