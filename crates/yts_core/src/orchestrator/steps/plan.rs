//! PlanSegments step - turns resolved start times into segments.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::split::{format_clock, plan_segments_with_tail};

/// Planning segments, with the configured tail for the last track.
pub struct PlanSegmentsStep;

impl PlanSegmentsStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlanSegmentsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PlanSegmentsStep {
    fn name(&self) -> &str {
        "PlanSegments"
    }

    fn description(&self) -> &str {
        "Plan one segment per resolved track"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if !ctx.job_spec.mode.is_tracklist() {
            return Ok(StepOutcome::Skipped("Not a tracklist batch".to_string()));
        }
        let resolved = state
            .resolved
            .as_deref()
            .ok_or_else(|| StepError::precondition_failed("No resolved timestamps recorded"))?;

        let segments = plan_segments_with_tail(resolved, ctx.settings.split.tail_seconds);
        for segment in &segments {
            ctx.logger.debug(&format!(
                "{:03} {}-{}{}",
                segment.item.item.sequence_number,
                format_clock(segment.start_seconds),
                format_clock(segment.end_seconds),
                if segment.is_degenerate() { " (zero length)" } else { "" }
            ));
        }
        if segments.is_empty() {
            ctx.logger.warn("No track has a usable timestamp, nothing to split");
        } else {
            ctx.logger
                .info(&format!("Planned {} segments", segments.len()));
        }

        state.segments = Some(segments);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.segments.is_none() {
            return Err(StepError::invalid_output("Segments not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobMode, JobSpec, ResolvedItem, TimedItem};
    use crate::orchestrator::types::fixtures::{context_with, fake_toolchain};
    use tempfile::tempdir;

    fn resolved(seq: u32, seconds: Option<u64>) -> ResolvedItem {
        ResolvedItem::new(TimedItem::new(seq, "T", None, None), seconds)
    }

    #[test]
    fn uses_configured_tail() {
        let dir = tempdir().unwrap();
        let mut ctx = context_with(
            dir.path(),
            JobSpec::new(
                "https://example.com/watch/abc",
                JobMode::Tracklist { tracks: None },
            ),
            fake_toolchain(),
        );
        ctx.settings.split.tail_seconds = 30;

        let mut state = JobState::new("job");
        state.resolved = Some(vec![
            resolved(1, Some(0)),
            resolved(2, None),
            resolved(3, Some(90)),
        ]);
        PlanSegmentsStep::new().execute(&ctx, &mut state).unwrap();

        let bounds: Vec<(u64, u64)> = state
            .segments
            .unwrap()
            .iter()
            .map(|s| (s.start_seconds, s.end_seconds))
            .collect();
        assert_eq!(bounds, vec![(0, 90), (90, 120)]);
    }

    #[test]
    fn nothing_resolvable_is_not_an_error() {
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
        state.resolved = Some(vec![resolved(1, None)]);

        let step = PlanSegmentsStep::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();
        assert!(state.segments.unwrap().is_empty());
    }
}
