//! Tracklist step - obtains the ordered track list for a split batch.

use crate::models::JobMode;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::tracklist::TracklistError;

/// Uses the caller's tracks when supplied, otherwise asks the provider.
pub struct TracklistStep;

impl TracklistStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracklistStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TracklistStep {
    fn name(&self) -> &str {
        "Tracklist"
    }

    fn description(&self) -> &str {
        "Obtain the track list"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let JobMode::Tracklist { tracks } = &ctx.job_spec.mode else {
            return Ok(StepOutcome::Skipped("Not a tracklist batch".to_string()));
        };

        let items = match tracks {
            Some(tracks) => {
                ctx.logger
                    .info(&format!("Using {} supplied tracks", tracks.len()));
                tracks.clone()
            }
            None => {
                ctx.logger.info("Fetching tracklist from video comments");
                ctx.toolchain
                    .tracklist
                    .fetch(&ctx.job_spec.url, Some(&*ctx.logger))?
            }
        };

        if items.is_empty() {
            return Err(TracklistError::NoTracks.into());
        }
        for item in &items {
            ctx.logger.debug(&format!(
                "{:03} {} @ {}",
                item.sequence_number,
                item.display_name(),
                item.raw_timestamp.as_deref().unwrap_or("-")
            ));
        }
        ctx.logger.info(&format!("Tracklist has {} tracks", items.len()));

        state.tracklist = Some(items);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.tracklist {
            Some(items) if !items.is_empty() => Ok(()),
            _ => Err(StepError::invalid_output("Tracklist not recorded")),
        }
    }
}
