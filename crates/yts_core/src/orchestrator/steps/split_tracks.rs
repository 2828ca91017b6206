//! SplitTracks step - extracts every planned segment from the source.
//!
//! Segments are extracted one after another into `<job_dir>/tracks/`,
//! keeping the source container's extension. A failed segment is recorded
//! and the next one is attempted; this step only errors when there is no
//! single source file to cut from.

use std::fs;

use crate::models::BatchSummary;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, SplitOutput, StepOutcome};
use crate::split::{extract_segments, SegmentExtractor, SplitRequest};

pub struct SplitTracksStep;

impl SplitTracksStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SplitTracksStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SplitTracksStep {
    fn name(&self) -> &str {
        "SplitTracks"
    }

    fn description(&self) -> &str {
        "Extract each segment by stream copy"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if !ctx.job_spec.mode.is_tracklist() {
            return Ok(StepOutcome::Skipped("Not a tracklist batch".to_string()));
        }
        let source = state
            .source
            .as_ref()
            .and_then(|s| s.file())
            .ok_or_else(|| StepError::precondition_failed("No single source file to split"))?;
        let segments = state
            .segments
            .as_deref()
            .ok_or_else(|| StepError::precondition_failed("No segments planned"))?;

        let output_dir = ctx.tracks_dir();
        fs::create_dir_all(&output_dir)
            .map_err(|e| StepError::io_error("creating tracks directory", e))?;

        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let request = SplitRequest {
            source,
            output_dir: &output_dir,
            extension: &extension,
            disambiguate: ctx.settings.split.disambiguate_collisions,
        };

        let extractor = SegmentExtractor::new(ctx.toolchain.remuxer.as_ref(), Some(&*ctx.logger));
        let results = extract_segments(&extractor, &request, segments);
        let summary = BatchSummary::from_results(&results, state.unresolved_count());

        state.split = Some(SplitOutput {
            output_dir,
            results,
            summary,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let planned = state.segments.as_ref().map_or(0, Vec::len);
        match &state.split {
            Some(split) if split.results.len() == planned => Ok(()),
            Some(split) => Err(StepError::invalid_output(format!(
                "{} results for {} planned segments",
                split.results.len(),
                planned
            ))),
            None => Err(StepError::invalid_output("Split results not recorded")),
        }
    }
}
