//! Download step - fetches the source audio for the batch.
//!
//! The only step whose failure can never be worked around: without local
//! audio there is nothing to split or separate.

use crate::download::{FetchMode, FetchRequest};
use crate::models::JobMode;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Fetching source.
pub struct DownloadStep;

impl DownloadStep {
    pub fn new() -> Self {
        Self
    }

    fn fetch_mode(mode: &JobMode) -> FetchMode {
        match mode {
            JobMode::Full | JobMode::Tracklist { .. } => FetchMode::Full,
            JobMode::TimeWindow(range) => FetchMode::TimeWindow(*range),
            JobMode::Chapters => FetchMode::Chapters,
        }
    }
}

impl Default for DownloadStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DownloadStep {
    fn name(&self) -> &str {
        "Download"
    }

    fn description(&self) -> &str {
        "Fetch the source audio"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.job_spec.url.trim().is_empty() {
            return Err(StepError::invalid_input("No source URL"));
        }
        if !ctx.job_dir.is_dir() {
            return Err(StepError::file_not_found(ctx.job_dir.display().to_string()));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let mode = Self::fetch_mode(&ctx.job_spec.mode);
        match mode {
            FetchMode::TimeWindow(range) => ctx
                .logger
                .info(&format!("Fetching {} (window {})", ctx.job_spec.url, range)),
            _ => ctx.logger.info(&format!(
                "Fetching {} ({})",
                ctx.job_spec.url,
                ctx.job_spec.mode.name()
            )),
        }

        let request = FetchRequest {
            url: &ctx.job_spec.url,
            dest_dir: &ctx.job_dir,
            base_name: &ctx.job_name,
            mode,
        };
        let audio = ctx.toolchain.source.fetch(&request, Some(&*ctx.logger))?;

        for file in audio.files() {
            ctx.logger.info(&format!("Source audio: {}", file.display()));
        }
        state.source = Some(audio);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Source audio not recorded"))?;
        let files = source.files();
        if files.is_empty() {
            return Err(StepError::invalid_output("Download produced no audio files"));
        }
        if let Some(missing) = files.iter().find(|f| !f.is_file()) {
            return Err(StepError::file_not_found(missing.display().to_string()));
        }
        Ok(())
    }
}
