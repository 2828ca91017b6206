//! Separate step - splits each downloaded file into vocals and instrumental.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Runs the configured separator over every source file (one per chapter
/// in chapter mode).
pub struct SeparateStep;

impl SeparateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SeparateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SeparateStep {
    fn name(&self) -> &str {
        "Separate"
    }

    fn description(&self) -> &str {
        "Separate vocals from the instrumental"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if ctx.job_spec.mode.is_tracklist() {
            return Ok(StepOutcome::Skipped("Tracklist batches are not separated".to_string()));
        }
        if !ctx.settings.separation.enabled || !ctx.job_spec.wants_separation() {
            return Ok(StepOutcome::Skipped("Separation disabled".to_string()));
        }
        let files = state
            .source
            .as_ref()
            .map(|s| s.files())
            .ok_or_else(|| StepError::precondition_failed("No source audio recorded"))?;

        let separator = &ctx.toolchain.separator;
        let mut stems = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            ctx.logger.info(&format!(
                "[{}/{}] Separating {} with {}",
                i + 1,
                files.len(),
                file.display(),
                separator.name()
            ));
            let pair = separator.separate(file, Some(&*ctx.logger))?;
            ctx.logger.info(&format!(
                "Stems: {}, {}",
                pair.vocals.display(),
                pair.instrumental.display()
            ));
            stems.push(pair);
        }

        state.stems = Some(stems);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let stems = state
            .stems
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Stems not recorded"))?;
        for pair in stems {
            if let Some(missing) = pair.paths().into_iter().find(|p| !p.is_file()) {
                return Err(StepError::file_not_found(missing.display().to_string()));
            }
        }
        Ok(())
    }

    fn is_optional(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::SourceAudio;
    use crate::models::{JobMode, JobSpec};
    use crate::orchestrator::types::fixtures::{context_with, fake_toolchain};
    use crate::test_support::FakeSeparator;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn separates_every_chapter() {
        let dir = tempdir().unwrap();
        let separator = Arc::new(FakeSeparator::new());
        let mut tools = fake_toolchain();
        tools.separator = separator.clone();
        let ctx = context_with(
            dir.path(),
            JobSpec::new("https://example.com/watch/abc", JobMode::Chapters),
            tools,
        );

        let chapters = ctx.job_dir.join("chapters");
        fs::create_dir_all(&chapters).unwrap();
        let files = vec![chapters.join("001 - A.mp3"), chapters.join("002 - B.mp3")];
        for f in &files {
            fs::write(f, b"x").unwrap();
        }
        let mut state = JobState::new("job");
        state.source = Some(SourceAudio::Chapters {
            dir: chapters,
            files: files.clone(),
        });

        let step = SeparateStep::new();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();
        assert_eq!(separator.inputs(), files);
        assert_eq!(state.stems.unwrap().len(), 2);
    }

    #[test]
    fn skipped_when_job_disables_it() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            JobSpec::new("https://example.com/watch/abc", JobMode::Full).with_separation(false),
            fake_toolchain(),
        );
        let mut state = JobState::new("job");
        assert!(matches!(
            SeparateStep::new().execute(&ctx, &mut state).unwrap(),
            StepOutcome::Skipped(_)
        ));
    }

    #[test]
    fn skipped_when_settings_disable_it() {
        let dir = tempdir().unwrap();
        let mut ctx = context_with(
            dir.path(),
            JobSpec::new("https://example.com/watch/abc", JobMode::Full),
            fake_toolchain(),
        );
        ctx.settings.separation.enabled = false;
        let mut state = JobState::new("job");
        assert!(matches!(
            SeparateStep::new().execute(&ctx, &mut state).unwrap(),
            StepOutcome::Skipped(_)
        ));
    }
}
