//! Pipeline orchestrator for coordinating batch execution.
//!
//! This module provides the infrastructure for running multi-step
//! processing pipelines. Each batch (one source URL) is a sequence of
//! steps that validate, execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! BatchRunner (one worker per URL, capped)
//!     └── Pipeline
//!         ├── Step: Download
//!         ├── Step: Tracklist
//!         ├── Step: ResolveTimestamps
//!         ├── Step: PlanSegments
//!         ├── Step: SplitTracks
//!         ├── Step: Separate
//!         └── Step: Summarize
//! ```
//!
//! # Example
//!
//! ```ignore
//! use yts_core::orchestrator::{create_standard_pipeline, Context, JobState};
//!
//! let ctx = Context::new(job_spec, settings, "Set-abc", job_dir, logger, toolchain);
//! let mut state = JobState::new("Set-abc");
//!
//! let result = create_standard_pipeline().run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod toolchain;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use runner::BatchRunner;
pub use step::PipelineStep;
pub use steps::{
    DownloadStep, PlanSegmentsStep, ResolveTimestampsStep, SeparateStep, SplitTracksStep,
    SummarizeStep, TracklistStep,
};
pub use toolchain::Toolchain;
pub use types::{Context, JobState, SplitOutput, StepOutcome, TRACKS_DIR};

/// Create a standard pipeline with all steps in the correct order.
///
/// 1. Download - fetch the source audio (full, window or chapters)
/// 2. Tracklist - supplied tracks, or extracted from comments
/// 3. ResolveTimestamps - parse raw timestamps
/// 4. PlanSegments - one segment per resolved track
/// 5. SplitTracks - stream-copy each segment
/// 6. Separate - vocal/instrumental stems
/// 7. Summarize - final counts
///
/// Steps 2-5 only run for tracklist batches; step 6 never does.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(DownloadStep::new())
        .with_step(TracklistStep::new())
        .with_step(ResolveTimestampsStep::new())
        .with_step(PlanSegmentsStep::new())
        .with_step(SplitTracksStep::new())
        .with_step(SeparateStep::new())
        .with_step(SummarizeStep::new())
}
