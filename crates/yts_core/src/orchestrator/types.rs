//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::toolchain::Toolchain;
use crate::config::Settings;
use crate::download::SourceAudio;
use crate::logging::JobLogger;
use crate::models::{BatchSummary, ExtractionResult, JobSpec, ResolvedItem, Segment, TimedItem};
use crate::separation::StemPair;

/// Name of the per-track directory inside a batch directory.
pub const TRACKS_DIR: &str = "tracks";

/// Read-only context passed to pipeline steps.
///
/// Contains batch configuration and shared tools that steps can use but
/// not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Job specification (URL, mode).
    pub job_spec: JobSpec,
    /// Application settings.
    pub settings: Settings,
    /// Batch name, the stable `<title>-<id>` of the source.
    pub job_name: String,
    /// Private output directory for this source.
    pub job_dir: PathBuf,
    /// Per-batch logger.
    pub logger: Arc<JobLogger>,
    /// External tools.
    pub toolchain: Toolchain,
}

impl Context {
    /// Create a new context for a batch.
    pub fn new(
        job_spec: JobSpec,
        settings: Settings,
        job_name: impl Into<String>,
        job_dir: PathBuf,
        logger: Arc<JobLogger>,
        toolchain: Toolchain,
    ) -> Self {
        Self {
            job_spec,
            settings,
            job_name: job_name.into(),
            job_dir,
            logger,
            toolchain,
        }
    }

    /// Directory receiving split tracks.
    pub fn tracks_dir(&self) -> PathBuf {
        self.job_dir.join(TRACKS_DIR)
    }
}

/// Mutable batch state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section and written once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobState {
    /// Unique batch identifier.
    pub job_id: String,
    /// When the batch started.
    pub started_at: Option<String>,
    /// Downloaded audio (from Download step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceAudio>,
    /// Tracklist items (from Tracklist step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracklist: Option<Vec<TimedItem>>,
    /// Items with resolved start times.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Vec<ResolvedItem>>,
    /// Planned segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    /// Per-track extraction results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitOutput>,
    /// Separated stems, one pair per input file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stems: Option<Vec<StemPair>>,
}

impl JobState {
    /// Create a new batch state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn has_split(&self) -> bool {
        self.split.is_some()
    }

    /// Items skipped for lack of a usable timestamp.
    pub fn unresolved_count(&self) -> usize {
        self.resolved
            .as_ref()
            .map_or(0, |items| items.iter().filter(|r| !r.is_resolved()).count())
    }

    /// Split summary, when a tracklist split ran.
    pub fn summary(&self) -> Option<BatchSummary> {
        self.split.as_ref().map(|s| s.summary)
    }

    /// Files a batch produced, in a stable order.
    ///
    /// Split batches report their tracks (created or already present);
    /// other batches report the downloaded audio followed by any stems.
    pub fn outputs(&self) -> Vec<PathBuf> {
        if let Some(split) = &self.split {
            return split
                .results
                .iter()
                .filter(|r| !r.outcome.is_failure())
                .map(|r| r.output_path.clone())
                .collect();
        }

        let mut outputs = self
            .source
            .as_ref()
            .map(SourceAudio::files)
            .unwrap_or_default();
        for pair in self.stems.iter().flatten() {
            outputs.extend(pair.paths().iter().map(|p| p.to_path_buf()));
        }
        outputs
    }
}

/// Output from the SplitTracks step.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    /// Directory the tracks were written to.
    pub output_dir: PathBuf,
    /// One result per planned segment, in order.
    pub results: Vec<ExtractionResult>,
    pub summary: BatchSummary,
}

/// Outcome of a step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (with reason).
    Skipped(String),
}


#[cfg(test)]
pub(crate) use fixtures::test_context;
