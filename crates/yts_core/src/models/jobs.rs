//! Job-related data structures (specs, modes, results).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::JobStatus;
use super::tracks::{BatchSummary, TimedItem};
use crate::split::{format_hms, parse_timestamp, TimestampError};

/// A `[start, end)` window of the source, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_seconds: u64,
    pub end_seconds: u64,
}

impl TimeRange {
    /// Create a range; `end` must be after `start`.
    pub fn new(start_seconds: u64, end_seconds: u64) -> Result<Self, TimestampError> {
        if end_seconds <= start_seconds {
            return Err(TimestampError::EmptyRange {
                start_seconds,
                end_seconds,
            });
        }
        Ok(Self {
            start_seconds,
            end_seconds,
        })
    }

    /// Parse `START-END`, each side in any notation the timestamp parser accepts.
    ///
    /// `"1:00-2:30"`, `"60-150"` and `"1m-2m30s"` all describe the same range.
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let (start, end) = raw
            .split_once('-')
            .ok_or_else(|| TimestampError::Unparseable(raw.to_string()))?;
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// The two canonical `HH:MM:SS` strings handed to the downloader.
    pub fn to_hms_pair(&self) -> (String, String) {
        (format_hms(self.start_seconds), format_hms(self.end_seconds))
    }

    /// Compact `HHMMSS-HHMMSS` form for file names.
    pub fn file_suffix(&self) -> String {
        let (start, end) = self.to_hms_pair();
        format!("{}-{}", start.replace(':', ""), end.replace(':', ""))
    }

    pub fn duration_seconds(&self) -> u64 {
        self.end_seconds - self.start_seconds
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.to_hms_pair();
        write!(f, "{}-{}", start, end)
    }
}

/// What a job does with the downloaded audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobMode {
    /// Whole audio, then stem separation.
    Full,
    /// Only the given window, written as a single file, then stem separation.
    TimeWindow(TimeRange),
    /// One file per chapter, then stem separation per chapter.
    Chapters,
    /// Split into per-track files. `None` fetches the tracklist from comments.
    Tracklist { tracks: Option<Vec<TimedItem>> },
}

impl JobMode {
    pub fn is_tracklist(&self) -> bool {
        matches!(self, JobMode::Tracklist { .. })
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            JobMode::Full => "full",
            JobMode::TimeWindow(_) => "time window",
            JobMode::Chapters => "chapters",
            JobMode::Tracklist { .. } => "tracklist",
        }
    }
}

/// Specification for one batch (one source URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Source video URL.
    pub url: String,
    /// Processing mode.
    pub mode: JobMode,
    /// Run stem separation on the produced audio (ignored in tracklist mode).
    pub separate_stems: bool,
}

impl JobSpec {
    /// Create a job spec with stem separation enabled.
    pub fn new(url: impl Into<String>, mode: JobMode) -> Self {
        Self {
            url: url.into(),
            mode,
            separate_stems: true,
        }
    }

    /// Enable or disable stem separation.
    pub fn with_separation(mut self, separate: bool) -> Self {
        self.separate_stems = separate;
        self
    }

    /// Whether the separation step should run for this job.
    pub fn wants_separation(&self) -> bool {
        self.separate_stems && !self.mode.is_tracklist()
    }
}

/// Result of a finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Final status.
    pub status: JobStatus,
    /// Source URL.
    pub url: String,
    /// Job name (derived from the source title and id when known).
    pub name: String,
    /// Private output directory for this source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Files produced by the job (audio, stems, tracks).
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    /// Split summary (tracklist mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
    /// Error message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    /// Create a completed result.
    pub fn completed(
        url: impl Into<String>,
        name: impl Into<String>,
        output_dir: PathBuf,
        outputs: Vec<PathBuf>,
        summary: Option<BatchSummary>,
    ) -> Self {
        Self {
            status: JobStatus::Completed,
            url: url.into(),
            name: name.into(),
            output_dir: Some(output_dir),
            outputs,
            summary,
            error: None,
        }
    }

    /// Create a failed result.
    pub fn failed(url: impl Into<String>, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            url: url.into(),
            name: name.into(),
            output_dir: None,
            outputs: Vec::new(),
            summary: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
