//! Track-level data structures (timed items, segments, extraction results).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of an ordered tracklist, as supplied by the caller.
///
/// `sequence_number` is not required to be unique or contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedItem {
    /// Position label used for the output filename.
    pub sequence_number: u32,
    /// Track title.
    pub title: String,
    /// Artist, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Timestamp exactly as written in the source notation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_timestamp: Option<String>,
}

impl TimedItem {
    /// Create a new item.
    pub fn new(
        sequence_number: u32,
        title: impl Into<String>,
        artist: Option<String>,
        raw_timestamp: Option<String>,
    ) -> Self {
        Self {
            sequence_number,
            title: title.into(),
            artist,
            raw_timestamp,
        }
    }

    /// Human-readable label for log lines ("Artist - Title" or "Title").
    pub fn display_name(&self) -> String {
        match self.artist.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(artist) => format!("{} - {}", artist, self.title),
            None => self.title.clone(),
        }
    }
}

/// A `TimedItem` after timestamp resolution.
///
/// `resolved_seconds` is `None` when the raw timestamp was absent or did not
/// match any known notation. Zero is a valid resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub item: TimedItem,
    pub resolved_seconds: Option<u64>,
}

impl ResolvedItem {
    pub fn new(item: TimedItem, resolved_seconds: Option<u64>) -> Self {
        Self {
            item,
            resolved_seconds,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_seconds.is_some()
    }
}

/// A contiguous time range of the source to extract into its own file.
///
/// `end_seconds` is normally greater than `start_seconds`; the planner keeps
/// degenerate ranges (equal or out-of-order timestamps) and the extractor
/// rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub item: ResolvedItem,
    pub start_seconds: u64,
    pub end_seconds: u64,
}

impl Segment {
    /// Duration in seconds, or `None` for a zero or negative range.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.end_seconds
            .checked_sub(self.start_seconds)
            .filter(|d| *d > 0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.duration_seconds().is_none()
    }
}

/// Why a single segment extraction failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionFailure {
    /// Requested duration was zero or negative; the tool was not invoked.
    #[error("zero-duration segment ({start_seconds}s to {end_seconds}s)")]
    DegenerateSegment { start_seconds: u64, end_seconds: u64 },

    /// The remux tool could not be run or exited non-zero.
    #[error("{tool} failed (exit code {exit_code:?}): {diagnostic}")]
    ToolFailure {
        tool: String,
        exit_code: Option<i32>,
        diagnostic: String,
    },

    /// Filesystem error around the output file.
    #[error("I/O error in {operation}: {message}")]
    Io { operation: String, message: String },
}

/// Per-segment outcome. Created once per segment per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Created,
    AlreadyExisted,
    Failed(ExtractionFailure),
}

impl ExtractionOutcome {
    /// Short tag used in per-track status lines.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Created => "created",
            ExtractionOutcome::AlreadyExisted => "exists",
            ExtractionOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed(_))
    }
}

/// Result of extracting one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub segment: Segment,
    pub output_path: PathBuf,
    pub outcome: ExtractionOutcome,
}

/// Aggregate counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
    /// Tracks with no resolvable timestamp.
    pub skipped: usize,
}

impl BatchSummary {
    /// Count outcomes from a set of results plus the number of unresolved tracks.
    pub fn from_results(results: &[ExtractionResult], skipped: usize) -> Self {
        let mut summary = Self {
            skipped,
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                ExtractionOutcome::Created => summary.created += 1,
                ExtractionOutcome::AlreadyExisted => summary.already_existed += 1,
                ExtractionOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Number of segment files present after the run.
    pub fn succeeded(&self) -> usize {
        self.created + self.already_existed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {}, already existed: {}, failed: {}, skipped: {}",
            self.created, self.already_existed, self.failed, self.skipped
        )
    }
}
