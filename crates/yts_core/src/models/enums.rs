//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Stem-separation model used to split vocals from the instrumental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparatorBackend {
    /// Demucs two-stem mode (`--two-stems vocals`).
    #[default]
    Demucs,
    /// Spleeter 2-stems model.
    Spleeter,
}

impl std::fmt::Display for SeparatorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeparatorBackend::Demucs => write!(f, "demucs"),
            SeparatorBackend::Spleeter => write!(f, "spleeter"),
        }
    }
}

/// Final status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Every step ran; per-track failures may still be listed in the summary.
    Completed,
    /// The batch aborted (source or tracklist could not be obtained, tool error).
    Failed,
}
