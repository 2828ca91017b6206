//! Source audio acquisition.
//!
//! An [`AudioSource`] turns a video URL into local audio: one file, one
//! windowed file, or a directory of per-chapter files. Failure here is fatal
//! to the batch; nothing downstream can run without the source.

mod ytdlp;

pub use ytdlp::YtDlp;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::logging::JobLogger;
use crate::models::TimeRange;
use crate::process::ToolError;

/// What to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Whole audio track.
    Full,
    /// Only the given window.
    TimeWindow(TimeRange),
    /// One file per chapter.
    Chapters,
}

/// One download request.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    /// Private directory of this source.
    pub dest_dir: &'a Path,
    /// Stable `<title>-<id>` name from [`AudioSource::describe`].
    pub base_name: &'a str,
    pub mode: FetchMode,
}

/// Local audio produced by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceAudio {
    File(PathBuf),
    Chapters { dir: PathBuf, files: Vec<PathBuf> },
}

impl SourceAudio {
    /// Every audio file, in order.
    pub fn files(&self) -> Vec<PathBuf> {
        match self {
            SourceAudio::File(path) => vec![path.clone()],
            SourceAudio::Chapters { files, .. } => files.clone(),
        }
    }

    /// The single file, when this is not a chapter split.
    pub fn file(&self) -> Option<&Path> {
        match self {
            SourceAudio::File(path) => Some(path),
            SourceAudio::Chapters { .. } => None,
        }
    }
}

/// Errors from source acquisition. All are batch-fatal.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Downloader finished but {} was not found", path.display())]
    MissingOutput { path: PathBuf },

    #[error("No chapter files were written to {}", dir.display())]
    NoChapters { dir: PathBuf },

    #[error("Could not determine a name for {url}")]
    NoName { url: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Fetches audio for a URL. Shared read-only across batch workers.
pub trait AudioSource: Send + Sync {
    /// Stable `<title>-<id>` name for the source, used for its output directory.
    fn describe(&self, url: &str, logger: Option<&JobLogger>) -> Result<String, SourceError>;

    /// Download audio into `request.dest_dir`. Blocks until done.
    fn fetch(
        &self,
        request: &FetchRequest<'_>,
        logger: Option<&JobLogger>,
    ) -> Result<SourceAudio, SourceError>;
}
