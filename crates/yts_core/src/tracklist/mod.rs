//! Tracklist acquisition.
//!
//! A [`TracklistProvider`] produces the ordered `(sequence, title, artist,
//! raw timestamp)` list for a URL. The production provider reads the video's
//! comments with yt-dlp, picks the tracklist comment and hands its text to a
//! [`TracklistExtractor`] (an LLM, or an offline line parser).
//!
//! Raw timestamps are always passed through verbatim; seconds are computed
//! later by the timestamp parser.

mod comments;
mod file;
mod heuristic;
mod llm;

pub use comments::{comment_id_from_url, select_comment, Comment, CommentTracklist};
pub use file::load_tracklist_file;
pub use heuristic::HeuristicExtractor;
pub use llm::LlmExtractor;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::logging::JobLogger;
use crate::models::TimedItem;
use crate::process::ToolError;

/// Errors from tracklist acquisition. All are batch-fatal.
#[derive(Error, Debug)]
pub enum TracklistError {
    #[error("Failed to fetch comments: {0}")]
    Fetch(#[from] ToolError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Comment {0} not found in video comments")]
    CommentNotFound(String),

    #[error("No comments found on this video")]
    NoComments,

    #[error("No tracks found in the tracklist text")]
    NoTracks,

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("LLM response had no content")]
    EmptyResponse,

    #[error("Failed to read tracklist file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Turns free-form tracklist text into ordered items.
pub trait TracklistExtractor: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    fn extract(&self, text: &str, logger: Option<&JobLogger>)
        -> Result<Vec<TimedItem>, TracklistError>;
}

/// Produces the tracklist of a URL. Shared read-only across batch workers.
pub trait TracklistProvider: Send + Sync {
    fn fetch(&self, url: &str, logger: Option<&JobLogger>)
        -> Result<Vec<TimedItem>, TracklistError>;
}
