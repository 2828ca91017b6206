//! Tracklists read from video comments.

use std::process::Command;

use serde::Deserialize;
use url::Url;

use super::{TracklistError, TracklistExtractor, TracklistProvider};
use crate::logging::JobLogger;
use crate::models::TimedItem;
use crate::process::run_tool_capture;

/// One comment from yt-dlp's info JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    comments: Option<Vec<Comment>>,
}

/// Comment id from the `lc` query parameter of a comment permalink.
pub fn comment_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| key == "lc" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Pick the tracklist comment.
///
/// With an id: the exact match, else the first partial match (reply ids
/// embed their parent id). Without one: the first of the first `scan_limit`
/// comments that contains a `M:SS` timestamp, else the first comment.
pub fn select_comment<'a>(
    comments: &'a [Comment],
    comment_id: Option<&str>,
    scan_limit: usize,
) -> Result<&'a Comment, TracklistError> {
    let first = comments.first().ok_or(TracklistError::NoComments)?;

    if let Some(id) = comment_id {
        return comments
            .iter()
            .find(|c| c.id == id)
            .or_else(|| {
                comments
                    .iter()
                    .find(|c| !c.id.is_empty() && (c.id.contains(id) || id.contains(&c.id)))
            })
            .ok_or_else(|| TracklistError::CommentNotFound(id.to_string()));
    }

    Ok(comments
        .iter()
        .take(scan_limit)
        .find(|c| has_clock_timestamp(&c.text))
        .unwrap_or(first))
}

/// Whether text contains `<digits>:<two digits>`.
pub(crate) fn has_clock_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b':'
            && i > 0
            && bytes[i - 1].is_ascii_digit()
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_digit)
    })
}

/// Fetches comments with yt-dlp and extracts the tracklist from one of them.
pub struct CommentTracklist {
    ytdlp_bin: String,
    scan_limit: usize,
    extractor: Box<dyn TracklistExtractor>,
}

impl CommentTracklist {
    pub fn new(
        ytdlp_bin: impl Into<String>,
        scan_limit: usize,
        extractor: Box<dyn TracklistExtractor>,
    ) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
            scan_limit,
            extractor,
        }
    }

    fn fetch_comments(
        &self,
        url: &str,
        logger: Option<&JobLogger>,
    ) -> Result<Vec<Comment>, TracklistError> {
        let mut cmd = Command::new(&self.ytdlp_bin);
        cmd.args([
            "--no-playlist",
            "--write-comments",
            "--skip-download",
            "--dump-json",
        ])
        .arg(url);

        let output = run_tool_capture("yt-dlp", cmd, logger)?;
        let info: VideoInfo = serde_json::from_str(output.stdout.trim())?;
        Ok(info.comments.unwrap_or_default())
    }
}

impl TracklistProvider for CommentTracklist {
    fn fetch(
        &self,
        url: &str,
        logger: Option<&JobLogger>,
    ) -> Result<Vec<TimedItem>, TracklistError> {
        let comment_id = comment_id_from_url(url);
        let comments = self.fetch_comments(url, logger)?;
        tracing::debug!("Fetched {} comments for {}", comments.len(), url);

        let comment = select_comment(&comments, comment_id.as_deref(), self.scan_limit)?;
        if let Some(logger) = logger {
            logger.info(&format!(
                "Using comment {} ({} of {} comments), parsing with {}",
                if comment.id.is_empty() { "<no id>" } else { comment.id.as_str() },
                comments.iter().position(|c| c == comment).map_or(0, |i| i + 1),
                comments.len(),
                self.extractor.name()
            ));
            logger.debug(&comment.text);
        }

        let tracks = self.extractor.extract(&comment.text, logger)?;
        if tracks.is_empty() {
            return Err(TracklistError::NoTracks);
        }
        Ok(tracks)
    }
}
