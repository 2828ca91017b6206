//! User-supplied tracklist files.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::TracklistError;
use crate::models::TimedItem;

#[derive(Debug, Deserialize)]
struct FileTrack {
    #[serde(default)]
    sequence_number: Option<u32>,
    title: String,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    raw_timestamp: Option<String>,
}

/// Load a JSON array of `{sequence_number?, title, artist?, raw_timestamp?}`.
///
/// Missing sequence numbers default to the 1-based position in the file.
pub fn load_tracklist_file(path: &Path) -> Result<Vec<TimedItem>, TracklistError> {
    let content = fs::read_to_string(path).map_err(|source| TracklistError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let tracks: Vec<FileTrack> = serde_json::from_str(&content)?;
    if tracks.is_empty() {
        return Err(TracklistError::NoTracks);
    }

    Ok(tracks
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            TimedItem::new(
                t.sequence_number.unwrap_or(i as u32 + 1),
                t.title,
                t.artist,
                t.raw_timestamp,
            )
        })
        .collect())
}
