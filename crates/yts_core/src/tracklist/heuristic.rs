//! Offline tracklist parser.
//!
//! Each line holding a clock timestamp (`M:SS`, `MM:SS`, `H:MM:SS`) becomes
//! a track. The rest of the line, minus list markers and separators, is split
//! on the first dash separator into artist and title.

use super::{TracklistError, TracklistExtractor};
use crate::logging::JobLogger;
use crate::models::TimedItem;

/// Characters trimmed around timestamps and at the edges of a title.
const SEPARATORS: &[char] = &['-', '–', '—', '|', ':', '*', '•', '>', '~'];

/// Artist/title separators, checked in this order.
const ARTIST_SEPARATORS: &[&str] = &[" - ", " – ", " — "];

/// Line-based extractor that needs no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parse every timestamped line of `text`, numbering tracks from 1.
    pub fn parse(text: &str) -> Vec<TimedItem> {
        text.lines()
            .filter_map(parse_line)
            .enumerate()
            .map(|(i, (timestamp, artist, title))| {
                TimedItem::new(i as u32 + 1, title, artist, Some(timestamp))
            })
            .collect()
    }
}

impl TracklistExtractor for HeuristicExtractor {
    fn name(&self) -> &str {
        "line parser"
    }

    fn extract(
        &self,
        text: &str,
        _logger: Option<&JobLogger>,
    ) -> Result<Vec<TimedItem>, TracklistError> {
        Ok(Self::parse(text))
    }
}

fn parse_line(line: &str) -> Option<(String, Option<String>, String)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (index, timestamp) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, token)| clock_token(token).map(|ts| (i, ts)))?;

    let rest = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, t)| *t)
        .collect::<Vec<_>>()
        .join(" ");
    let rest = strip_list_marker(&rest)
        .trim_end_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c));

    let (artist, title) = split_artist(rest);
    let title = if title.is_empty() {
        "Unknown".to_string()
    } else {
        title
    };
    Some((timestamp, artist, title))
}

/// The timestamp inside a token such as `0:00`, `[04:31]` or `(1:02:03)`.
fn clock_token(token: &str) -> Option<String> {
    let trimmed = token.trim_matches(|c: char| {
        matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | ',' | ';') || SEPARATORS.contains(&c)
    });
    let parts: Vec<&str> = trimmed.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let leading_ok = !parts[0].is_empty()
        && parts[0].len() <= 3
        && parts[0].bytes().all(|b| b.is_ascii_digit());
    let rest_ok = parts[1..]
        .iter()
        .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()));

    (leading_ok && rest_ok).then(|| trimmed.to_string())
}

/// Drop leading separators and numbering like `1.` or `02)`.
fn strip_list_marker(text: &str) -> &str {
    let is_edge = |c: char| c.is_whitespace() || SEPARATORS.contains(&c);
    let text = text.trim_start_matches(is_edge);

    let digits = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    if digits > 0 {
        let after = &text[digits..];
        if let Some(rest) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim_start_matches(is_edge);
            }
        }
    }
    text
}

fn split_artist(text: &str) -> (Option<String>, String) {
    for separator in ARTIST_SEPARATORS {
        if let Some((artist, title)) = text.split_once(separator) {
            let artist = artist.trim();
            let title = title.trim();
            if !artist.is_empty() && !title.is_empty() {
                return (Some(artist.to_string()), title.to_string());
            }
        }
    }
    (None, text.trim().to_string())
}
