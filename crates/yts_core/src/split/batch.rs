//! Extracting a planned tracklist against one source file.
//!
//! Each segment is extracted one after another and its outcome recorded.
//! A failed segment never stops the batch. Tracks without a usable
//! timestamp get their own `[skipped]` line.

use std::path::{Path, PathBuf};

use super::extractor::SegmentExtractor;
use super::sanitize::{sanitize_basename, BasenameAllocator};
use super::timestamp::format_clock;
use crate::logging::JobLogger;
use crate::models::{ExtractionOutcome, ExtractionResult, ResolvedItem, Segment};

/// Where and how split tracks are written.
#[derive(Debug, Clone, Copy)]
pub struct SplitRequest<'a> {
    /// Full source audio.
    pub source: &'a Path,
    /// Directory receiving the per-track files.
    pub output_dir: &'a Path,
    /// Extension for output files (without the dot); empty for none.
    pub extension: &'a str,
    /// Append ` (2)`, ` (3)`... to colliding basenames.
    pub disambiguate: bool,
}

/// Log a `[skipped]` line for every unresolved item and return how many
/// there were.
pub fn report_unresolved(resolved: &[ResolvedItem], logger: Option<&JobLogger>) -> usize {
    let mut skipped = 0;
    for item in resolved.iter().filter(|r| !r.is_resolved()) {
        let line = skipped_line(item);
        match logger {
            Some(logger) => logger.warn(&line),
            None => tracing::warn!("{}", line),
        }
        skipped += 1;
    }
    skipped
}

/// Extract already-planned segments in order, one status line per segment.
pub fn extract_segments(
    extractor: &SegmentExtractor<'_>,
    request: &SplitRequest<'_>,
    segments: &[Segment],
) -> Vec<ExtractionResult> {
    let mut names = BasenameAllocator::new();

    segments
        .iter()
        .map(|segment| {
            let item = &segment.item.item;
            let mut basename =
                sanitize_basename(item.sequence_number, &item.title, item.artist.as_deref());
            if request.disambiguate {
                basename = names.allocate(basename);
            }
            let output_path = output_path(request, &basename);

            let outcome = extractor.extract(
                request.source,
                &output_path,
                segment.start_seconds,
                segment.end_seconds,
            );
            let result = ExtractionResult {
                segment: segment.clone(),
                output_path,
                outcome,
            };
            report(extractor, &result);
            result
        })
        .collect()
}

/// Human-readable per-track line, e.g. `[created] 001 - Intro (0:00-1:30)`.
pub fn status_line(result: &ExtractionResult) -> String {
    let name = result
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.segment.item.item.display_name());
    let line = format!(
        "[{}] {} ({}-{})",
        result.outcome.label(),
        name,
        format_clock(result.segment.start_seconds),
        format_clock(result.segment.end_seconds)
    );
    match &result.outcome {
        ExtractionOutcome::Failed(reason) => format!("{}: {}", line, reason),
        _ => line,
    }
}

/// Line for a track that produced no segment.
pub fn skipped_line(item: &ResolvedItem) -> String {
    format!(
        "[skipped] {:03} {}: no usable timestamp ({})",
        item.item.sequence_number,
        item.item.display_name(),
        item.item.raw_timestamp.as_deref().unwrap_or("missing")
    )
}

fn output_path(request: &SplitRequest<'_>, basename: &str) -> PathBuf {
    let file_name = if request.extension.is_empty() {
        basename.to_string()
    } else {
        format!("{}.{}", basename, request.extension)
    };
    request.output_dir.join(file_name)
}

fn report(extractor: &SegmentExtractor<'_>, result: &ExtractionResult) {
    let line = status_line(result);
    match (extractor.logger(), result.outcome.is_failure()) {
        (Some(logger), true) => logger.warn(&line),
        (Some(logger), false) => logger.info(&line),
        (None, true) => tracing::warn!("{}", line),
        (None, false) => tracing::info!("{}", line),
    }
}
