//! Track splitting and time-window extraction.
//!
//! - [`timestamp`]: timestamp notations to seconds
//! - [`planner`]: ordered items to `[start, end)` segments
//! - [`sanitize`]: track metadata to safe, unique basenames
//! - [`extractor`]: one segment to one file via lossless remux
//! - [`batch`]: planned segments to files, with a status line per track

pub mod batch;
pub mod extractor;
pub mod planner;
pub mod sanitize;
pub mod timestamp;

pub use batch::{extract_segments, report_unresolved, skipped_line, status_line, SplitRequest};
pub use extractor::{
    partial_path, FfmpegRemuxer, RemuxError, RemuxRequest, Remuxer, SegmentExtractor,
};
pub use planner::{plan_segments, plan_segments_with_tail, DEFAULT_TAIL_SECONDS};
pub use sanitize::{sanitize_basename, BasenameAllocator};
pub use timestamp::{
    format_clock, format_hms, parse_timestamp, resolve_items, resolve_timestamp, TimestampError,
};
