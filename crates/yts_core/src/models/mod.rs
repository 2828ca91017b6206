//! Data models for yt-spleet.
//!
//! This module contains the core data structures used throughout the crate:
//! - Enums for separator backends and job status
//! - Track structures (timed items, resolved items, segments, results)
//! - Job structures (specs, modes, results)

mod enums;
mod jobs;
mod tracks;

// Re-export all public types
pub use enums::{JobStatus, SeparatorBackend};
pub use jobs::{JobMode, JobResult, JobSpec, TimeRange};
pub use tracks::{
    BatchSummary, ExtractionFailure, ExtractionOutcome, ExtractionResult, ResolvedItem, Segment,
    TimedItem,
};
