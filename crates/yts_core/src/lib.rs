//! YTS Core - Backend logic for yt-spleet
//!
//! Downloads audio for a video URL, optionally cuts a time window or splits
//! by chapters, separates vocals from the instrumental, or splits a whole set
//! into per-track files from a timestamped tracklist.
//!
//! This crate contains all business logic with zero CLI dependencies.

pub mod config;
pub mod download;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod process;
pub mod separation;
pub mod split;
pub mod tracklist;

#[cfg(test)]
pub(crate) mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
