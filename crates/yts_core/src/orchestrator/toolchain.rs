//! The external collaborators a batch uses.

use std::sync::Arc;

use crate::config::Settings;
use crate::download::{AudioSource, YtDlp};
use crate::separation::{separator_from_settings, StemSeparator};
use crate::split::{FfmpegRemuxer, Remuxer};
use crate::tracklist::{
    CommentTracklist, HeuristicExtractor, LlmExtractor, TracklistError, TracklistExtractor,
    TracklistProvider,
};

/// Downloader, tracklist provider, remuxer and separator for a run.
///
/// Shared read-only between batch workers; cloning only bumps reference counts.
#[derive(Clone)]
pub struct Toolchain {
    pub source: Arc<dyn AudioSource>,
    pub tracklist: Arc<dyn TracklistProvider>,
    pub remuxer: Arc<dyn Remuxer>,
    pub separator: Arc<dyn StemSeparator>,
}

impl Toolchain {
    /// Build the real tools from settings.
    ///
    /// Fails only when the LLM extractor is enabled and its HTTP client
    /// cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, TracklistError> {
        let extractor: Box<dyn TracklistExtractor> = if settings.tracklist.use_llm {
            Box::new(LlmExtractor::from_settings(&settings.tracklist)?)
        } else {
            Box::new(HeuristicExtractor::new())
        };
        tracing::debug!("Tracklist extractor: {}", extractor.name());

        Ok(Self {
            source: Arc::new(YtDlp::from_settings(&settings.download)),
            tracklist: Arc::new(CommentTracklist::new(
                &settings.download.ytdlp_bin,
                settings.tracklist.comment_scan_limit as usize,
                extractor,
            )),
            remuxer: Arc::new(FfmpegRemuxer::new(&settings.split.ffmpeg_bin)),
            separator: Arc::from(separator_from_settings(&settings.separation)),
        })
    }
}
