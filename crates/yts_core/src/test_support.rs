//! In-process stand-ins for the external tools, shared by unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::download::{AudioSource, FetchMode, FetchRequest, SourceAudio, SourceError};
use crate::logging::JobLogger;
use crate::models::TimedItem;
use crate::process::ToolError;
use crate::separation::{SeparationError, StemPair, StemSeparator};
use crate::split::{RemuxError, RemuxRequest, Remuxer};
use crate::tracklist::{TracklistError, TracklistProvider};

/// One recorded remux invocation.
#[derive(Debug, Clone)]
pub struct RemuxCall {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_seconds: u64,
    pub duration_seconds: u64,
}

enum RemuxBehavior {
    Write(Vec<u8>),
    Fail { exit_code: i32, stderr: String },
}

/// Remuxer that writes fixed bytes (or fails) and records every call.
pub struct FakeRemuxer {
    behavior: RemuxBehavior,
    calls: Mutex<Vec<RemuxCall>>,
}

impl FakeRemuxer {
    pub fn new() -> Self {
        Self::writing(b"audio")
    }

    pub fn writing(bytes: &[u8]) -> Self {
        Self {
            behavior: RemuxBehavior::Write(bytes.to_vec()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(exit_code: i32, stderr: &str) -> Self {
        Self {
            behavior: RemuxBehavior::Fail {
                exit_code,
                stderr: stderr.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RemuxCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Remuxer for FakeRemuxer {
    fn name(&self) -> &str {
        "fake-ffmpeg"
    }

    fn remux(
        &self,
        request: &RemuxRequest<'_>,
        _logger: Option<&JobLogger>,
    ) -> Result<(), RemuxError> {
        self.calls.lock().push(RemuxCall {
            source: request.source.to_path_buf(),
            output: request.output.to_path_buf(),
            start_seconds: request.start_seconds,
            duration_seconds: request.duration_seconds,
        });

        match &self.behavior {
            RemuxBehavior::Write(bytes) => {
                fs::write(request.output, bytes).map_err(|source| ToolError::Spawn {
                    tool: self.name().to_string(),
                    source,
                })?;
                Ok(())
            }
            RemuxBehavior::Fail { exit_code, stderr } => Err(ToolError::Failed {
                tool: self.name().to_string(),
                exit_code: Some(*exit_code),
                stderr: stderr.clone(),
            }
            .into()),
        }
    }
}

/// Audio source that writes placeholder files instead of downloading.
///
/// URLs containing `fail` fail both `describe` and `fetch`. The name is the
/// last path segment of the URL, prefixed with `Video-`.
pub struct ScriptedSource {
    chapters: Vec<String>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::with_chapters(&["Opening", "Middle", "Closing"])
    }

    pub fn with_chapters(chapters: &[&str]) -> Self {
        Self {
            chapters: chapters.iter().map(|c| c.to_string()).collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(url: &str) -> Result<(), SourceError> {
        if url.contains("fail") {
            return Err(ToolError::Failed {
                tool: "yt-dlp".to_string(),
                exit_code: Some(1),
                stderr: "ERROR: Video unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl AudioSource for ScriptedSource {
    fn describe(&self, url: &str, _logger: Option<&JobLogger>) -> Result<String, SourceError> {
        Self::check(url)?;
        let id = url.rsplit('/').next().unwrap_or(url);
        Ok(format!("Video-{}", id))
    }

    fn fetch(
        &self,
        request: &FetchRequest<'_>,
        _logger: Option<&JobLogger>,
    ) -> Result<SourceAudio, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Self::check(request.url)?;
        fs::create_dir_all(request.dest_dir)?;

        match request.mode {
            FetchMode::Chapters => {
                let dir = request.dest_dir.join("chapters");
                fs::create_dir_all(&dir)?;
                let mut files = Vec::new();
                for (i, title) in self.chapters.iter().enumerate() {
                    let path = dir.join(format!("{:03} - {}.mp3", i + 1, title));
                    fs::write(&path, b"chapter")?;
                    files.push(path);
                }
                Ok(SourceAudio::Chapters { dir, files })
            }
            FetchMode::TimeWindow(range) => {
                let path = request.dest_dir.join(format!(
                    "{}_{}.mp3",
                    request.base_name,
                    range.file_suffix()
                ));
                fs::write(&path, b"window")?;
                Ok(SourceAudio::File(path))
            }
            FetchMode::Full => {
                let path = request.dest_dir.join(format!("{}.mp3", request.base_name));
                fs::write(&path, b"full")?;
                Ok(SourceAudio::File(path))
            }
        }
    }
}

/// Tracklist provider returning canned tracks, or `NoComments` when empty.
pub struct FakeTracklist {
    tracks: Vec<TimedItem>,
}

impl FakeTracklist {
    pub fn new(tracks: Vec<TimedItem>) -> Self {
        Self { tracks }
    }

    pub fn empty() -> Self {
        Self { tracks: Vec::new() }
    }
}

impl TracklistProvider for FakeTracklist {
    fn fetch(&self, _url: &str, _logger: Option<&JobLogger>) -> Result<Vec<TimedItem>, TracklistError> {
        if self.tracks.is_empty() {
            return Err(TracklistError::NoComments);
        }
        Ok(self.tracks.clone())
    }
}

/// Separator that writes both stems immediately.
pub struct FakeSeparator {
    inputs: Mutex<Vec<PathBuf>>,
}

impl FakeSeparator {
    pub fn new() -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<PathBuf> {
        self.inputs.lock().clone()
    }
}

impl StemSeparator for FakeSeparator {
    fn name(&self) -> &str {
        "fake-demucs"
    }

    fn separate(
        &self,
        audio: &Path,
        _logger: Option<&JobLogger>,
    ) -> Result<StemPair, SeparationError> {
        self.inputs.lock().push(audio.to_path_buf());
        let pair = StemPair::for_input(audio)?;
        fs::write(&pair.vocals, b"vox")?;
        fs::write(&pair.instrumental, b"acc")?;
        Ok(pair)
    }
}
