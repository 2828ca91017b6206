//! Vocal/instrumental stem separation.
//!
//! A [`StemSeparator`] writes two files next to its input:
//! `yts-vox_<stem>.mp3` (vocals) and `yts-acc_<stem>.mp3` (instrumental).
//! When both already exist the model is not run again.

mod demucs;
mod spleeter;

pub use demucs::Demucs;
pub use spleeter::Spleeter;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::SeparationSettings;
use crate::logging::JobLogger;
use crate::models::SeparatorBackend;
use crate::process::ToolError;

/// Both backends are asked for MP3 output.
pub const STEM_EXTENSION: &str = "mp3";

pub const VOCALS_PREFIX: &str = "yts-vox_";
pub const INSTRUMENTAL_PREFIX: &str = "yts-acc_";

/// True for a file this module wrote, judged by its name prefix.
pub fn is_stem_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|n| n.starts_with(VOCALS_PREFIX) || n.starts_with(INSTRUMENTAL_PREFIX))
}

/// The two files produced for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StemPair {
    pub vocals: PathBuf,
    pub instrumental: PathBuf,
}

impl StemPair {
    /// Final stem paths for `audio`.
    pub fn for_input(audio: &Path) -> Result<Self, SeparationError> {
        let stem = file_stem(audio)?;
        let dir = audio.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            vocals: dir.join(format!("{}{}.{}", VOCALS_PREFIX, stem, STEM_EXTENSION)),
            instrumental: dir.join(format!("{}{}.{}", INSTRUMENTAL_PREFIX, stem, STEM_EXTENSION)),
        })
    }

    pub fn exists(&self) -> bool {
        self.vocals.exists() && self.instrumental.exists()
    }

    pub fn paths(&self) -> [&Path; 2] {
        [&self.vocals, &self.instrumental]
    }
}

/// Errors from stem separation.
#[derive(Error, Debug)]
pub enum SeparationError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Input has no usable file name: {}", path.display())]
    InvalidInput { path: PathBuf },

    #[error("Expected stem not found after separation: {}", path.display())]
    MissingStem { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Splits a mixed track into vocals and instrumental.
pub trait StemSeparator: Send + Sync {
    /// Model name for logs.
    fn name(&self) -> &str;

    /// Separate `audio`, blocking until the model finishes.
    fn separate(&self, audio: &Path, logger: Option<&JobLogger>)
        -> Result<StemPair, SeparationError>;
}

/// Build the configured separator.
pub fn separator_from_settings(settings: &SeparationSettings) -> Box<dyn StemSeparator> {
    match settings.backend {
        SeparatorBackend::Demucs => Box::new(Demucs::new(&settings.python_bin)),
        SeparatorBackend::Spleeter => Box::new(Spleeter::new(&settings.spleeter_bin)),
    }
}

/// Return the existing pair when both stems are already present.
fn existing_stems(
    audio: &Path,
    model: &str,
    logger: Option<&JobLogger>,
) -> Result<(StemPair, bool), SeparationError> {
    let pair = StemPair::for_input(audio)?;
    let exists = pair.exists();
    if exists {
        let message = format!(
            "Stems for {} already exist, skipping {}",
            audio.display(),
            model
        );
        tracing::info!("{}", message);
        if let Some(logger) = logger {
            logger.info(&message);
        }
    }
    Ok((pair, exists))
}

/// Scratch directory for a model run, next to the input.
fn scratch_dir(audio: &Path, model: &str) -> PathBuf {
    let dir = audio.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!(".yts-{}", model))
}

fn file_stem(audio: &Path) -> Result<String, SeparationError> {
    audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SeparationError::InvalidInput {
            path: audio.to_path_buf(),
        })
}

/// Move a produced stem into place (copy + remove across filesystems).
fn move_stem(from: &Path, to: &Path) -> Result<(), SeparationError> {
    if !from.is_file() {
        return Err(SeparationError::MissingStem {
            path: from.to_path_buf(),
        });
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Best-effort removal of a scratch directory.
fn cleanup_scratch(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::debug!("Could not remove {}: {}", dir.display(), e);
        }
    }
}
