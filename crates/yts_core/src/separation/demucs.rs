//! Demucs two-stem separation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{
    cleanup_scratch, existing_stems, file_stem, move_stem, scratch_dir, SeparationError,
    StemPair, StemSeparator,
};
use crate::logging::JobLogger;
use crate::process::run_tool;

/// Default model directory name under `--out`.
const MODEL_DIR: &str = "htdemucs";

/// `python -m demucs --two-stems vocals`.
#[derive(Debug, Clone)]
pub struct Demucs {
    python_bin: String,
}

impl Demucs {
    pub fn new(python_bin: impl Into<String>) -> Self {
        Self {
            python_bin: python_bin.into(),
        }
    }

    fn command(&self, audio: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.python_bin);
        cmd.args(["-m", "demucs", "--out"])
            .arg(out_dir)
            .args(["--mp3", "--two-stems", "vocals"])
            .arg(audio);
        cmd
    }
}

impl StemSeparator for Demucs {
    fn name(&self) -> &str {
        "demucs"
    }

    fn separate(
        &self,
        audio: &Path,
        logger: Option<&JobLogger>,
    ) -> Result<StemPair, SeparationError> {
        let (pair, exists) = existing_stems(audio, self.name(), logger)?;
        if exists {
            return Ok(pair);
        }

        let stem = file_stem(audio)?;
        let scratch = scratch_dir(audio, self.name());
        fs::create_dir_all(&scratch)?;

        let result = run_tool("demucs", self.command(audio, &scratch), logger)
            .map_err(SeparationError::from)
            .and_then(|_| collect_output(&scratch, &stem, &pair, logger));
        cleanup_scratch(&scratch);
        result?;

        Ok(pair)
    }
}

/// Move `vocals.mp3` / `no_vocals.mp3` from the model's track directory.
fn collect_output(
    scratch: &Path,
    stem: &str,
    pair: &StemPair,
    logger: Option<&JobLogger>,
) -> Result<(), SeparationError> {
    let expected = scratch.join(MODEL_DIR).join(stem);
    let track_dir = if expected.is_dir() {
        expected
    } else {
        let found = find_dir_named(scratch, stem).ok_or(SeparationError::MissingStem {
            path: expected.clone(),
        })?;
        let message = format!("Using demucs output directory {}", found.display());
        tracing::debug!("{}", message);
        if let Some(logger) = logger {
            logger.debug(&message);
        }
        found
    };

    move_stem(&track_dir.join("vocals.mp3"), &pair.vocals)?;
    move_stem(&track_dir.join("no_vocals.mp3"), &pair.instrumental)?;
    Ok(())
}

/// Depth-first search for a directory with the given name.
fn find_dir_named(root: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    for dir in &dirs {
        if dir.file_name().is_some_and(|n| n == name) {
            return Some(dir.clone());
        }
    }
    dirs.iter().find_map(|dir| find_dir_named(dir, name))
}
