//! Spleeter 2-stems separation.

use std::fs;
use std::path::Path;
use std::process::Command;

use super::{
    cleanup_scratch, existing_stems, file_stem, move_stem, scratch_dir, SeparationError,
    StemPair, StemSeparator, STEM_EXTENSION,
};
use crate::logging::JobLogger;
use crate::process::run_tool;

/// `spleeter separate` with per-input output directories.
#[derive(Debug, Clone)]
pub struct Spleeter {
    binary: String,
}

impl Spleeter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, audio: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("separate")
            .arg("-o")
            .arg(out_dir)
            .args(["-f", "{filename}/{instrument}_{filename}.{codec}"])
            .args(["-c", STEM_EXTENSION])
            .arg(audio);
        cmd
    }
}

impl StemSeparator for Spleeter {
    fn name(&self) -> &str {
        "spleeter"
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

        let result = run_tool("spleeter", self.command(audio, &scratch), logger)
            .map_err(SeparationError::from)
            .and_then(|_| collect_output(&scratch, &stem, &pair));
        cleanup_scratch(&scratch);
        result?;

        Ok(pair)
    }
}

/// Move `vocals_<stem>` / `accompaniment_<stem>` into place.
fn collect_output(scratch: &Path, stem: &str, pair: &StemPair) -> Result<(), SeparationError> {
    let track_dir = scratch.join(stem);
    move_stem(
        &track_dir.join(format!("vocals_{}.{}", stem, STEM_EXTENSION)),
        &pair.vocals,
    )?;
    move_stem(
        &track_dir.join(format!("accompaniment_{}.{}", stem, STEM_EXTENSION)),
        &pair.instrumental,
    )?;
    Ok(())
}
