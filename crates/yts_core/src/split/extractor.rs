//! Lossless segment extraction.
//!
//! A [`SegmentExtractor`] turns one segment into one file through a
//! [`Remuxer`] (ffmpeg stream copy in production). The final path's existence
//! is the completion signal: the remuxer writes to a hidden `.partial` sibling
//! that is renamed into place only after a successful run, so a failed or
//! interrupted extraction never leaves a file at the final path.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::logging::JobLogger;
use crate::models::{ExtractionFailure, ExtractionOutcome};
use crate::process::{run_tool, ToolError};

/// One stream-copy request.
#[derive(Debug, Clone, Copy)]
pub struct RemuxRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub start_seconds: u64,
    pub duration_seconds: u64,
}

/// Error from a remux run.
#[derive(Error, Debug)]
pub enum RemuxError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The tool exited cleanly but wrote nothing.
    #[error("{tool} exited successfully but produced no output at {}", path.display())]
    EmptyOutput { tool: String, path: PathBuf },
}

impl RemuxError {
    fn into_failure(self) -> ExtractionFailure {
        match self {
            RemuxError::Tool(e) => ExtractionFailure::ToolFailure {
                tool: e.tool().to_string(),
                exit_code: e.exit_code(),
                diagnostic: e.diagnostic(),
            },
            RemuxError::EmptyOutput { tool, .. } => ExtractionFailure::ToolFailure {
                tool,
                exit_code: Some(0),
                diagnostic: "no output written".to_string(),
            },
        }
    }
}

/// Copies a time range of a media file without re-encoding.
pub trait Remuxer: Send + Sync {
    /// Tool name for logs and failure records.
    fn name(&self) -> &str;

    /// Write `request.output`. Blocks until the tool exits.
    fn remux(&self, request: &RemuxRequest<'_>, logger: Option<&JobLogger>)
        -> Result<(), RemuxError>;
}

/// ffmpeg-backed stream copy.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    binary: String,
}

impl FfmpegRemuxer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments for one stream copy. Audio streams only, no re-encode.
    pub fn remux_args(request: &RemuxRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push("-ss".into());
        args.push(request.start_seconds.to_string().into());
        args.push("-i".into());
        args.push(request.source.into());
        args.push("-t".into());
        args.push(request.duration_seconds.to_string().into());
        for arg in ["-map", "0:a", "-c", "copy"] {
            args.push(arg.into());
        }
        args.push(request.output.into());
        args
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Remuxer for FfmpegRemuxer {
    fn name(&self) -> &str {
        &self.binary
    }

    fn remux(
        &self,
        request: &RemuxRequest<'_>,
        logger: Option<&JobLogger>,
    ) -> Result<(), RemuxError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::remux_args(request));
        run_tool("ffmpeg", cmd, logger)?;
        Ok(())
    }
}

/// Extracts segments from one source file, idempotently per output path.
pub struct SegmentExtractor<'a> {
    remuxer: &'a dyn Remuxer,
    logger: Option<&'a JobLogger>,
}

impl<'a> SegmentExtractor<'a> {
    pub fn new(remuxer: &'a dyn Remuxer, logger: Option<&'a JobLogger>) -> Self {
        Self { remuxer, logger }
    }

    pub fn logger(&self) -> Option<&'a JobLogger> {
        self.logger
    }

    /// Extract `[start_seconds, end_seconds)` of `source` into `output`.
    ///
    /// A zero or negative range fails without invoking the remuxer. An
    /// existing `output` is left untouched and reported as already existing.
    pub fn extract(
        &self,
        source: &Path,
        output: &Path,
        start_seconds: u64,
        end_seconds: u64,
    ) -> ExtractionOutcome {
        let duration_seconds = match end_seconds.checked_sub(start_seconds) {
            Some(d) if d > 0 => d,
            _ => {
                return ExtractionOutcome::Failed(ExtractionFailure::DegenerateSegment {
                    start_seconds,
                    end_seconds,
                })
            }
        };

        if output.exists() {
            return ExtractionOutcome::AlreadyExisted;
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                return io_failure("create output directory", e);
            }
        }

        let partial = partial_path(output);
        if partial.exists() {
            tracing::debug!("Removing stale partial file {}", partial.display());
            let _ = fs::remove_file(&partial);
        }

        let request = RemuxRequest {
            source,
            output: &partial,
            start_seconds,
            duration_seconds,
        };

        let result = self
            .remuxer
            .remux(&request, self.logger)
            .and_then(|()| match fs::metadata(&partial) {
                Ok(meta) if meta.len() > 0 => Ok(()),
                _ => Err(RemuxError::EmptyOutput {
                    tool: self.remuxer.name().to_string(),
                    path: partial.clone(),
                }),
            });

        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return ExtractionOutcome::Failed(e.into_failure());
        }

        if let Err(e) = fs::rename(&partial, output) {
            let _ = fs::remove_file(&partial);
            return io_failure("rename partial output", e);
        }

        ExtractionOutcome::Created
    }
}

fn io_failure(operation: &str, error: std::io::Error) -> ExtractionOutcome {
    ExtractionOutcome::Failed(ExtractionFailure::Io {
        operation: operation.to_string(),
        message: error.to_string(),
    })
}

/// Hidden sibling the remuxer writes to: `dir/.name.partial.ext`.
///
/// The real extension is kept last so the tool still infers the container.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!(".{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.partial", stem),
    };
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemuxer;
    use tempfile::tempdir;

    #[test]
    fn creates_output_via_partial_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("set.mp3");
        fs::write(&source, b"source").unwrap();
        let output = dir.path().join("tracks").join("001 - Intro.mp3");

        let remuxer = FakeRemuxer::new();
        let extractor = SegmentExtractor::new(&remuxer, None);
        let outcome = extractor.extract(&source, &output, 0, 90);

        assert_eq!(outcome, ExtractionOutcome::Created);
        assert!(output.exists());
        assert!(!partial_path(&output).exists());
        let calls = remuxer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].start_seconds, 0);
        assert_eq!(calls[0].duration_seconds, 90);
        assert_eq!(calls[0].output, partial_path(&output));
    }

    #[test]
    fn second_run_reports_already_existed() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("set.mp3");
        let output = dir.path().join("001 - Intro.mp3");

        let remuxer = FakeRemuxer::new();
        let extractor = SegmentExtractor::new(&remuxer, None);
        assert_eq!(
            extractor.extract(&source, &output, 0, 90),
            ExtractionOutcome::Created
        );
        let first = fs::read(&output).unwrap();

        assert_eq!(
            extractor.extract(&source, &output, 0, 90),
            ExtractionOutcome::AlreadyExisted
        );
        assert_eq!(fs::read(&output).unwrap(), first);
        assert_eq!(remuxer.call_count(), 1);
    }

    #[test]
    fn zero_duration_never_invokes_tool() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("002 - Same.mp3");
        let remuxer = FakeRemuxer::new();
        let extractor = SegmentExtractor::new(&remuxer, None);

        let outcome = extractor.extract(Path::new("set.mp3"), &output, 90, 90);
        assert_eq!(
            outcome,
            ExtractionOutcome::Failed(ExtractionFailure::DegenerateSegment {
                start_seconds: 90,
                end_seconds: 90
            })
        );
        assert!(extractor
            .extract(Path::new("set.mp3"), &output, 300, 90)
            .is_failure());
        assert_eq!(remuxer.call_count(), 0);
        assert!(!output.exists());
    }

    #[test]
    fn degenerate_check_runs_before_existence_check() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("003 - Exists.mp3");
        fs::write(&output, b"done").unwrap();
        let remuxer = FakeRemuxer::new();
        let extractor = SegmentExtractor::new(&remuxer, None);

        assert!(extractor
            .extract(Path::new("set.mp3"), &output, 10, 10)
            .is_failure());
    }

    #[test]
    fn tool_failure_leaves_no_file_behind() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("004 - Broken.mp3");
        let remuxer = FakeRemuxer::failing(1, "Invalid data found when processing input");
        let extractor = SegmentExtractor::new(&remuxer, None);

        match extractor.extract(Path::new("set.mp3"), &output, 0, 60) {
            ExtractionOutcome::Failed(ExtractionFailure::ToolFailure {
                exit_code,
                diagnostic,
                ..
            }) => {
                assert_eq!(exit_code, Some(1));
                assert!(diagnostic.contains("Invalid data"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[test]
    fn empty_output_is_a_failure() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("005 - Empty.mp3");
        let remuxer = FakeRemuxer::writing(b"");
        let extractor = SegmentExtractor::new(&remuxer, None);

        assert!(extractor
            .extract(Path::new("set.mp3"), &output, 0, 60)
            .is_failure());
        assert!(!output.exists());
    }

    #[test]
    fn partial_path_keeps_extension_last() {
        assert_eq!(
            partial_path(Path::new("/out/001 - A.mp3")),
            PathBuf::from("/out/.001 - A.partial.mp3")
        );
        assert_eq!(
            partial_path(Path::new("/out/raw")),
            PathBuf::from("/out/.raw.partial")
        );
    }

    #[test]
    fn ffmpeg_args_stream_copy() {
        let request = RemuxRequest {
            source: Path::new("in.m4a"),
            output: Path::new("out.m4a"),
            start_seconds: 90,
            duration_seconds: 210,
        };
        let args: Vec<String> = FfmpegRemuxer::remux_args(&request)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 90 -i in.m4a -t 210"));
        assert!(joined.contains("-c copy"));
        assert_eq!(args.last().map(String::as_str), Some("out.m4a"));
    }
}
