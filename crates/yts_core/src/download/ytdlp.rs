//! yt-dlp backed [`AudioSource`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{AudioSource, FetchMode, FetchRequest, SourceAudio, SourceError};
use crate::config::DownloadSettings;
use crate::logging::JobLogger;
use crate::process::{run_tool, run_tool_capture, ToolError};
use crate::separation::is_stem_file;

const CHAPTERS_DIR: &str = "chapters";

/// yt-dlp audio extraction with one credential-augmented retry.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    audio_format: String,
    cookies_from_browser: Option<String>,
    cookies_file: Option<String>,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>, audio_format: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            audio_format: audio_format.into(),
            cookies_from_browser: None,
            cookies_file: None,
        }
    }

    pub fn from_settings(settings: &DownloadSettings) -> Self {
        Self {
            binary: settings.ytdlp_bin.clone(),
            audio_format: settings.audio_format.clone(),
            cookies_from_browser: settings.cookies_from_browser.clone(),
            cookies_file: settings.cookies_file.clone(),
        }
    }

    pub fn with_cookies_from_browser(mut self, browser: impl Into<String>) -> Self {
        self.cookies_from_browser = Some(browser.into());
        self
    }

    pub fn with_cookies_file(mut self, path: impl Into<String>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn has_credentials(&self) -> bool {
        self.cookies_from_browser.is_some() || self.cookies_file.is_some()
    }

    fn credential_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".into());
            args.push(browser.into());
        }
        if let Some(file) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(file.into());
        }
        args
    }

    /// Path of the single output file for a non-chapter fetch.
    pub fn output_file(&self, request: &FetchRequest<'_>) -> PathBuf {
        let stem = match request.mode {
            FetchMode::TimeWindow(range) => {
                format!("{}_{}", request.base_name, range.file_suffix())
            }
            _ => request.base_name.to_string(),
        };
        request
            .dest_dir
            .join(format!("{}.{}", stem, self.audio_format))
    }

    /// Full argument list for one download attempt.
    pub fn fetch_args(&self, request: &FetchRequest<'_>, with_credentials: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-playlist".into(),
            "--newline".into(),
            "-x".into(),
            "--audio-format".into(),
            self.audio_format.as_str().into(),
        ];

        if with_credentials {
            args.extend(self.credential_args());
        }

        match request.mode {
            FetchMode::Full => {
                args.push("-o".into());
                args.push(output_template(request.dest_dir, request.base_name).into());
            }
            FetchMode::TimeWindow(range) => {
                let (start, end) = range.to_hms_pair();
                let stem = format!("{}_{}", request.base_name, range.file_suffix());
                args.push("--download-sections".into());
                args.push(format!("*{}-{}", start, end).into());
                args.push("-o".into());
                args.push(output_template(request.dest_dir, &stem).into());
            }
            FetchMode::Chapters => {
                let chapters = request.dest_dir.join(CHAPTERS_DIR);
                args.push("--split-chapters".into());
                args.push("-o".into());
                args.push(output_template(request.dest_dir, request.base_name).into());
                args.push("-o".into());
                args.push(
                    format!(
                        "chapter:{}",
                        chapters
                            .join("%(section_number)03d - %(section_title)s.%(ext)s")
                            .display()
                    )
                    .into(),
                );
            }
        }

        args.push(request.url.into());
        args
    }

    /// Run a download attempt, retrying once with credentials when configured.
    fn run_with_retry(
        &self,
        request: &FetchRequest<'_>,
        logger: Option<&JobLogger>,
    ) -> Result<(), ToolError> {
        let attempt = |with_credentials: bool| {
            let mut cmd = Command::new(&self.binary);
            cmd.args(self.fetch_args(request, with_credentials));
            run_tool("yt-dlp", cmd, logger).map(|_| ())
        };

        match attempt(false) {
            Ok(()) => Ok(()),
            Err(e) if self.has_credentials() => {
                let message = format!("Download failed ({}), retrying with credentials", e.tool());
                tracing::warn!("{}: {}", message, request.url);
                if let Some(logger) = logger {
                    logger.warn(&message);
                }
                attempt(true)
            }
            Err(e) => Err(e),
        }
    }
}

impl AudioSource for YtDlp {
    fn describe(&self, url: &str, logger: Option<&JobLogger>) -> Result<String, SourceError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--no-playlist", "--skip-download", "--print", "%(title)s-%(id)s"])
            .arg(url);

        let output = match run_tool_capture("yt-dlp", cmd, logger) {
            Ok(output) => output,
            Err(e) if self.has_credentials() => {
                tracing::warn!("Probe failed ({}), retrying with credentials", e);
                let mut cmd = Command::new(&self.binary);
                cmd.args(["--no-playlist", "--skip-download", "--print", "%(title)s-%(id)s"])
                    .args(self.credential_args())
                    .arg(url);
                run_tool_capture("yt-dlp", cmd, logger)?
            }
            Err(e) => return Err(e.into()),
        };

        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SourceError::NoName {
                url: url.to_string(),
            })
    }

    fn fetch(
        &self,
        request: &FetchRequest<'_>,
        logger: Option<&JobLogger>,
    ) -> Result<SourceAudio, SourceError> {
        fs::create_dir_all(request.dest_dir)?;

        if request.mode == FetchMode::Chapters {
            self.run_with_retry(request, logger)?;
            let dir = request.dest_dir.join(CHAPTERS_DIR);
            let files = list_audio_files(&dir)?;
            if files.is_empty() {
                return Err(SourceError::NoChapters { dir });
            }
            return Ok(SourceAudio::Chapters { dir, files });
        }

        let output = self.output_file(request);
        if output.exists() {
            let message = format!("Reusing existing download {}", output.display());
            tracing::info!("{}", message);
            if let Some(logger) = logger {
                logger.info(&message);
            }
            return Ok(SourceAudio::File(output));
        }

        self.run_with_retry(request, logger)?;

        if !output.exists() {
            return Err(SourceError::MissingOutput { path: output });
        }
        Ok(SourceAudio::File(output))
    }
}

/// `<dir>/<stem>.%(ext)s`; yt-dlp substitutes the final extension.
fn output_template(dir: &Path, stem: &str) -> String {
    dir.join(format!("{}.%(ext)s", escape_template(stem)))
        .display()
        .to_string()
}

/// `%` starts a yt-dlp template field; literal names must double it.
fn escape_template(name: &str) -> String {
    name.replace('%', "%%")
}

/// Regular, non-hidden files of a directory sorted by name. Stems written
/// by an earlier run share the directory and are left out.
fn list_audio_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if path.is_file() && !hidden && !is_stem_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
