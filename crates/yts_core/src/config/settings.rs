//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::SeparatorBackend;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Output and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// yt-dlp invocation.
    #[serde(default)]
    pub download: DownloadSettings,

    /// Track splitting.
    #[serde(default)]
    pub split: SplitSettings,

    /// Stem separation.
    #[serde(default)]
    pub separation: SeparationSettings,

    /// Tracklist acquisition.
    #[serde(default)]
    pub tracklist: TracklistSettings,

    /// Multi-URL batch runner.
    #[serde(default)]
    pub runner: RunnerSettings,
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder; each source URL gets its own subdirectory.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "yts_output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Keep raw tool output out of the log unless a tool fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with the time of day.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Downloader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// yt-dlp executable.
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,

    /// Audio format passed to `--audio-format`.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Browser to read cookies from on the credential retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_from_browser: Option<String>,

    /// Netscape cookies file used on the credential retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<String>,
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            ytdlp_bin: default_ytdlp_bin(),
            audio_format: default_audio_format(),
            cookies_from_browser: None,
            cookies_file: None,
        }
    }
}

impl DownloadSettings {
    /// Whether a credential-augmented retry is possible.
    pub fn has_credentials(&self) -> bool {
        self.cookies_from_browser.is_some() || self.cookies_file.is_some()
    }
}

/// Track splitting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSettings {
    /// ffmpeg executable used for stream copy.
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// Length of the last track, in seconds.
    #[serde(default = "default_tail_seconds")]
    pub tail_seconds: u64,

    /// Suffix colliding basenames with ` (2)`, ` (3)`...
    #[serde(default = "default_true")]
    pub disambiguate_collisions: bool,
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_tail_seconds() -> u64 {
    crate::split::DEFAULT_TAIL_SECONDS
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg_bin(),
            tail_seconds: default_tail_seconds(),
            disambiguate_collisions: true,
        }
    }
}

/// Stem separation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationSettings {
    /// Run separation unless a job disables it.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model used.
    #[serde(default)]
    pub backend: SeparatorBackend,

    /// Python interpreter with demucs installed.
    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    /// spleeter executable.
    #[serde(default = "default_spleeter_bin")]
    pub spleeter_bin: String,
}

fn default_python_bin() -> String {
    "python3".to_string()
}

fn default_spleeter_bin() -> String {
    "spleeter".to_string()
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: SeparatorBackend::default(),
            python_bin: default_python_bin(),
            spleeter_bin: default_spleeter_bin(),
        }
    }
}

/// Tracklist acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracklistSettings {
    /// Use the LLM extractor; otherwise the offline line parser.
    #[serde(default = "default_true")]
    pub use_llm: bool,

    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Comments searched for a timestamped tracklist when no comment id is given.
    #[serde(default = "default_comment_scan_limit")]
    pub comment_scan_limit: u32,
}

fn default_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_comment_scan_limit() -> u32 {
    20
}

impl Default for TracklistSettings {
    fn default() -> Self {
        Self {
            use_llm: true,
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            comment_scan_limit: default_comment_scan_limit(),
        }
    }
}

/// Batch runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Upper bound on URLs processed at once.
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: u32,
}

fn default_max_parallel_jobs() -> u32 {
    4
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_parallel_jobs: default_max_parallel_jobs(),
        }
    }
}

/// Configuration sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Download,
    Split,
    Separation,
    Tracklist,
    Runner,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 7] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Download,
        ConfigSection::Split,
        ConfigSection::Separation,
        ConfigSection::Tracklist,
        ConfigSection::Runner,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Download => "download",
            ConfigSection::Split => "split",
            ConfigSection::Separation => "separation",
            ConfigSection::Tracklist => "tracklist",
            ConfigSection::Runner => "runner",
        }
    }

    /// Look a section up by its table name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.table_name().eq_ignore_ascii_case(name.trim()))
    }

    /// Comment written above the table.
    pub(crate) fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Download => "Audio download (yt-dlp)",
            ConfigSection::Split => "Tracklist splitting (ffmpeg stream copy)",
            ConfigSection::Separation => "Vocal/instrumental stem separation",
            ConfigSection::Tracklist => "Tracklist extraction from comments",
            ConfigSection::Runner => "Parallel processing of multiple URLs",
        }
    }
}

impl fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
