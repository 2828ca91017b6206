//! Configuration management for yt-spleet.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! The loaded [`Settings`] value is passed explicitly to every job; nothing
//! reads configuration from process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use yts_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_folder);
//!
//! config.settings_mut().split.tail_seconds = 300;
//! config.update_section(ConfigSection::Split).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DownloadSettings, LoggingSettings, PathSettings, RunnerSettings,
    SeparationSettings, Settings, SplitSettings, TracklistSettings,
};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/settings.toml";
