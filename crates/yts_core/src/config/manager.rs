//! Config manager for loading, saving, and atomic updates.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Section-level updates (only modified section is changed)
//! - Validation on load (rewrites files with missing keys or unknown sections)
//! - Preserves comments and formatting of other sections with toml_edit

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages application configuration.
///
/// Handles loading, saving, and atomic section-level updates.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Changes are only in memory until `save()` or `update_section()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file. Returns `NotFound` if it doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load config from file, creating it with defaults if it doesn't exist.
    ///
    /// A file with missing keys or unknown sections is rewritten in full.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, needs_rewrite) = parse_and_check(&content)?;
            self.settings = settings;

            if needs_rewrite {
                tracing::info!("Updating config file {}", self.config_path.display());
                self.save()?;
            }
        } else {
            tracing::info!("Creating default config at {}", self.config_path.display());
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Create the output and logs directories.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [self.output_folder(), self.logs_folder()] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_folder)
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Save the entire config atomically, with section comments.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Update a specific section atomically.
    ///
    /// Re-reads the file from disk, replaces only the named table and writes
    /// back atomically; every other section keeps its on-disk content.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let section_doc: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    /// Restore one section to its defaults, in memory and on disk.
    pub fn reset_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let defaults = Settings::default();
        match section {
            ConfigSection::Paths => self.settings.paths = defaults.paths,
            ConfigSection::Logging => self.settings.logging = defaults.logging,
            ConfigSection::Download => self.settings.download = defaults.download,
            ConfigSection::Split => self.settings.split = defaults.split,
            ConfigSection::Separation => self.settings.separation = defaults.separation,
            ConfigSection::Tracklist => self.settings.tracklist = defaults.tracklist,
            ConfigSection::Runner => self.settings.runner = defaults.runner,
        }
        self.update_section(section)
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        let content = match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
            ConfigSection::Download => toml::to_string_pretty(&s.download)?,
            ConfigSection::Split => toml::to_string_pretty(&s.split)?,
            ConfigSection::Separation => toml::to_string_pretty(&s.separation)?,
            ConfigSection::Tracklist => toml::to_string_pretty(&s.tracklist)?,
            ConfigSection::Runner => toml::to_string_pretty(&s.runner)?,
        };
        Ok(content)
    }

    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# yt-spleet configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n",
        );

        for section in ConfigSection::ALL {
            output.push('\n');
            output.push_str(&format!("# {}\n", section.description()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Write to a temp file in the same directory, then rename over the config.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

/// Parse settings and report whether the file should be rewritten.
fn parse_and_check(content: &str) -> ConfigResult<(Settings, bool)> {
    let doc: DocumentMut = content.parse()?;
    let settings: Settings = toml::from_str(content)?;

    let has_unknown = doc
        .iter()
        .any(|(key, _)| ConfigSection::from_name(key).is_none());

    let full: DocumentMut = toml::to_string_pretty(&settings)?.parse()?;
    let has_missing = full.iter().any(|(name, item)| {
        let Some(expected) = item.as_table() else {
            return false;
        };
        match doc.get(name).and_then(Item::as_table) {
            Some(existing) => expected.iter().any(|(key, _)| !existing.contains_key(key)),
            None => true,
        }
    });

    Ok((settings, has_unknown || has_missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        for section in ConfigSection::ALL {
            assert!(content.contains(&format!("[{}]", section.table_name())));
        }

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().split.tail_seconds, 600);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_or_create_preserves_existing_and_fills_gaps() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(
            &config_path,
            "[paths]\noutput_folder = \"my_sets\"\n\n[bogus]\nx = 1\n",
        )
        .unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().paths.output_folder, "my_sets");
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("output_folder = \"my_sets\""));
        assert!(content.contains("logs_folder"));
        assert!(!content.contains("[bogus]"));
    }

    #[test]
    fn complete_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("# my note\n");
        fs::write(&config_path, &content).unwrap();

        manager.load_or_create().unwrap();
        assert!(fs::read_to_string(&config_path)
            .unwrap()
            .contains("# my note"));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        manager.settings_mut().logging.compact = false;
        manager.settings_mut().runner.max_parallel_jobs = 9;
        manager.update_section(ConfigSection::Logging).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("compact = false"));
        assert!(content.contains("max_parallel_jobs = 4"));
    }

    #[test]
    fn reset_section_restores_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(&config_path, "[split]\ntail_seconds = 30\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        assert_eq!(manager.settings().split.tail_seconds, 30);

        manager.reset_section(ConfigSection::Split).unwrap();
        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().split.tail_seconds, 600);
    }

    #[test]
    fn ensure_dirs_creates_folders() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("settings.toml"));
        manager.settings_mut().paths.output_folder =
            dir.path().join("out").to_string_lossy().into_owned();
        manager.settings_mut().paths.logs_folder =
            dir.path().join("logs").to_string_lossy().into_owned();

        manager.ensure_dirs_exist().unwrap();
        assert!(dir.path().join("out").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn atomic_write_creates_no_temp_on_success() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!config_path.with_extension("toml.tmp").exists());
    }
}
