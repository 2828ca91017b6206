//! Per-job logger with file and console output.
//!
//! Each batch (one source URL) gets its own logger that:
//! - Writes to a dedicated log file
//! - Echoes lines to a console callback (if provided), prefixed by the caller
//! - Keeps a tail buffer of external-tool output for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{ConsoleCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-job logger with dual output (file + console).
pub struct JobLogger {
    job_name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    console: Option<ConsoleCallback>,
    config: LogConfig,
    /// Recent tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
}

impl JobLogger {
    /// Create a new job logger writing to `<log_dir>/<job_name>.log`.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        console: Option<ConsoleCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_log_name(&job_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            job_name,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            console,
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log one line of external-tool output.
    ///
    /// Always kept in the tail buffer; echoed only outside compact mode.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if self.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.log(LogLevel::Debug, &format!("{}{}", prefix, line));
    }

    /// Dump the tail buffer (after a tool failure) and clear it.
    pub fn show_tail(&self, header: &str) {
        let mut buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.drain(..) {
            self.output(&self.format_message(&line));
        }
    }

    /// Current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the log file. Later messages only reach the console.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = self.console {
            callback(formatted);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Make a job name safe for use as a log filename.
fn sanitize_log_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("song-abc123", dir.path(), LogConfig::default(), None).unwrap();

        logger.info("Test message");
        logger.phase("Download");
        logger.flush();

        assert!(logger.log_path().ends_with("song-abc123.log"));
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("Test message"));
        assert!(content.contains("=== Download ==="));
    }

    #[test]
    fn echoes_to_console() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let callback: ConsoleCallback = Box::new(move |_line| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger =
            JobLogger::new("job", dir.path(), LogConfig::default(), Some(callback)).unwrap();
        logger.info("one");
        logger.debug("filtered at info level");
        logger.success("two");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compact_mode_keeps_tool_output_in_tail_only() {
        let dir = tempdir().unwrap();
        let mut config = LogConfig::default();
        config.error_tail = 3;
        let logger = JobLogger::new("job", dir.path(), config, None).unwrap();

        for i in 0..5 {
            logger.output_line(&format!("line {}", i), true);
        }
        logger.flush();

        assert_eq!(logger.get_tail(), vec!["line 2", "line 3", "line 4"]);
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!content.contains("line 4"));

        logger.show_tail("ffmpeg");
        logger.flush();
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("[ffmpeg/tail]"));
        assert!(content.contains("line 4"));
        assert!(logger.get_tail().is_empty());
    }

    #[test]
    fn sanitizes_log_name() {
        assert_eq!(sanitize_log_name("normal_name"), "normal_name");
        assert_eq!(sanitize_log_name("a/b:c"), "a_b_c");
    }
}
