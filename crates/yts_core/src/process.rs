//! Blocking external-tool runner.
//!
//! Every collaborator (yt-dlp, ffmpeg, demucs, spleeter) goes through
//! [`run_tool`]: the process is spawned with piped output, each stdout and
//! stderr line is forwarded to the job logger while the process runs, and the
//! caller blocks until it exits. There is no cancellation; a killed process
//! surfaces as a failure without an exit code.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::logging::JobLogger;

/// Error from running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The process could not be started (tool missing, permissions).
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("{tool} failed with exit code {}: {}", display_code(.exit_code), .stderr.trim())]
    Failed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

impl ToolError {
    /// Name of the tool that failed.
    pub fn tool(&self) -> &str {
        match self {
            ToolError::Spawn { tool, .. } | ToolError::Failed { tool, .. } => tool,
        }
    }

    /// Exit code, when the process ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolError::Spawn { .. } => None,
            ToolError::Failed { exit_code, .. } => *exit_code,
        }
    }

    /// Diagnostic text suitable for a failure record.
    pub fn diagnostic(&self) -> String {
        match self {
            ToolError::Spawn { source, .. } => source.to_string(),
            ToolError::Failed { stderr, .. } => last_lines(stderr, 5),
        }
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a tool to completion, echoing stdout and stderr into the logger.
pub fn run_tool(
    tool: &str,
    cmd: Command,
    logger: Option<&JobLogger>,
) -> Result<ToolOutput, ToolError> {
    run(tool, cmd, logger, true)
}

/// Run a tool whose stdout is data (JSON dumps, printed paths).
///
/// Only stderr is echoed into the logger; stdout is returned untouched.
pub fn run_tool_capture(
    tool: &str,
    cmd: Command,
    logger: Option<&JobLogger>,
) -> Result<ToolOutput, ToolError> {
    run(tool, cmd, logger, false)
}

fn run(
    tool: &str,
    mut cmd: Command,
    logger: Option<&JobLogger>,
    echo_stdout: bool,
) -> Result<ToolOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let rendered = describe_command(&cmd);
    tracing::debug!("Running: {}", rendered);
    if let Some(logger) = logger {
        logger.command(&rendered);
    }

    let mut child = cmd.spawn().map_err(|e| ToolError::Spawn {
        tool: tool.to_string(),
        source: e,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout_text, stderr_text) = std::thread::scope(|scope| {
        let stderr_handle = scope.spawn(|| collect_lines(stderr, logger, true, true));
        let stdout_text = collect_lines(stdout, logger, false, echo_stdout);
        let stderr_text = stderr_handle.join().unwrap_or_default();
        (stdout_text, stderr_text)
    });

    let status = child.wait().map_err(|e| ToolError::Spawn {
        tool: tool.to_string(),
        source: e,
    })?;

    if !status.success() {
        if let Some(logger) = logger {
            logger.show_tail(tool);
        }
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            exit_code: status.code(),
            stderr: stderr_text,
        });
    }

    Ok(ToolOutput {
        stdout: stdout_text,
        stderr: stderr_text,
    })
}

/// Read a pipe to the end line by line, optionally echoing each line.
fn collect_lines<R: Read>(
    pipe: Option<R>,
    logger: Option<&JobLogger>,
    is_stderr: bool,
    echo: bool,
) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };

    let mut reader = BufReader::new(pipe);
    let mut collected = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                collected.push_str(&line);
                if echo {
                    if let Some(logger) = logger {
                        let trimmed = line.trim_end();
                        if !trimmed.is_empty() {
                            logger.output_line(trimmed, is_stderr);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read tool output: {}", e);
                break;
            }
        }
    }

    collected
}

/// Render a command the way a user would type it.
pub fn describe_command(cmd: &Command) -> String {
    let mut parts = vec![quote(cmd.get_program())];
    parts.extend(cmd.get_args().map(quote));
    parts.join(" ")
}

fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.into_owned()
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_quotes_spaces() {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-i").arg("my file.mp3").arg("-c").arg("copy");
        assert_eq!(describe_command(&cmd), "ffmpeg -i \"my file.mp3\" -c copy");
    }

    #[test]
    fn missing_tool_is_spawn_error() {
        let cmd = Command::new("/nonexistent/definitely-not-a-tool");
        let err = run_tool("fake", cmd, None).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
        assert_eq!(err.tool(), "fake");
    }

    #[test]
    fn diagnostic_keeps_last_lines() {
        let err = ToolError::Failed {
            tool: "ffmpeg".to_string(),
            exit_code: Some(1),
            stderr: "a\nb\n\nc\nd\ne\nf\n".to_string(),
        };
        assert_eq!(err.diagnostic(), "b\nc\nd\ne\nf");
        assert!(err.to_string().contains("exit code 1"));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo out; echo err 1>&2; exit 3");
        let err = run_tool("sh", cmd, None).unwrap_err();
        match err {
            ToolError::Failed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "err");
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo hello");
        let output = run_tool_capture("sh", cmd, None).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }
}
