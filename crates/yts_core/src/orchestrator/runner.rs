//! Batch runner for processing one or more source URLs.
//!
//! Each URL is one batch: it gets a private output directory named after the
//! source, its own `JobLogger` and `JobState`, and runs through the standard
//! pipeline. Batches run on worker threads, at most `max_parallel_jobs` at a
//! time, and never share mutable state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use super::create_standard_pipeline;
use super::errors::PipelineError;
use super::toolchain::Toolchain;
use super::types::{Context, JobState};
use crate::config::Settings;
use crate::logging::{ConsoleCallback, JobLogger, LogConfig, LogLevel};
use crate::models::{JobResult, JobSpec};
use crate::tracklist::TracklistError;

/// Runs batches through the pipeline.
///
/// # Example
///
/// ```ignore
/// let runner = BatchRunner::from_settings(settings)?;
/// let results = runner.process_urls(&jobs, |_| None);
/// ```
pub struct BatchRunner {
    settings: Settings,
    toolchain: Toolchain,
    /// Root under which each batch gets its own directory.
    output_dir: PathBuf,
    log_dir: PathBuf,
    log_level: LogLevel,
}

impl BatchRunner {
    pub fn new(
        settings: Settings,
        toolchain: Toolchain,
        output_dir: PathBuf,
        log_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            toolchain,
            output_dir,
            log_dir,
            log_level: LogLevel::Info,
        }
    }

    /// Runner with the real tools and the configured folders.
    pub fn from_settings(settings: Settings) -> Result<Self, TracklistError> {
        let toolchain = Toolchain::from_settings(&settings)?;
        let output_dir = PathBuf::from(&settings.paths.output_folder);
        let log_dir = PathBuf::from(&settings.paths.logs_folder);
        Ok(Self::new(settings, toolchain, output_dir, log_dir))
    }

    /// Minimum level written to each batch log.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one batch to completion.
    ///
    /// `console_factory` is called with the batch name once it is known and
    /// may return a callback receiving every log line of that batch.
    pub fn process_job<F>(&self, spec: &JobSpec, console_factory: &F) -> JobResult
    where
        F: Fn(&str) -> Option<ConsoleCallback>,
    {
        let url = spec.url.trim();
        if url.is_empty() {
            let err = PipelineError::validation_failed("<empty>", "No source URL given");
            return JobResult::failed(&spec.url, &spec.url, err.to_string());
        }

        let name = match self.toolchain.source.describe(url, None) {
            Ok(name) => name,
            Err(e) => {
                tracing::error!("Could not resolve {}: {}", url, e);
                return JobResult::failed(url, url, format!("Could not resolve source: {}", e));
            }
        };
        let job_name = safe_dir_name(&name);

        let job_dir = self.output_dir.join(&job_name);
        if let Err(e) = fs::create_dir_all(&job_dir) {
            let err = PipelineError::setup_failed(
                &job_name,
                format!("Failed to create {}: {}", job_dir.display(), e),
            );
            return JobResult::failed(url, &name, err.to_string());
        }

        let logger = match JobLogger::new(
            &job_name,
            &self.log_dir,
            LogConfig::from_settings(&self.settings.logging, self.log_level),
            console_factory(&job_name),
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                let err =
                    PipelineError::setup_failed(&job_name, format!("Failed to create logger: {}", e));
                return JobResult::failed(url, &name, err.to_string());
            }
        };

        let ctx = Context::new(
            spec.clone(),
            self.settings.clone(),
            &job_name,
            job_dir.clone(),
            logger,
            self.toolchain.clone(),
        );
        let mut state = JobState::new(&job_name);
        let pipeline = create_standard_pipeline();

        ctx.logger
            .info(&format!("Starting batch: {} ({})", url, spec.mode.name()));
        ctx.logger
            .info(&format!("Output directory: {}", job_dir.display()));
        ctx.logger
            .debug(&format!("Log file: {}", ctx.logger.log_path().display()));

        let result = match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                ctx.logger.info(&format!(
                    "Batch completed: {} steps run, {} skipped",
                    run_result.steps_completed.len(),
                    run_result.steps_skipped.len()
                ));
                JobResult::completed(url, &name, job_dir, state.outputs(), state.summary())
            }
            Err(e) => {
                let error_msg = format!("Pipeline failed: {}", e);
                ctx.logger.error(&error_msg);
                JobResult::failed(url, &name, error_msg)
            }
        };
        ctx.logger.close();
        result
    }

    /// Run every job, returning results in input order.
    ///
    /// A failed batch only affects its own result.
    pub fn process_urls<F>(&self, jobs: &[JobSpec], console_factory: F) -> Vec<JobResult>
    where
        F: Fn(&str) -> Option<ConsoleCallback> + Sync,
    {
        if jobs.is_empty() {
            return Vec::new();
        }
        let workers = (self.settings.runner.max_parallel_jobs.max(1) as usize).min(jobs.len());
        tracing::info!("Processing {} URLs with {} workers", jobs.len(), workers);

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<JobResult>>> = Mutex::new(vec![None; jobs.len()]);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    let Some(spec) = jobs.get(i) else {
                        break;
                    };
                    tracing::info!("Processing batch {}/{}: {}", i + 1, jobs.len(), spec.url);
                    let result = self.process_job(spec, &console_factory);
                    slots.lock()[i] = Some(result);
                });
            }
        });

        slots
            .into_inner()
            .into_iter()
            .zip(jobs)
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| JobResult::failed(&spec.url, &spec.url, "Batch did not run"))
            })
            .collect()
    }
}

/// Directory-safe form of a source name.
fn safe_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "source".to_string()
    } else {
        trimmed.to_string()
    }
}
