//! yt-spleet - command line entry point.
//!
//! Parses arguments, loads settings and hands the jobs to the batch runner.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use yts_core::config::{ConfigManager, ConfigSection, DEFAULT_CONFIG_PATH};
use yts_core::logging::{init_tracing_with_file, ConsoleCallback, LogLevel};
use yts_core::models::{JobMode, JobResult, JobSpec, TimeRange};
use yts_core::orchestrator::BatchRunner;
use yts_core::tracklist::load_tracklist_file;

/// Download audio, cut windows or chapters, split sets into tracks and
/// separate vocals from instrumentals.
#[derive(Parser, Debug)]
#[command(name = "yt-spleet", version, about)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "YTS_CONFIG")]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one or more video URLs
    Run(RunArgs),

    /// Inspect or reset the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Video URLs, processed in parallel
    #[arg(required = true)]
    urls: Vec<String>,

    /// Only download START-END (e.g. 1:00-2:30, 60-150, 1m-2m30s)
    #[arg(long, value_name = "START-END", value_parser = parse_range,
          conflicts_with_all = ["chapters", "tracklist"])]
    range: Option<TimeRange>,

    /// Write one file per chapter
    #[arg(long, conflicts_with = "tracklist")]
    chapters: bool,

    /// Split into tracks; reads the tracklist from FILE or the video comments
    #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
    tracklist: Option<Option<PathBuf>>,

    /// Skip vocal/instrumental separation
    #[arg(long)]
    no_separate: bool,

    /// Override the output folder
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum URLs processed at once
    #[arg(short, long, value_name = "N")]
    jobs: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the settings file (creating it with defaults if needed)
    Show,
    /// Restore one section to its defaults
    Reset {
        /// Section name (paths, logging, download, split, separation, tracklist, runner)
        section: String,
    },
}

fn parse_range(raw: &str) -> Result<TimeRange, String> {
    TimeRange::parse(raw).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;

    match cli.command {
        Command::Run(args) => run_batches(config, args, LogLevel::from_verbosity(cli.verbose)),
        Command::Config { action } => {
            run_config(&mut config, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_batches(mut config: ConfigManager, args: RunArgs, level: LogLevel) -> Result<ExitCode> {
    let settings = config.settings_mut();
    if let Some(dir) = &args.output_dir {
        settings.paths.output_folder = dir.to_string_lossy().into_owned();
    }
    if let Some(jobs) = args.jobs {
        settings.runner.max_parallel_jobs = jobs;
    }
    config
        .ensure_dirs_exist()
        .context("Failed to create output folders")?;

    let _guard = init_tracing_with_file(level, &config.logs_folder());
    tracing::debug!("yts_core {}", yts_core::version());

    let mode = job_mode(&args)?;
    let jobs: Vec<JobSpec> = args
        .urls
        .iter()
        .map(|url| JobSpec::new(url, mode.clone()).with_separation(!args.no_separate))
        .collect();

    let runner = BatchRunner::from_settings(config.settings().clone())
        .context("Failed to set up external tools")?
        .with_log_level(level);
    tracing::info!("Writing to {}", runner.output_dir().display());

    let results = runner.process_urls(&jobs, |name| {
        let name = name.to_string();
        Some(Box::new(move |line: &str| println!("[{}] {}", name, line)) as ConsoleCallback)
    });

    print_results(&results);
    if results.iter().all(JobResult::is_success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn job_mode(args: &RunArgs) -> Result<JobMode> {
    if let Some(range) = args.range {
        return Ok(JobMode::TimeWindow(range));
    }
    if args.chapters {
        return Ok(JobMode::Chapters);
    }
    match &args.tracklist {
        Some(Some(path)) => {
            let tracks = load_tracklist_file(path)
                .with_context(|| format!("Failed to read tracklist {}", path.display()))?;
            Ok(JobMode::Tracklist {
                tracks: Some(tracks),
            })
        }
        Some(None) => Ok(JobMode::Tracklist { tracks: None }),
        None => Ok(JobMode::Full),
    }
}

fn print_results(results: &[JobResult]) {
    println!();
    for result in results {
        if result.is_success() {
            let dir = result
                .output_dir
                .as_deref()
                .map(Path::display)
                .map(|d| d.to_string())
                .unwrap_or_default();
            println!("[ok] {} -> {} ({} files)", result.url, dir, result.outputs.len());
        } else {
            println!(
                "[failed] {}: {}",
                result.url,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        if let Some(summary) = &result.summary {
            println!("     {}", summary);
        }
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    println!(
        "{} of {} URLs completed{}",
        results.len() - failed,
        results.len(),
        if failed > 0 {
            format!(", {} failed", failed)
        } else {
            String::new()
        }
    );
}

fn run_config(config: &mut ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = std::fs::read_to_string(config.path())
                .with_context(|| format!("Failed to read {}", config.path().display()))?;
            print!("{}", content);
        }
        ConfigAction::Reset { section } => {
            let Some(section) = ConfigSection::from_name(&section) else {
                let names: Vec<&str> = ConfigSection::ALL.iter().map(|s| s.table_name()).collect();
                bail!("Unknown section '{}' (expected one of: {})", section, names.join(", "));
            };
            config
                .reset_section(section)
                .with_context(|| format!("Failed to reset [{}]", section))?;
            println!("Reset [{}] in {}", section, config.path().display());
        }
    }
    Ok(())
}
