//! Command-line front end over the planning core.
//!
//! # Responsibility
//! - Load a JSON task snapshot and run one core use case over it.
//! - Print results as pretty JSON so output can be diffed and piped.
//!
//! # Invariants
//! - Core errors are reported on stderr with exit code 1; stdout only ever
//!   carries a complete JSON document.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use planwise_core::{
    init_logging, init_logging_from_config, DateWindow, InMemoryTaskSource, PlannerConfig,
    PlannerService, TaskRecord,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "planwise", version, about = "Task scheduling and time accounting")]
struct Cli {
    /// JSON file holding an array of task records.
    #[arg(long, global = true)]
    tasks: Option<PathBuf>,

    /// TOML planner config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; overrides the config.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level used with `--log-dir`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the plan of one day.
    Day {
        /// Day to plan (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
        /// Reference date for overdue carry-over. Defaults to the local date.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// List open tasks dated before today.
    Overdue {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Count tasks per risk status.
    Risk {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Expand recurring templates over an inclusive date range.
    Expand {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Write missing instances and print the resulting task snapshot.
        #[arg(long)]
        materialize: bool,
    },
    /// Report estimated vs actual time of completed tasks.
    Accuracy,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("planwise: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => PlannerConfig::load(path).map_err(|err| err.to_string())?,
        None => PlannerConfig::default(),
    };
    start_logging(&cli, &config)?;

    let tasks_path = cli
        .tasks
        .as_deref()
        .ok_or_else(|| "missing --tasks <FILE>".to_string())?;
    let source = InMemoryTaskSource::from_tasks(read_tasks(tasks_path)?)
        .map_err(|err| err.to_string())?;
    let mut service = PlannerService::new(source, config);
    let local_today = Local::now().date_naive();

    match cli.command {
        Commands::Day { date, today } => {
            let plan = service
                .day_plan(date, today.unwrap_or(local_today))
                .map_err(|err| err.to_string())?;
            print_json(&plan)
        }
        Commands::Overdue { today } => {
            let overdue = service
                .overdue(today.unwrap_or(local_today))
                .map_err(|err| err.to_string())?;
            print_json(&overdue)
        }
        Commands::Risk { today } => {
            let summary = service
                .risk_summary(today.unwrap_or(local_today))
                .map_err(|err| err.to_string())?;
            print_json(&summary)
        }
        Commands::Expand {
            from,
            to,
            materialize: false,
        } => {
            let occurrences = service
                .expand(DateWindow::new(from, to))
                .map_err(|err| err.to_string())?;
            print_json(&occurrences)
        }
        Commands::Expand {
            from,
            to,
            materialize: true,
        } => {
            let written = service
                .materialize_recurring(DateWindow::new(from, to))
                .map_err(|err| err.to_string())?;
            info!(
                "event=cli_materialize module=cli status=ok written={}",
                written.len()
            );
            let snapshot = service.snapshot().map_err(|err| err.to_string())?;
            print_json(&snapshot)
        }
        Commands::Accuracy => {
            let report = service.time_accuracy().map_err(|err| err.to_string())?;
            print_json(&report)
        }
    }
}

/// `--log-dir` wins over the config's `[logging]` table.
fn start_logging(cli: &Cli, config: &PlannerConfig) -> Result<(), String> {
    match &cli.log_dir {
        Some(dir) => {
            let level = cli
                .log_level
                .as_deref()
                .unwrap_or(config.logging.level.as_str());
            init_logging(level, &dir.to_string_lossy())
        }
        None => init_logging_from_config(&config.logging).map(|_| ()),
    }
}

fn read_tasks(path: &Path) -> Result<Vec<TaskRecord>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse tasks in `{}`: {err}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}
