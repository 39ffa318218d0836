//! CLI command definitions for the intake pipeline
//!
//! Clap-based commands for routing drops, dry-run validation, local content
//! inspection and directory statistics.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::output::{self, ListedFile, OutputFormat};
use super::ExitCode;
use crate::config::IntakeConfig;
use crate::contracts::events::{PipelineEvent, RunSummary};
use crate::engine::{is_valid_filename, ContentValidator};
use crate::error::Result;
use crate::ledger::ProcessedLedger;
use crate::router::{pending_csv_names, FileRouter};
use crate::source::{DirectorySource, RemoteSource};
use crate::stats::IntakeStats;
use crate::telemetry::IntakeMetricsRegistry;

/// Clinical trial CSV intake
///
/// Validate incoming clinical data drops, archive clean files and record
/// every rejection in a correlation-tagged audit log.
#[derive(Parser, Debug)]
#[command(name = "clinical-intake")]
#[command(about = "Clinical trial intake - validate, archive and audit CSV drops", long_about = None)]
#[command(version)]
pub struct IntakeCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true, env = "INTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Drop directory to read incoming files from
    #[arg(long, global = true)]
    pub source_dir: Option<PathBuf>,

    /// Staging directory (also holds the processed-file ledger)
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Archive directory for valid files
    #[arg(long, global = true)]
    pub archive_dir: Option<PathBuf>,

    /// Error directory for rejected files and the audit log
    #[arg(long, global = true)]
    pub error_dir: Option<PathBuf>,

    /// UUID endpoint for correlation tokens
    #[arg(long, global = true)]
    pub token_endpoint: Option<String>,

    /// Output format for results
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: IntakeCommands,
}

/// Available intake commands
#[derive(Subcommand, Debug)]
pub enum IntakeCommands {
    /// Route files from the drop to the archive or error directory
    ///
    /// With no FILES, every pending `.csv` file in the drop is processed in
    /// name order.
    Process {
        /// Remote filenames to process
        files: Vec<String>,

        /// Print Prometheus metrics after the run
        #[arg(long)]
        metrics: bool,
    },

    /// Check one remote file without moving it or updating the ledger
    Validate {
        /// Remote filename
        file: String,
    },

    /// Check a name against the filename contract
    CheckName {
        /// Candidate filename
        name: String,
    },

    /// Run the content checks on a local CSV file
    Inspect {
        /// Path to the CSV file
        path: PathBuf,

        /// Also print the clean records
        #[arg(long)]
        records: bool,
    },

    /// List CSV files in the drop
    List,

    /// Copy one remote file into the staging directory under today's name
    Fetch {
        /// Remote filename
        file: String,
    },

    /// Count archived files, rejected files and audit entries
    Stats,
}

impl IntakeCli {
    /// Defaults, then the config file, then `INTAKE_*`, then flags
    pub fn resolve_config(&self) -> Result<IntakeConfig> {
        let base = match &self.config {
            Some(path) => IntakeConfig::from_file(path)?,
            None => IntakeConfig::default(),
        };
        let mut config = base.with_env_overrides();

        if let Some(dir) = &self.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(dir) = &self.archive_dir {
            config.archive_dir = dir.clone();
        }
        if let Some(dir) = &self.error_dir {
            config.error_dir = dir.clone();
        }
        if let Some(endpoint) = &self.token_endpoint {
            config.token_endpoint = Some(endpoint.clone());
        }
        Ok(config)
    }
}

/// Router wired to a live event printer when rendering a table
fn build_router(
    config: &IntakeConfig,
    format: OutputFormat,
    quiet: bool,
) -> Result<(FileRouter, Option<tokio::task::JoinHandle<()>>)> {
    let router = FileRouter::new(config)?;
    if format != OutputFormat::Table || quiet {
        return Ok((router, None));
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            output::print_event(&event);
        }
    });
    Ok((router.with_events(tx), Some(printer)))
}

async fn finish_printer(printer: Option<tokio::task::JoinHandle<()>>) {
    if let Some(handle) = printer {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Event printer stopped");
        }
    }
}

/// Execute the process command
pub async fn execute_process(
    config: &IntakeConfig,
    files: Vec<String>,
    print_metrics: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let registry = IntakeMetricsRegistry::new()?;
    let (router, printer) = build_router(config, format, quiet)?;
    let mut router = router.with_metrics(registry.intake());
    let mut source = DirectorySource::new(&config.source_dir);

    let summary = if files.is_empty() {
        router.process_pending(&mut source).await?
    } else {
        source.connect().await?;
        let mut summary = RunSummary::default();
        for name in files {
            let outcome = router.process_file(&source, &name).await;
            summary.record(name, outcome);
        }
        source.disconnect().await?;
        summary
    };

    // dropping the router closes the event channel
    drop(router);
    finish_printer(printer).await;

    output::render_summary(&summary, format)?;
    if print_metrics {
        println!("{}", registry.encode_text()?);
    }

    Ok(ExitCode::from_summary(&summary))
}

/// Execute the validate command
pub async fn execute_validate(
    config: &IntakeConfig,
    file: String,
    format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let (router, printer) = build_router(config, format, quiet)?;
    let mut source = DirectorySource::new(&config.source_dir);
    source.connect().await?;

    let outcome = router.validate_file(&source, &file).await;
    drop(router);
    finish_printer(printer).await;

    output::render_outcome(&file, &outcome, format)?;
    Ok(ExitCode::from_outcome(&outcome))
}

/// Execute the check-name command
pub fn execute_check_name(name: &str, format: OutputFormat) -> Result<ExitCode> {
    let valid = is_valid_filename(name);
    output::render_name_check(name, valid, format)?;
    Ok(if valid {
        ExitCode::Success
    } else {
        ExitCode::Rejected
    })
}

/// Execute the inspect command
pub fn execute_inspect(path: PathBuf, records: bool, format: OutputFormat) -> Result<ExitCode> {
    let file = File::open(&path)?;
    let validator = ContentValidator::new();
    let (report, clean) = validator.validate_collect(file);

    let shown = if records { Some(clean.as_slice()) } else { None };
    output::render_report(&path, &report, shown, format)?;

    Ok(if report.is_valid {
        ExitCode::Success
    } else {
        ExitCode::Rejected
    })
}

/// Execute the list command
pub async fn execute_list(config: &IntakeConfig, format: OutputFormat) -> Result<ExitCode> {
    let mut source = DirectorySource::new(&config.source_dir);
    source.connect().await?;
    let names = pending_csv_names(source.list_files().await?);
    source.disconnect().await?;

    let ledger = ProcessedLedger::load(config.ledger_path())?;
    let files: Vec<ListedFile> = names
        .into_iter()
        .map(|name| ListedFile {
            valid_name: is_valid_filename(&name),
            processed: ledger.contains(&name),
            name,
        })
        .collect();

    output::render_listing(&files, format)?;
    Ok(ExitCode::Success)
}

/// Execute the fetch command
pub async fn execute_fetch(config: &IntakeConfig, file: String, quiet: bool) -> Result<ExitCode> {
    let router = FileRouter::new(config)?;
    let mut source = DirectorySource::new(&config.source_dir);
    source.connect().await?;

    let dest = router.fetch_renamed(&source, &file).await?;
    if !quiet {
        use colored::Colorize;
        println!("{} Downloaded as: {}", "+".green(), dest.display());
    }
    Ok(ExitCode::Success)
}

/// Execute the stats command
pub fn execute_stats(config: &IntakeConfig, format: OutputFormat) -> Result<ExitCode> {
    let stats = IntakeStats::collect(config)?;
    output::render_stats(&stats, format)?;
    Ok(ExitCode::Success)
}
