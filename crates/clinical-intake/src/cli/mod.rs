//! CLI module for the clinical intake pipeline
//!
//! Routes drops, dry-runs validation, inspects local files and reports
//! directory statistics, with table, JSON or YAML output.

pub mod commands;
pub mod output;

pub use commands::{IntakeCli, IntakeCommands};
pub use output::OutputFormat;

use crate::contracts::events::{FileOutcome, RunSummary};
use crate::error::{IntakeError, Result};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every file archived, validated or skipped
    Success = 0,
    /// At least one file was rejected
    Rejected = 1,
    /// Invalid input, arguments or configuration
    InvalidInput = 3,
    /// Filesystem or file drop failure
    FileError = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Failures outrank rejections
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.failed > 0 {
            ExitCode::FileError
        } else if summary.rejected > 0 {
            ExitCode::Rejected
        } else {
            ExitCode::Success
        }
    }

    pub fn from_outcome(outcome: &FileOutcome) -> Self {
        match outcome {
            FileOutcome::Failed { .. } => ExitCode::FileError,
            FileOutcome::Rejected { .. } => ExitCode::Rejected,
            _ => ExitCode::Success,
        }
    }

    /// Exit code for an error that ended the command
    pub fn from_error(err: &IntakeError) -> Self {
        if err.is_file_error() {
            ExitCode::FileError
        } else if err.is_user_error() {
            ExitCode::InvalidInput
        } else {
            ExitCode::InternalError
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub fn run(cli: IntakeCli) -> Result<ExitCode> {
    let config = cli.resolve_config()?;
    let format = cli.format;
    let quiet = cli.quiet;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| IntakeError::Internal(format!("Failed to start runtime: {}", e)))?;

    match cli.command {
        IntakeCommands::Process { files, metrics } => runtime.block_on(
            commands::execute_process(&config, files, metrics, format, quiet),
        ),
        IntakeCommands::Validate { file } => {
            runtime.block_on(commands::execute_validate(&config, file, format, quiet))
        }
        IntakeCommands::CheckName { name } => commands::execute_check_name(&name, format),
        IntakeCommands::Inspect { path, records } => {
            commands::execute_inspect(path, records, format)
        }
        IntakeCommands::List => runtime.block_on(commands::execute_list(&config, format)),
        IntakeCommands::Fetch { file } => {
            runtime.block_on(commands::execute_fetch(&config, file, quiet))
        }
        IntakeCommands::Stats => commands::execute_stats(&config, format),
    }
}
