//! Output formatting for the intake CLI
//!
//! Every command renders either as a colored human-readable table or as
//! JSON/YAML for machine processing.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

use crate::contracts::events::{EventLevel, FileOutcome, PipelineEvent, RunSummary};
use crate::contracts::{ClinicalRecord, ValidationReport};
use crate::error::Result;
use crate::stats::IntakeStats;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Print `value` as JSON or YAML; `false` means the caller renders a table
fn render_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
        OutputFormat::Table => Ok(false),
    }
}

/// One line of pipeline progress, colored by level
pub fn print_event(event: &PipelineEvent) {
    println!("{} {}", level_icon(event.level()), event.message());
}

fn level_icon(level: EventLevel) -> ColoredString {
    match level {
        EventLevel::Info => "i".blue(),
        EventLevel::Success => "+".green(),
        EventLevel::Warning => "!".yellow(),
        EventLevel::Error => "x".red(),
    }
}

fn outcome_label(outcome: &FileOutcome) -> ColoredString {
    match outcome {
        FileOutcome::Skipped => "SKIPPED".yellow().bold(),
        FileOutcome::Archived { .. } => "ARCHIVED".green().bold(),
        FileOutcome::Validated { .. } => "VALID".green().bold(),
        FileOutcome::Rejected { .. } => "REJECTED".red().bold(),
        FileOutcome::Failed { .. } => "FAILED".red().bold(),
    }
}

/// Result of `process`
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    if render_structured(summary, format)? {
        return Ok(());
    }

    let mut stdout = io::stdout();
    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Intake Run".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();

    if summary.files.is_empty() {
        writeln!(stdout, "{} No CSV files found", "!".yellow()).ok();
    }
    for (name, outcome) in &summary.files {
        writeln!(stdout, "{:<10} {} {}", outcome_label(outcome), name, outcome.to_string().dimmed()).ok();
    }

    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Totals:".cyan().bold()).ok();
    writeln!(stdout, "  {} Archived: {}", "+".green(), summary.archived).ok();
    writeln!(stdout, "  {} Rejected: {}", "x".red(), summary.rejected).ok();
    writeln!(stdout, "  {} Failed:   {}", "x".red(), summary.failed).ok();
    writeln!(stdout, "  {} Skipped:  {}", "!".yellow(), summary.skipped).ok();
    stdout.flush().ok();
    Ok(())
}

#[derive(Debug, Serialize)]
struct OutcomeOutput<'a> {
    file: &'a str,
    #[serde(flatten)]
    outcome: &'a FileOutcome,
}

/// Result of `validate`
pub fn render_outcome(filename: &str, outcome: &FileOutcome, format: OutputFormat) -> Result<()> {
    let output = OutcomeOutput {
        file: filename,
        outcome,
    };
    if render_structured(&output, format)? {
        return Ok(());
    }
    println!("{} {} {}", outcome_label(outcome), filename, outcome.to_string().dimmed());
    Ok(())
}

#[derive(Debug, Serialize)]
struct NameCheckOutput<'a> {
    filename: &'a str,
    valid: bool,
}

/// Result of `check-name`
pub fn render_name_check(filename: &str, valid: bool, format: OutputFormat) -> Result<()> {
    if render_structured(&NameCheckOutput { filename, valid }, format)? {
        return Ok(());
    }
    if valid {
        println!("{} {} matches the naming contract", "+".green(), filename);
    } else {
        println!("{} {} does not match CLINICALDATA_<YYYYMMDDHHMMSS>.csv", "x".red(), filename);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    path: String,
    #[serde(flatten)]
    report: &'a ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [ClinicalRecord]>,
}

/// Result of `inspect`
pub fn render_report(
    path: &Path,
    report: &ValidationReport,
    records: Option<&[ClinicalRecord]>,
    format: OutputFormat,
) -> Result<()> {
    let output = InspectOutput {
        path: path.display().to_string(),
        report,
        records,
    };
    if render_structured(&output, format)? {
        return Ok(());
    }

    let mut stdout = io::stdout();
    writeln!(stdout).ok();
    writeln!(stdout, "{}", format!("Content Check: {}", path.display()).cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();

    let status = if report.is_valid {
        "+".green()
    } else {
        "x".red()
    };
    writeln!(
        stdout,
        "{} Valid records: {}, errors found: {}",
        status,
        report.record_count,
        report.defect_count()
    )
    .ok();

    if !report.defects.is_empty() {
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Defects:".red().bold()).ok();
        for line in report.defect_lines() {
            writeln!(stdout, "  {} {}", "x".red(), line).ok();
        }
    }

    if let Some(records) = records {
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Records:".cyan().bold()).ok();
        for record in records {
            writeln!(
                stdout,
                "  {:<10} {:<8} {:<8} {:>6} mg  {} -> {}  {}",
                record.patient_id,
                record.trial_code,
                record.drug_code,
                record.dosage_mg,
                record.start_date,
                record.end_date,
                record.outcome.to_string().yellow()
            )
            .ok();
        }
    }

    stdout.flush().ok();
    Ok(())
}

/// A file in the drop and whether the ledger already holds it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedFile {
    pub name: String,
    pub valid_name: bool,
    pub processed: bool,
}

/// Result of `list`
pub fn render_listing(files: &[ListedFile], format: OutputFormat) -> Result<()> {
    if render_structured(&files, format)? {
        return Ok(());
    }

    if files.is_empty() {
        println!("{} No CSV files found", "!".yellow());
        return Ok(());
    }
    println!("{}", format!("Found {} CSV files", files.len()).green());
    for file in files {
        let name_mark = if file.valid_name {
            "+".green()
        } else {
            "x".red()
        };
        let state = if file.processed {
            "processed".dimmed()
        } else {
            "pending".cyan()
        };
        println!("  {} {:<40} {}", name_mark, file.name, state);
    }
    Ok(())
}

/// Result of `stats`
pub fn render_stats(stats: &IntakeStats, format: OutputFormat) -> Result<()> {
    if render_structured(stats, format)? {
        return Ok(());
    }

    println!("{}", "Statistics:".cyan().bold());
    println!("  Archived files:  {}", stats.archived_files.to_string().green());
    println!("  Error files:     {}", stats.error_files.to_string().red());
    println!("  Audit entries:   {}", stats.audit_entries);
    println!("  Ledger entries:  {}", stats.processed_files);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_structured_formats_short_circuit() {
        let summary = RunSummary::default();
        assert!(render_structured(&summary, OutputFormat::Json).unwrap());
        assert!(render_structured(&summary, OutputFormat::Yaml).unwrap());
        assert!(!render_structured(&summary, OutputFormat::Table).unwrap());
    }

    #[test]
    fn test_outcome_output_flattens_state() {
        let outcome = FileOutcome::Validated { record_count: 3 };
        let output = OutcomeOutput {
            file: "a.csv",
            outcome: &outcome,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["file"], "a.csv");
        assert_eq!(json["state"], "validated");
        assert_eq!(json["record_count"], 3);
    }
}
