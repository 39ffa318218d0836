//! Routing outcomes and status events
//!
//! The router reports progress through `PipelineEvent` values on an optional
//! channel and returns a `FileOutcome` per file. Presentation layers consume
//! these; the pipeline holds no reference to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display level attached to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Info => write!(f, "info"),
            EventLevel::Success => write!(f, "success"),
            EventLevel::Warning => write!(f, "warning"),
            EventLevel::Error => write!(f, "error"),
        }
    }
}

/// Terminal state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Already in the processed ledger; nothing was done
    Skipped,
    /// Moved to the archive under its canonical name
    Archived {
        archive_name: String,
        record_count: usize,
    },
    /// Validate-only pass found no problems; nothing was moved
    Validated { record_count: usize },
    /// Naming or content defects; moved to the error location
    Rejected { reason: String, defect_count: usize },
    /// I/O failure; the file stays eligible for a future run
    Failed { error: String },
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Skipped => "skipped",
            FileOutcome::Archived { .. } => "archived",
            FileOutcome::Validated { .. } => "validated",
            FileOutcome::Rejected { .. } => "rejected",
            FileOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, FileOutcome::Rejected { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Skipped => write!(f, "skipped (already processed)"),
            FileOutcome::Archived {
                archive_name,
                record_count,
            } => write!(f, "archived as {} ({} records)", archive_name, record_count),
            FileOutcome::Validated { record_count } => {
                write!(f, "valid ({} records)", record_count)
            }
            FileOutcome::Rejected {
                reason,
                defect_count,
            } => write!(f, "rejected: {} ({} errors)", reason, defect_count),
            FileOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Per-run tally of terminal states
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub skipped: usize,
    pub archived: usize,
    pub validated: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Outcome per remote filename, in processing order
    pub files: Vec<(String, FileOutcome)>,
}

impl RunSummary {
    pub fn record(&mut self, filename: impl Into<String>, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Archived { .. } => self.archived += 1,
            FileOutcome::Validated { .. } => self.validated += 1,
            FileOutcome::Rejected { .. } => self.rejected += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.files.push((filename.into(), outcome));
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// True when no file was rejected or failed
    pub fn is_clean(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// Status event emitted while a file moves through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Started { filename: String },
    Skipped { filename: String },
    Downloaded { filename: String, bytes: u64 },
    FilenameChecked { filename: String, valid: bool },
    ContentChecked {
        filename: String,
        record_count: usize,
        defect_count: usize,
    },
    Archived {
        filename: String,
        archive_name: String,
        record_count: usize,
    },
    Rejected {
        filename: String,
        reason: String,
        defect_count: usize,
    },
    Failed { filename: String, error: String },
    AuditLogged { line: String },
}

impl PipelineEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            PipelineEvent::Started { .. } | PipelineEvent::ContentChecked { .. } => {
                EventLevel::Info
            }
            PipelineEvent::Skipped { .. } => EventLevel::Warning,
            PipelineEvent::Downloaded { .. } | PipelineEvent::Archived { .. } => {
                EventLevel::Success
            }
            PipelineEvent::FilenameChecked { valid, .. } => {
                if *valid {
                    EventLevel::Success
                } else {
                    EventLevel::Error
                }
            }
            PipelineEvent::Rejected { .. }
            | PipelineEvent::Failed { .. }
            | PipelineEvent::AuditLogged { .. } => EventLevel::Error,
        }
    }

    /// Human-readable status line
    pub fn message(&self) -> String {
        match self {
            PipelineEvent::Started { filename } => format!("Processing: {}", filename),
            PipelineEvent::Skipped { filename } => {
                format!("Skipping: {} (already processed)", filename)
            }
            PipelineEvent::Downloaded { filename, bytes } => {
                format!("Downloaded {} ({} bytes)", filename, bytes)
            }
            PipelineEvent::FilenameChecked { valid: true, .. } => {
                "Filename pattern valid".to_string()
            }
            PipelineEvent::FilenameChecked { valid: false, .. } => {
                "Invalid filename pattern".to_string()
            }
            PipelineEvent::ContentChecked {
                record_count,
                defect_count,
                ..
            } => format!(
                "Valid records: {}, errors found: {}",
                record_count, defect_count
            ),
            PipelineEvent::Archived {
                archive_name,
                record_count,
                ..
            } => format!("Archived as: {} ({} records)", archive_name, record_count),
            PipelineEvent::Rejected {
                reason,
                defect_count,
                ..
            } => format!("Rejected - {} ({} errors)", reason, defect_count),
            PipelineEvent::Failed { filename, error } => {
                format!("Fatal error on {}: {}", filename, error)
            }
            PipelineEvent::AuditLogged { line } => line.trim_end().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_tally() {
        let mut summary = RunSummary::default();
        summary.record("a.csv", FileOutcome::Skipped);
        summary.record(
            "b.csv",
            FileOutcome::Rejected {
                reason: "Invalid filename pattern".into(),
                defect_count: 1,
            },
        );
        summary.record(
            "c.csv",
            FileOutcome::Archived {
                archive_name: "CLINICALDATA20250115.CSV".into(),
                record_count: 4,
            },
        );

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.archived, 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_event_levels() {
        let skipped = PipelineEvent::Skipped {
            filename: "x.csv".into(),
        };
        assert_eq!(skipped.level(), EventLevel::Warning);
        assert!(skipped.message().contains("already processed"));

        let bad_name = PipelineEvent::FilenameChecked {
            filename: "x.csv".into(),
            valid: false,
        };
        assert_eq!(bad_name.level(), EventLevel::Error);
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_string(&FileOutcome::Skipped).unwrap();
        assert_eq!(json, r#"{"state":"skipped"}"#);
    }
}
