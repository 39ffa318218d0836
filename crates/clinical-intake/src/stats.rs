//! Directory statistics
//!
//! Counts what previous runs left behind: archived files, rejected files and
//! audit log entries.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use crate::audit::{AuditLogger, AUDIT_LOG_FILENAME};
use crate::client::CorrelationTokens;
use crate::config::IntakeConfig;
use crate::error::Result;
use crate::ledger::ProcessedLedger;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeStats {
    /// Files in the archive directory
    pub archived_files: usize,
    /// Files in the error directory, not counting the audit log
    pub error_files: usize,
    /// Parsed lines in the audit log
    pub audit_entries: usize,
    /// Names in the processed-file ledger
    pub processed_files: usize,
}

impl IntakeStats {
    /// Gather counts; missing directories count as empty
    pub fn collect(config: &IntakeConfig) -> Result<Self> {
        let archived_files = count_files(&config.archive_dir, |_| true)?;
        let error_files = count_files(&config.error_dir, |name| name != AUDIT_LOG_FILENAME)?;
        let audit_entries = AuditLogger::new(&config.error_dir, CorrelationTokens::local())
            .entries()?
            .len();
        let processed_files = ProcessedLedger::load(config.ledger_path())?.len();

        Ok(Self {
            archived_files,
            error_files,
            audit_entries,
            processed_files,
        })
    }
}

fn count_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if keep(&entry.file_name().to_string_lossy()) {
            count += 1;
        }
    }
    Ok(count)
}
