//! Append-only audit trail
//!
//! `AuditLogger::log_error` never fails: token problems fall back to a local
//! identifier and append failures come back as a `Logging failed: ...`
//! line instead of an error.

pub mod entry;

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use crate::client::CorrelationTokens;
use crate::error::Result;
use crate::telemetry::IntakeMetrics;

pub use entry::{AuditLogEntry, TIMESTAMP_FORMAT};

/// Audit log filename inside the error directory
pub const AUDIT_LOG_FILENAME: &str = "error_report.log";

pub struct AuditLogger {
    path: PathBuf,
    tokens: CorrelationTokens,
    metrics: Option<Arc<IntakeMetrics>>,
}

impl AuditLogger {
    /// Logger writing to `<error_dir>/error_report.log`
    pub fn new(error_dir: impl AsRef<Path>, tokens: CorrelationTokens) -> Self {
        Self::at_path(error_dir.as_ref().join(AUDIT_LOG_FILENAME), tokens)
    }

    pub fn at_path(path: impl Into<PathBuf>, tokens: CorrelationTokens) -> Self {
        Self {
            path: path.into(),
            tokens,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<IntakeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one correlation-tagged line and return it (without newline)
    pub async fn log_error(&self, filename: &str, message: &str) -> String {
        let grant = self.tokens.next().await;
        if grant.fallback {
            if let Some(metrics) = &self.metrics {
                metrics.record_token_fallback();
            }
        }

        let line = AuditLogEntry::now(grant.token, single_line(filename), single_line(message))
            .to_string();
        match self.append(&line).await {
            Ok(()) => {
                tracing::warn!(file = filename, error = message, "{}", line);
                line
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to append audit entry");
                format!("Logging failed: {}", e)
            }
        }
    }

    async fn append(&self, line: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await
    }

    /// Read the log back; lines not in audit format are skipped
    pub fn entries(&self) -> Result<Vec<AuditLogEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.lines().filter_map(AuditLogEntry::parse_line).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Escape line breaks so every entry stays on one line
fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}
