//! File router
//!
//! Drives one remote file at a time through
//! `ledger gate -> download -> filename check -> content check` and commits
//! exactly one terminal side effect: archive (plus ledger entry), move to the
//! error directory, or nothing. Every failure path writes to the audit log
//! under the canonical `CLINICALDATA<YYYYMMDD>.CSV` name.
//!
//! Progress is reported through [`PipelineEvent`]s on an optional unbounded
//! channel; the router never waits on a consumer.

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::audit::AuditLogger;
use crate::client::CorrelationTokens;
use crate::config::IntakeConfig;
use crate::contracts::events::{FileOutcome, PipelineEvent, RunSummary};
use crate::engine::{is_valid_filename, ContentValidator};
use crate::error::{IntakeError, Result};
use crate::ledger::ProcessedLedger;
use crate::source::RemoteSource;
use crate::telemetry::IntakeMetrics;

pub const INVALID_FILENAME: &str = "Invalid filename pattern";
pub const INVALID_CONTENT: &str = "Invalid content";

/// Prefix of the staging name used by validate-only passes
pub const VALIDATE_PREFIX: &str = "temp_validate_";

/// Archive and audit name for a processing date: `CLINICALDATA<YYYYMMDD>.CSV`
pub fn canonical_name(date: NaiveDate) -> String {
    format!("CLINICALDATA{}.CSV", date.format("%Y%m%d"))
}

/// Local name for a renamed fetch: `CLINICALDATA_<YYYYMMDD>.CSV`
pub fn fetched_name(date: NaiveDate) -> String {
    format!("CLINICALDATA_{}.CSV", date.format("%Y%m%d"))
}

pub struct FileRouter {
    download_dir: PathBuf,
    archive_dir: PathBuf,
    error_dir: PathBuf,
    validator: ContentValidator,
    ledger: ProcessedLedger,
    audit: AuditLogger,
    events: Option<UnboundedSender<PipelineEvent>>,
    metrics: Option<Arc<IntakeMetrics>>,
    processing_date: Option<NaiveDate>,
}

impl FileRouter {
    /// Build a router from configuration; tokens follow `token_endpoint`
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        let tokens =
            CorrelationTokens::from_endpoint(config.token_endpoint.as_deref(), config.token_timeout_ms);
        Self::with_tokens(config, tokens)
    }

    /// Build a router with an explicit token source
    pub fn with_tokens(config: &IntakeConfig, tokens: CorrelationTokens) -> Result<Self> {
        config.ensure_directories()?;
        let ledger = ProcessedLedger::load(config.ledger_path())?;

        Ok(Self {
            download_dir: config.download_dir.clone(),
            archive_dir: config.archive_dir.clone(),
            error_dir: config.error_dir.clone(),
            validator: ContentValidator::new(),
            ledger,
            audit: AuditLogger::new(&config.error_dir, tokens),
            events: None,
            metrics: None,
            processing_date: None,
        })
    }

    /// Send status events to `tx`
    pub fn with_events(mut self, tx: UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<IntakeMetrics>) -> Self {
        self.audit = self.audit.with_metrics(Arc::clone(&metrics));
        self.metrics = Some(metrics);
        self
    }

    /// Pin the processing date instead of reading the local clock
    pub fn with_processing_date(mut self, date: NaiveDate) -> Self {
        self.processing_date = Some(date);
        self
    }

    pub fn processing_date(&self) -> NaiveDate {
        self.processing_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn canonical_name(&self) -> String {
        canonical_name(self.processing_date())
    }

    pub fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Route one remote file to the archive or the error directory
    pub async fn process_file<S>(&mut self, source: &S, filename: &str) -> FileOutcome
    where
        S: RemoteSource + ?Sized,
    {
        if self.ledger.contains(filename) {
            return self.skip(filename);
        }

        self.emit(PipelineEvent::Started {
            filename: filename.to_string(),
        });
        let log_name = self.canonical_name();

        let staged = match self.staging_path(filename, "") {
            Ok(path) => path,
            Err(e) => return self.fail(filename, &log_name, "Processing error", e).await,
        };

        let result = match source.retrieve(filename, &staged).await {
            Ok(bytes) => {
                self.emit(PipelineEvent::Downloaded {
                    filename: filename.to_string(),
                    bytes,
                });
                self.route_staged(filename, &staged, &log_name).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                self.record_outcome(&outcome);
                outcome
            }
            Err(e) => {
                remove_if_present(&staged).await;
                self.fail(filename, &log_name, "Processing error", e).await
            }
        }
    }

    async fn route_staged(
        &mut self,
        filename: &str,
        staged: &Path,
        log_name: &str,
    ) -> Result<FileOutcome> {
        if !self.check_filename(filename) {
            move_file(staged, &self.error_dir.join(filename)).await?;
            self.log(log_name, INVALID_FILENAME).await;
            return Ok(self.reject(filename, INVALID_FILENAME, 1));
        }

        let report = self.check_content(filename, staged);

        if report.is_valid {
            let archive_name = self.canonical_name();
            let target = self.archive_dir.join(&archive_name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                tracing::warn!(
                    file = filename,
                    archive = %target.display(),
                    "Archive target exists and will be replaced"
                );
            }
            move_file(staged, &target).await?;
            self.ledger.add(filename)?;

            self.emit(PipelineEvent::Archived {
                filename: filename.to_string(),
                archive_name: archive_name.clone(),
                record_count: report.record_count,
            });
            tracing::info!(file = filename, archive = %archive_name, records = report.record_count, "Archived");
            return Ok(FileOutcome::Archived {
                archive_name,
                record_count: report.record_count,
            });
        }

        move_file(staged, &self.error_dir.join(filename)).await?;
        for line in report.defect_lines() {
            self.log(log_name, &line).await;
        }
        Ok(self.reject(filename, INVALID_CONTENT, report.defect_count()))
    }

    /// Run both checks without moving anything or touching the ledger
    pub async fn validate_file<S>(&self, source: &S, filename: &str) -> FileOutcome
    where
        S: RemoteSource + ?Sized,
    {
        if self.ledger.contains(filename) {
            return self.skip(filename);
        }

        self.emit(PipelineEvent::Started {
            filename: filename.to_string(),
        });
        let log_name = self.canonical_name();

        let temp = match self.staging_path(filename, VALIDATE_PREFIX) {
            Ok(path) => path,
            Err(e) => return self.fail(filename, &log_name, "Validation error", e).await,
        };

        let outcome = match source.retrieve(filename, &temp).await {
            Ok(bytes) => {
                self.emit(PipelineEvent::Downloaded {
                    filename: filename.to_string(),
                    bytes,
                });
                self.validate_staged(filename, &temp, &log_name).await
            }
            Err(e) => {
                remove_if_present(&temp).await;
                return self.fail(filename, &log_name, "Validation error", e).await;
            }
        };

        remove_if_present(&temp).await;
        self.record_outcome(&outcome);
        outcome
    }

    async fn validate_staged(&self, filename: &str, temp: &Path, log_name: &str) -> FileOutcome {
        if !self.check_filename(filename) {
            self.log(log_name, INVALID_FILENAME).await;
            return self.reject(filename, INVALID_FILENAME, 1);
        }

        let report = self.check_content(filename, temp);
        if report.is_valid {
            return FileOutcome::Validated {
                record_count: report.record_count,
            };
        }

        for line in report.defect_lines() {
            self.log(log_name, &line).await;
        }
        self.reject(filename, INVALID_CONTENT, report.defect_count())
    }

    /// Route every `.csv` file in the drop, in name order
    ///
    /// Listing failures abort the run; a failure on one file does not.
    pub async fn process_pending<S>(&mut self, source: &mut S) -> Result<RunSummary>
    where
        S: RemoteSource + ?Sized,
    {
        source.connect().await?;
        let listing = source.list_files().await;
        let names = match listing {
            Ok(names) => pending_csv_names(names),
            Err(e) => {
                disconnect_quietly(source).await;
                return Err(e);
            }
        };

        tracing::info!(source = %source.describe(), files = names.len(), "Processing drop");
        let mut summary = RunSummary::default();
        for name in names {
            let outcome = self.process_file(&*source, &name).await;
            summary.record(name, outcome);
        }

        disconnect_quietly(source).await;
        Ok(summary)
    }

    /// Copy one remote file to `<download_dir>/CLINICALDATA_<YYYYMMDD>.CSV` without validating it
    pub async fn fetch_renamed<S>(&self, source: &S, filename: &str) -> Result<PathBuf>
    where
        S: RemoteSource + ?Sized,
    {
        let dest = self.download_dir.join(fetched_name(self.processing_date()));
        let bytes = source.retrieve(filename, &dest).await?;
        self.emit(PipelineEvent::Downloaded {
            filename: filename.to_string(),
            bytes,
        });
        Ok(dest)
    }

    fn staging_path(&self, filename: &str, prefix: &str) -> Result<PathBuf> {
        let plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);
        if !plain {
            return Err(IntakeError::invalid_input(format!(
                "Not a plain filename: {}",
                filename
            )));
        }
        Ok(self.download_dir.join(format!("{}{}", prefix, filename)))
    }

    fn check_filename(&self, filename: &str) -> bool {
        let valid = is_valid_filename(filename);
        self.emit(PipelineEvent::FilenameChecked {
            filename: filename.to_string(),
            valid,
        });
        if !valid {
            if let Some(metrics) = &self.metrics {
                metrics.record_defects("naming", 1);
            }
        }
        valid
    }

    fn check_content(&self, filename: &str, staged: &Path) -> crate::contracts::ValidationReport {
        let report = {
            let _timer = self.metrics.as_ref().map(|m| m.start_validation_timer());
            self.validator.validate_path(staged)
        };

        self.emit(PipelineEvent::ContentChecked {
            filename: filename.to_string(),
            record_count: report.record_count,
            defect_count: report.defect_count(),
        });
        if let Some(metrics) = &self.metrics {
            metrics.record_defects("content", report.defect_count());
        }
        report
    }

    fn skip(&self, filename: &str) -> FileOutcome {
        tracing::info!(file = filename, "Already processed, skipping");
        self.emit(PipelineEvent::Skipped {
            filename: filename.to_string(),
        });
        let outcome = FileOutcome::Skipped;
        self.record_outcome(&outcome);
        outcome
    }

    fn reject(&self, filename: &str, reason: &str, defect_count: usize) -> FileOutcome {
        tracing::info!(file = filename, reason, defects = defect_count, "Rejected");
        self.emit(PipelineEvent::Rejected {
            filename: filename.to_string(),
            reason: reason.to_string(),
            defect_count,
        });
        FileOutcome::Rejected {
            reason: reason.to_string(),
            defect_count,
        }
    }

    async fn fail(
        &self,
        filename: &str,
        log_name: &str,
        context: &str,
        error: IntakeError,
    ) -> FileOutcome {
        tracing::error!(file = filename, error = %error, "{}", context);
        self.log(log_name, &format!("{}: {}", context, error)).await;
        self.emit(PipelineEvent::Failed {
            filename: filename.to_string(),
            error: error.to_string(),
        });
        let outcome = FileOutcome::Failed {
            error: error.to_string(),
        };
        self.record_outcome(&outcome);
        outcome
    }

    async fn log(&self, subject: &str, message: &str) {
        let line = self.audit.log_error(subject, message).await;
        self.emit(PipelineEvent::AuditLogged { line });
    }

    fn record_outcome(&self, outcome: &FileOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome.label());
        }
    }

    fn emit(&self, event: PipelineEvent) {
        tracing::debug!(status = %event.level(), "{}", event.message());
        if let Some(tx) = &self.events {
            // a dropped receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }
}

/// Keep names ending in `.csv` (any case), sorted
pub fn pending_csv_names(names: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().ends_with(".csv"))
        .collect();
    names.sort();
    names
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // rename cannot cross filesystems; fall back to copy + remove
            tokio::fs::copy(from, to).await.map_err(|_| rename_err)?;
            tokio::fs::remove_file(from).await?;
            Ok(())
        }
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file"),
    }
}

async fn disconnect_quietly<S: RemoteSource + ?Sized>(source: &mut S) {
    if let Err(e) = source.disconnect().await {
        tracing::warn!(source = %source.describe(), error = %e, "Disconnect failed");
    }
}
