//! Clinical Trial Intake
//!
//! Ingests clinical trial CSV drops, validates naming and content against a
//! strict schema and routes each file to an archive or error location while
//! recording a correlation-tagged audit trail.
//!
//! ## Architecture
//!
//! 1. **Engine** (`engine/`): filename contract and the row-rule content
//!    validator.
//! 2. **Ledger** (`ledger`): processed-file set persisted between runs.
//! 3. **Audit** (`audit/`): append-only error log with correlation tokens
//!    from **Client** (`client/`), falling back to local UUIDs.
//! 4. **Router** (`router`): the per-file state machine tying it together
//!    over a **Source** (`source`).
//! 5. **CLI** (`cli/`), **Config** (`config`), **Stats** (`stats`) and
//!    **Telemetry** (`telemetry/`) around the core.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Route every pending file in the drop
//! clinical-intake --source-dir /srv/drop process
//!
//! # Dry-run one file
//! clinical-intake validate CLINICALDATA_20250115120000.csv
//!
//! # Check a local file and show its clean records
//! clinical-intake inspect ./sample.csv --records --format json
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use clinical_intake::{DirectorySource, FileRouter, IntakeConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = IntakeConfig::builder().base_dir("/srv/intake").build();
//!     let mut router = FileRouter::new(&config).unwrap();
//!     let mut source = DirectorySource::new(&config.source_dir);
//!
//!     let summary = router.process_pending(&mut source).await.unwrap();
//!     println!("{} archived, {} rejected", summary.archived, summary.rejected);
//! }
//! ```

pub mod audit;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod router;
pub mod source;
pub mod stats;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use audit::{AuditLogEntry, AuditLogger};
pub use cli::{ExitCode, IntakeCli, IntakeCommands, OutputFormat};
pub use client::{CorrelationTokens, HttpTokenClient, LocalTokenSource, TokenSource};
pub use config::IntakeConfig;
pub use contracts::events::{FileOutcome, PipelineEvent, RunSummary};
pub use contracts::{ClinicalRecord, Defect, Outcome, ValidationReport};
pub use engine::{is_valid_filename, ContentValidator};
pub use error::{IntakeError, Result};
pub use ledger::ProcessedLedger;
pub use router::FileRouter;
pub use source::{DirectorySource, RemoteSource};
pub use stats::IntakeStats;
pub use telemetry::{IntakeMetrics, IntakeMetricsRegistry};

/// Run the CLI application
///
/// This is the main entry point for the CLI binary.
pub fn run_cli(cli: IntakeCli) -> ExitCode {
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
