//! Integration tests for the clinical intake pipeline
//!
//! Exercises the public API end to end:
//! - Routing through a directory drop (archive, reject, skip, fail)
//! - Audit log lines with remote and fallback correlation tokens
//! - Batch runs, events and metrics
//! - Directory statistics

use chrono::NaiveDate;
use clinical_intake::audit::AUDIT_LOG_FILENAME;
use clinical_intake::client::token::is_token_shaped;
use clinical_intake::{
    ContentValidator, CorrelationTokens, DirectorySource, FileOutcome, FileRouter,
    IntakeConfig, IntakeMetricsRegistry, IntakeStats, PipelineEvent,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str =
    "PatientID,TrialCode,DrugCode,Dosage_mg,StartDate,EndDate,Outcome,SideEffects,Analyst";
const GOOD_ROW: &str = "P001,T001,D001,100,2024-01-01,2024-01-31,Improved,None,Dr. Smith";
const NEGATIVE_DOSAGE_ROW: &str =
    "P001,T001,D001,-50,2024-01-01,2024-01-31,Improved,None,Dr. Smith";
const VALID_NAME: &str = "CLINICALDATA_20250115120000.csv";

/// Helper holding a temporary intake layout
struct Layout {
    _root: TempDir,
    config: IntakeConfig,
}

impl Layout {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = IntakeConfig::builder().base_dir(root.path()).build();
        std::fs::create_dir_all(&config.source_dir).unwrap();
        Self {
            _root: root,
            config,
        }
    }

    fn with_endpoint(endpoint: String) -> Self {
        let mut layout = Self::new();
        layout.config.token_endpoint = Some(endpoint);
        layout.config.token_timeout_ms = 500;
        layout
    }

    fn drop_file(&self, name: &str, rows: &[&str]) {
        let mut body = String::from(HEADER);
        body.push('\n');
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        std::fs::write(self.config.source_dir.join(name), body).unwrap();
    }

    fn source(&self) -> DirectorySource {
        DirectorySource::new(&self.config.source_dir)
    }

    fn router(&self) -> FileRouter {
        FileRouter::new(&self.config)
            .unwrap()
            .with_processing_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    fn audit_text(&self) -> String {
        std::fs::read_to_string(self.config.error_dir.join(AUDIT_LOG_FILENAME)).unwrap_or_default()
    }
}

#[test]
fn test_scenario_a_single_clean_row() {
    let report =
        ContentValidator::new().validate_bytes(format!("{}\n{}\n", HEADER, GOOD_ROW).as_bytes());

    assert!(report.is_valid);
    assert_eq!(report.record_count, 1);
    assert!(report.defects.is_empty());
}

#[test]
fn test_scenario_b_negative_dosage() {
    let report = ContentValidator::new()
        .validate_bytes(format!("{}\n{}\n", HEADER, NEGATIVE_DOSAGE_ROW).as_bytes());

    assert!(!report.is_valid);
    assert_eq!(report.record_count, 0);
    assert_eq!(report.defects.len(), 1);
    assert!(report.defects[0].mentions("Invalid dosage"));
}

#[tokio::test]
async fn test_scenario_c_wrong_name_moved_unchanged() {
    let layout = Layout::new();
    layout.drop_file("wrongname.csv", &[GOOD_ROW]);
    let original = std::fs::read(layout.config.source_dir.join("wrongname.csv")).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut router = layout.router().with_events(tx);
    let outcome = router.process_file(&layout.source(), "wrongname.csv").await;
    drop(router);

    assert!(outcome.is_rejected());
    let moved = std::fs::read(layout.config.error_dir.join("wrongname.csv")).unwrap();
    assert_eq!(moved, original);
    assert!(layout.audit_text().contains("Invalid filename pattern"));

    let mut saw_content_check = false;
    while let Some(event) = rx.recv().await {
        if matches!(event, PipelineEvent::ContentChecked { .. }) {
            saw_content_check = true;
        }
    }
    assert!(!saw_content_check);
}

#[tokio::test]
async fn test_valid_drop_archived_once() {
    let layout = Layout::new();
    layout.drop_file(VALID_NAME, &[GOOD_ROW]);
    let source = layout.source();
    let mut router = layout.router();

    let first = router.process_file(&source, VALID_NAME).await;
    let second = router.process_file(&source, VALID_NAME).await;

    assert_eq!(
        first,
        FileOutcome::Archived {
            archive_name: "CLINICALDATA20250115.CSV".to_string(),
            record_count: 1,
        }
    );
    assert_eq!(second, FileOutcome::Skipped);

    let ledger = std::fs::read_to_string(layout.config.ledger_path()).unwrap();
    assert_eq!(ledger, format!("{}\n", VALID_NAME));
    assert_eq!(layout.audit_text(), "");
}

#[tokio::test]
async fn test_rejected_content_writes_one_line_per_defect() {
    let layout = Layout::new();
    layout.drop_file(
        VALID_NAME,
        &[
            NEGATIVE_DOSAGE_ROW,
            "P002,T001,D001,10,2024-01-01,2024-01-31,Cured,None,Dr. Smith",
            "P003,T001,D001,10,2024-01-01,2024-01-31,Worsened,None,Dr. Smith",
        ],
    );
    let mut router = layout.router();

    let outcome = router.process_file(&layout.source(), VALID_NAME).await;

    assert_eq!(
        outcome,
        FileOutcome::Rejected {
            reason: "Invalid content".to_string(),
            defect_count: 2,
        }
    );
    let text = layout.audit_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("| File: CLINICALDATA20250115.CSV | Error: Row 2: Invalid dosage: -50"));
    assert!(lines[1].ends_with("Error: Row 3: Invalid outcome: Cured"));
    assert!(!router.ledger().contains(VALID_NAME));
}

#[tokio::test]
async fn test_remote_token_used_in_audit_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/generate/v4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!(["bbe77b81-5a21-426f-b2bf-99df83c163e1"])),
        )
        .mount(&server)
        .await;

    let layout = Layout::with_endpoint(format!("{}/api/generate/v4", server.uri()));
    layout.drop_file("wrongname.csv", &[GOOD_ROW]);
    let registry = IntakeMetricsRegistry::new().unwrap();
    let mut router = layout.router().with_metrics(registry.intake());

    router.process_file(&layout.source(), "wrongname.csv").await;

    assert!(layout
        .audit_text()
        .contains("GUID: bbe77b81-5a21-426f-b2bf-99df83c163e1 | File: CLINICALDATA20250115.CSV"));
    assert_eq!(registry.intake().token_fallbacks(), 0.0);
}

#[tokio::test]
async fn test_token_endpoint_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let layout = Layout::with_endpoint(server.uri());
    layout.drop_file("wrongname.csv", &[GOOD_ROW]);
    let registry = IntakeMetricsRegistry::new().unwrap();
    let mut router = layout.router().with_metrics(registry.intake());

    router.process_file(&layout.source(), "wrongname.csv").await;

    let entries = router.audit().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(is_token_shaped(&entries[0].correlation_id));
    assert_eq!(registry.intake().token_fallbacks(), 1.0);
}

#[tokio::test]
async fn test_malformed_and_slow_token_responses_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/malformed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["bbe77b81-5a21-426f-b2bf-99df83c163e1"]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    for endpoint in ["/malformed", "/slow"] {
        let url = format!("{}{}", server.uri(), endpoint);
        let tokens = CorrelationTokens::from_endpoint(Some(url.as_str()), 200);
        let grant = tokens.next().await;
        assert!(grant.fallback, "{} should fall back", endpoint);
        assert!(is_token_shaped(&grant.token));
        assert_ne!(grant.token, "bbe77b81-5a21-426f-b2bf-99df83c163e1");
    }
}

#[tokio::test]
async fn test_missing_remote_file_fails_without_ledger_entry() {
    let layout = Layout::new();
    let mut router = layout.router();

    let outcome = router.process_file(&layout.source(), VALID_NAME).await;

    assert!(outcome.is_failed());
    assert!(router.ledger().is_empty());
    assert!(!layout.config.ledger_path().exists());
    assert!(layout.audit_text().contains("Error: Processing error: Transport error:"));
}

#[tokio::test]
async fn test_process_pending_continues_past_bad_files() {
    let layout = Layout::new();
    layout.drop_file("CLINICALDATA_20250101000000.csv", &[NEGATIVE_DOSAGE_ROW]);
    layout.drop_file("CLINICALDATA_20250102000000.CSV", &[GOOD_ROW]);
    layout.drop_file("notes.csv", &[GOOD_ROW]);
    std::fs::write(layout.config.source_dir.join("README.txt"), "ignored").unwrap();

    let mut source = layout.source();
    let mut router = layout.router();
    let summary = router.process_pending(&mut source).await.unwrap();

    let names: Vec<&str> = summary.files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "CLINICALDATA_20250101000000.csv",
            "CLINICALDATA_20250102000000.CSV",
            "notes.csv",
        ]
    );
    assert_eq!(summary.archived, 1);
    assert_eq!(summary.rejected, 2);
    assert!(!summary.is_clean());

    // a second run only skips
    let rerun = router.process_pending(&mut source).await.unwrap();
    assert_eq!(rerun.skipped, 1);
    assert_eq!(rerun.archived, 0);
}

#[tokio::test]
async fn test_process_pending_missing_drop_is_error() {
    let layout = Layout::new();
    let mut source = DirectorySource::new(layout.config.source_dir.join("absent"));
    let mut router = layout.router();

    let err = router.process_pending(&mut source).await.unwrap_err();
    assert!(err.is_file_error());
}

#[tokio::test]
async fn test_stats_after_mixed_run() {
    let layout = Layout::new();
    layout.drop_file(VALID_NAME, &[GOOD_ROW]);
    layout.drop_file("wrongname.csv", &[GOOD_ROW]);

    let mut source = layout.source();
    layout.router().process_pending(&mut source).await.unwrap();

    let stats = IntakeStats::collect(&layout.config).unwrap();
    assert_eq!(stats.archived_files, 1);
    assert_eq!(stats.error_files, 1);
    assert_eq!(stats.audit_entries, 1);
    assert_eq!(stats.processed_files, 1);
}

#[test]
fn test_validate_only_pass_blocking() {
    let layout = Layout::new();
    layout.drop_file(VALID_NAME, &[GOOD_ROW, GOOD_ROW]);
    let router = layout.router();

    let outcome = tokio_test::block_on(router.validate_file(&layout.source(), VALID_NAME));

    assert_eq!(
        outcome,
        FileOutcome::Rejected {
            reason: "Invalid content".to_string(),
            defect_count: 1,
        }
    );
    assert!(layout.config.source_dir.join(VALID_NAME).exists());
    assert!(!layout.config.error_dir.join(VALID_NAME).exists());
    assert!(layout.audit_text().contains("Row 3: Duplicate record"));
}
