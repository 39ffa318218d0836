//! Clinical Intake Contract Definitions
//!
//! Data shapes shared by the validator, the router and any presentation
//! layer:
//! - `ClinicalRecord` for one clean CSV row
//! - `ValidationReport` and `Defect` for the verdict on one file
//! - `FileOutcome`, `RunSummary` and `PipelineEvent` (see [`events`]) for
//!   routing results
//!
//! Records are transient. Only the verdict and its defect list survive a
//! validation pass.

pub mod events;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use events::{EventLevel, FileOutcome, PipelineEvent, RunSummary};

/// Column names expected in the header row, in order
pub const SCHEMA_FIELDS: [&str; 9] = [
    "PatientID",
    "TrialCode",
    "DrugCode",
    "Dosage_mg",
    "StartDate",
    "EndDate",
    "Outcome",
    "SideEffects",
    "Analyst",
];

/// Number of fields in every data row
pub const FIELD_COUNT: usize = SCHEMA_FIELDS.len();

/// Calendar format for `StartDate` and `EndDate`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trial outcome recorded for a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "Improved")]
    Improved,
    #[serde(rename = "No Change")]
    NoChange,
    #[serde(rename = "Worsened")]
    Worsened,
}

impl Outcome {
    /// Literal values accepted in the `Outcome` column
    pub const LITERALS: [&'static str; 3] = ["Improved", "No Change", "Worsened"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Improved => "Improved",
            Outcome::NoChange => "No Change",
            Outcome::Worsened => "Worsened",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    /// Exact, case-sensitive match against the literals
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Improved" => Ok(Outcome::Improved),
            "No Change" => Ok(Outcome::NoChange),
            "Worsened" => Ok(Outcome::Worsened),
            other => Err(format!("Invalid outcome: {}", other)),
        }
    }
}

/// One data row that passed every field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub patient_id: String,
    pub trial_code: String,
    pub drug_code: String,
    pub dosage_mg: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub outcome: Outcome,
    pub side_effects: String,
    pub analyst: String,
}

impl ClinicalRecord {
    /// Composite key used for duplicate detection within one file
    pub fn composite_key(&self) -> String {
        composite_key(&self.patient_id, &self.trial_code, &self.drug_code)
    }
}

/// Underscore-joined `PatientID_TrialCode_DrugCode`
pub fn composite_key(patient_id: &str, trial_code: &str, drug_code: &str) -> String {
    format!("{}_{}_{}", patient_id, trial_code, drug_code)
}

/// A problem found in a file
///
/// Row-level defects carry the 1-based row number (the header is row 1).
/// File-level defects such as a bad header have no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub messages: Vec<String>,
}

impl Defect {
    /// Defect that applies to the whole file
    pub fn file(message: impl Into<String>) -> Self {
        Self {
            row: None,
            messages: vec![message.into()],
        }
    }

    /// Aggregated defect for one row
    pub fn row(row: usize, messages: Vec<String>) -> Self {
        Self {
            row: Some(row),
            messages,
        }
    }

    /// Whether any message contains the given text
    pub fn mentions(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.contains(text))
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {}: {}", row, self.messages.join(", ")),
            None => f.write_str(&self.messages.join(", ")),
        }
    }
}

/// Verdict on one file's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff no defects were found
    pub is_valid: bool,
    /// Rows with zero defects
    pub record_count: usize,
    /// Defects in the order they were found
    pub defects: Vec<Defect>,
}

impl ValidationReport {
    /// Report built from the row pass; validity follows the defect list
    pub fn new(record_count: usize, defects: Vec<Defect>) -> Self {
        Self {
            is_valid: defects.is_empty(),
            record_count,
            defects,
        }
    }

    /// Report for a file rejected before any row was counted
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            record_count: 0,
            defects: vec![Defect::file(message)],
        }
    }

    pub fn defect_count(&self) -> usize {
        self.defects.len()
    }

    /// One rendered line per defect, as written to the audit log
    pub fn defect_lines(&self) -> Vec<String> {
        self.defects.iter().map(ToString::to_string).collect()
    }
}
