//! Content validation engine
//!
//! Decodes a CSV byte stream, checks the header against the fixed schema and
//! runs every registered [`RowRule`] over each data row. The engine never
//! fails: decode and I/O errors become a single `File read error` defect.
//!
//! Rows are split on unquoted line breaks before decoding, so a blank line
//! is a row with zero fields rather than being skipped.

pub mod filename;
pub mod rules;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};

use crate::contracts::{ClinicalRecord, Defect, ValidationReport, FIELD_COUNT, SCHEMA_FIELDS};
use rules::bounds::DosageRule;
use rules::dates::DateRangeRule;
use rules::{PassState, RowFields, RowRule};

pub use filename::is_valid_filename;

pub const INVALID_HEADER: &str = "Invalid header structure";
pub const EMPTY_FILE: &str = "File is empty";

/// Validates clinical trial CSV content against the nine-column schema
pub struct ContentValidator {
    rules: Vec<Arc<dyn RowRule>>,
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentValidator {
    /// Create a validator with the default rule set
    pub fn new() -> Self {
        let mut validator = Self::empty();
        validator.register_default_rules();
        validator
    }

    /// Create a validator with no row rules; only header and field counts are checked
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register default rules; order fixes the message order within a row
    fn register_default_rules(&mut self) {
        self.register(Arc::new(rules::required::RequiredFieldsRule::new()));
        self.register(Arc::new(DosageRule::new()));
        self.register(Arc::new(DateRangeRule::new()));
        self.register(Arc::new(rules::enum_check::OutcomeRule::new()));
        self.register(Arc::new(rules::duplicate::DuplicateRecordRule::new()));
    }

    pub fn register(&mut self, rule: Arc<dyn RowRule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn RowRule>] {
        &self.rules
    }

    /// Validate an in-memory CSV document
    pub fn validate_bytes(&self, bytes: &[u8]) -> ValidationReport {
        self.validate(bytes)
    }

    /// Validate a staged file on disk
    pub fn validate_path(&self, path: &Path) -> ValidationReport {
        match File::open(path) {
            Ok(file) => self.validate(file),
            Err(e) => ValidationReport::rejected(format!("File read error: {}", e)),
        }
    }

    /// Validate any CSV byte stream
    pub fn validate<R: Read>(&self, reader: R) -> ValidationReport {
        self.run(reader, |_| {})
    }

    /// Validate and also return the clean rows as typed records
    pub fn validate_collect<R: Read>(&self, reader: R) -> (ValidationReport, Vec<ClinicalRecord>) {
        let mut records = Vec::new();
        let report = self.run(reader, |record| records.push(record));
        // a read error part-way through discards rows seen before it
        if report.record_count == 0 {
            records.clear();
        }
        (report, records)
    }

    fn run<R, F>(&self, mut reader: R, on_clean: F) -> ValidationReport
    where
        R: Read,
        F: FnMut(ClinicalRecord),
    {
        let mut bytes = Vec::new();
        let scanned = match reader.read_to_end(&mut bytes) {
            Ok(_) => self.scan(&bytes, on_clean),
            Err(e) => Err(e.into()),
        };

        match scanned {
            Ok(report) => {
                tracing::debug!(
                    valid = report.is_valid,
                    records = report.record_count,
                    defects = report.defect_count(),
                    "Content validation finished"
                );
                report
            }
            Err(e) => {
                tracing::debug!(error = %e, "Content could not be decoded");
                ValidationReport::rejected(format!("File read error: {}", e))
            }
        }
    }

    fn scan<F>(&self, bytes: &[u8], mut on_clean: F) -> csv::Result<ValidationReport>
    where
        F: FnMut(ClinicalRecord),
    {
        let mut records = split_rows(bytes).into_iter().map(decode_row);

        let header = match records.next() {
            Some(header) => header?,
            None => return Ok(ValidationReport::rejected(EMPTY_FILE)),
        };
        if !header_matches(&header) {
            return Ok(ValidationReport::rejected(INVALID_HEADER));
        }

        let mut pass = PassState::new();
        let mut defects = Vec::new();
        let mut record_count = 0usize;

        for (index, record) in records.enumerate() {
            let record = record?;
            let row_number = index + 2;

            let row = match RowFields::from_iter(row_number, record.iter()) {
                Some(row) => row,
                None => {
                    defects.push(Defect::row(
                        row_number,
                        vec![format!("Expected {} fields, got {}", FIELD_COUNT, record.len())],
                    ));
                    continue;
                }
            };

            let messages: Vec<String> = self
                .rules
                .iter()
                .flat_map(|rule| rule.evaluate(&row, &mut pass))
                .collect();

            if messages.is_empty() {
                record_count += 1;
                if let Some(clean) = to_record(&row) {
                    on_clean(clean);
                }
            } else {
                defects.push(Defect::row(row_number, messages));
            }
        }

        Ok(ValidationReport::new(record_count, defects))
    }
}

/// Split raw content into rows at line breaks outside quoted fields
///
/// Each slice keeps its terminator. A quote only opens a quoted field at the
/// start of a field, and `""` inside one is an escaped quote.
fn split_rows(bytes: &[u8]) -> Vec<&[u8]> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else {
            match b {
                b'"' if field_start => {
                    in_quotes = true;
                    field_start = false;
                }
                b',' => field_start = true,
                b'\n' => {
                    rows.push(&bytes[start..=i]);
                    start = i + 1;
                    field_start = true;
                }
                _ => field_start = false,
            }
        }
        i += 1;
    }

    if start < bytes.len() {
        rows.push(&bytes[start..]);
    }
    rows
}

/// Decode one row; a blank line has no fields
fn decode_row(raw: &[u8]) -> csv::Result<StringRecord> {
    let mut record = StringRecord::new();
    let content = raw.strip_suffix(b"\n").unwrap_or(raw);
    let content = content.strip_suffix(b"\r").unwrap_or(content);
    if content.is_empty() {
        return Ok(record);
    }

    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content)
        .read_record(&mut record)?;
    Ok(record)
}

fn header_matches(header: &StringRecord) -> bool {
    header.len() == SCHEMA_FIELDS.len()
        && header.iter().zip(SCHEMA_FIELDS.iter()).all(|(got, want)| got == *want)
}

/// Typed record for a row that passed every rule
fn to_record(row: &RowFields<'_>) -> Option<ClinicalRecord> {
    Some(ClinicalRecord {
        patient_id: row.patient_id().to_string(),
        trial_code: row.trial_code().to_string(),
        drug_code: row.drug_code().to_string(),
        dosage_mg: DosageRule::parse(row.dosage())?,
        start_date: DateRangeRule::parse(row.start_date())?,
        end_date: DateRangeRule::parse(row.end_date())?,
        outcome: row.outcome().parse().ok()?,
        side_effects: row.side_effects().to_string(),
        analyst: row.analyst().to_string(),
    })
}
