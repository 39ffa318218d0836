//! Row rule framework for content validation
//!
//! Each rule inspects one data row and returns zero or more defect
//! messages. Rules run in registration order and their messages are joined
//! into a single defect for the row, so the order of registration is the
//! order messages appear in the audit log.

pub mod bounds;
pub mod dates;
pub mod duplicate;
pub mod enum_check;
pub mod required;

use std::fmt;

use crate::contracts::FIELD_COUNT;
pub use duplicate::DuplicateTracker;

/// Categories of row rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Every field present and non-blank
    Required,
    /// Numeric limits
    Bounds,
    /// Calendar formats and ordering
    Temporal,
    /// Value drawn from a fixed set
    Enum,
    /// Uniqueness within one pass
    Duplicate,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Required => write!(f, "required"),
            RuleCategory::Bounds => write!(f, "bounds"),
            RuleCategory::Temporal => write!(f, "temporal"),
            RuleCategory::Enum => write!(f, "enum"),
            RuleCategory::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Borrowed view of a data row that has exactly the schema's field count
#[derive(Debug, Clone, Copy)]
pub struct RowFields<'a> {
    /// 1-based row number, the header being row 1
    pub row: usize,
    fields: [&'a str; FIELD_COUNT],
}

impl<'a> RowFields<'a> {
    pub fn new(row: usize, fields: [&'a str; FIELD_COUNT]) -> Self {
        Self { row, fields }
    }

    /// Build from any field iterator; `None` if the count is wrong
    pub fn from_iter<I>(row: usize, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = [""; FIELD_COUNT];
        let mut count = 0;
        for value in values {
            if count == FIELD_COUNT {
                return None;
            }
            fields[count] = value;
            count += 1;
        }
        (count == FIELD_COUNT).then(|| Self::new(row, fields))
    }

    pub fn fields(&self) -> &[&'a str; FIELD_COUNT] {
        &self.fields
    }

    pub fn patient_id(&self) -> &'a str {
        self.fields[0]
    }

    pub fn trial_code(&self) -> &'a str {
        self.fields[1]
    }

    pub fn drug_code(&self) -> &'a str {
        self.fields[2]
    }

    pub fn dosage(&self) -> &'a str {
        self.fields[3]
    }

    pub fn start_date(&self) -> &'a str {
        self.fields[4]
    }

    pub fn end_date(&self) -> &'a str {
        self.fields[5]
    }

    pub fn outcome(&self) -> &'a str {
        self.fields[6]
    }

    pub fn side_effects(&self) -> &'a str {
        self.fields[7]
    }

    pub fn analyst(&self) -> &'a str {
        self.fields[8]
    }
}

/// State carried across rows of one validation pass
#[derive(Debug, Default)]
pub struct PassState {
    pub duplicates: DuplicateTracker,
}

impl PassState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A single check applied to every well-formed data row
///
/// Rules are deterministic. Only `PassState` may be mutated, which lets a
/// rule remember what earlier rows contained.
pub trait RowRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &str;

    /// Category this rule belongs to
    fn category(&self) -> RuleCategory;

    /// Description of what this rule validates
    fn description(&self) -> &str;

    /// Messages for the row; empty when the row passes
    fn evaluate(&self, row: &RowFields<'_>, pass: &mut PassState) -> Vec<String>;
}

/// A boxed rule for dynamic dispatch
pub type BoxedRowRule = Box<dyn RowRule>;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn row(values: [&'static str; FIELD_COUNT]) -> RowFields<'static> {
        RowFields::new(2, values)
    }

    pub fn clean_row() -> RowFields<'static> {
        row([
            "P001",
            "T001",
            "D001",
            "100",
            "2024-01-01",
            "2024-01-31",
            "Improved",
            "None",
            "Dr. Smith",
        ])
    }
}
