//! Duplicate record detection within one validation pass
//!
//! The first occurrence of a composite key is clean and is remembered even
//! when the row has other defects. Later occurrences are flagged.

use std::collections::HashSet;

use super::{PassState, RowFields, RowRule, RuleCategory};
use crate::contracts::composite_key;

pub const DUPLICATE_RECORD: &str = "Duplicate record";

/// Composite keys seen so far in the current pass
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashSet<String>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; returns `true` if it had already been seen
    pub fn observe(&mut self, key: String) -> bool {
        !self.seen.insert(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Rule flagging repeated `PatientID_TrialCode_DrugCode` keys
pub struct DuplicateRecordRule {
    id: String,
}

impl DuplicateRecordRule {
    pub fn new() -> Self {
        Self {
            id: "duplicate-record".to_string(),
        }
    }
}

impl Default for DuplicateRecordRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRule for DuplicateRecordRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Duplicate
    }

    fn description(&self) -> &str {
        "Validates that each patient, trial and drug combination appears once per file"
    }

    fn evaluate(&self, row: &RowFields<'_>, pass: &mut PassState) -> Vec<String> {
        let key = composite_key(row.patient_id(), row.trial_code(), row.drug_code());
        if pass.duplicates.observe(key) {
            vec![DUPLICATE_RECORD.to_string()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::test_support::clean_row;

    #[test]
    fn test_first_occurrence_clean_second_flagged() {
        let rule = DuplicateRecordRule::new();
        let mut pass = PassState::new();

        assert!(rule.evaluate(&clean_row(), &mut pass).is_empty());
        assert_eq!(
            rule.evaluate(&clean_row(), &mut pass),
            vec![DUPLICATE_RECORD.to_string()]
        );
        assert_eq!(
            rule.evaluate(&clean_row(), &mut pass),
            vec![DUPLICATE_RECORD.to_string()]
        );
        assert_eq!(pass.duplicates.len(), 1);
        assert!(pass.duplicates.contains("P001_T001_D001"));
    }

    #[test]
    fn test_fresh_pass_forgets_keys() {
        let rule = DuplicateRecordRule::new();
        let mut first = PassState::new();
        rule.evaluate(&clean_row(), &mut first);

        let mut second = PassState::new();
        assert!(second.duplicates.is_empty());
        assert!(rule.evaluate(&clean_row(), &mut second).is_empty());
    }
}
