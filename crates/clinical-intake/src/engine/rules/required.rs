//! Required field validation
//!
//! Every one of the nine columns must hold a non-blank value.

use super::{PassState, RowFields, RowRule, RuleCategory};

pub const MISSING_FIELDS: &str = "Missing required fields";

/// Rule flagging rows where any field is blank after trimming
pub struct RequiredFieldsRule {
    id: String,
}

impl RequiredFieldsRule {
    pub fn new() -> Self {
        Self {
            id: "required-fields".to_string(),
        }
    }

    /// Indices of blank fields, for callers that want detail
    pub fn blank_fields(row: &RowFields<'_>) -> Vec<usize> {
        row.fields()
            .iter()
            .enumerate()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Default for RequiredFieldsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRule for RequiredFieldsRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Required
    }

    fn description(&self) -> &str {
        "Validates that all nine fields are present and non-blank"
    }

    fn evaluate(&self, row: &RowFields<'_>, _pass: &mut PassState) -> Vec<String> {
        if row.fields().iter().any(|value| value.trim().is_empty()) {
            vec![MISSING_FIELDS.to_string()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::test_support::{clean_row, row};

    #[test]
    fn test_complete_row_passes() {
        let rule = RequiredFieldsRule::new();
        assert!(rule.evaluate(&clean_row(), &mut PassState::new()).is_empty());
    }

    #[test]
    fn test_blank_field_flagged_once() {
        let rule = RequiredFieldsRule::new();
        let blank = row([
            "P1004", "T004", "DRUG001", "200", "2024-01-15", "2024-12-31", "Improved", "   ", "",
        ]);
        let messages = rule.evaluate(&blank, &mut PassState::new());
        assert_eq!(messages, vec![MISSING_FIELDS.to_string()]);
        assert_eq!(RequiredFieldsRule::blank_fields(&blank), vec![7, 8]);
    }
}
