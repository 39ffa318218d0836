//! Dosage bounds validation

use super::{PassState, RowFields, RowRule, RuleCategory};

/// Rule requiring `Dosage_mg` to be a positive integer
pub struct DosageRule {
    id: String,
}

impl DosageRule {
    pub fn new() -> Self {
        Self {
            id: "dosage-bounds".to_string(),
        }
    }

    /// Parse a dosage cell, tolerating surrounding whitespace
    pub fn parse(raw: &str) -> Option<i64> {
        raw.trim().parse::<i64>().ok()
    }
}

impl Default for DosageRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRule for DosageRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Bounds
    }

    fn description(&self) -> &str {
        "Validates that the dosage is an integer greater than zero"
    }

    fn evaluate(&self, row: &RowFields<'_>, _pass: &mut PassState) -> Vec<String> {
        let raw = row.dosage();
        match Self::parse(raw) {
            Some(dosage) if dosage > 0 => Vec::new(),
            Some(_) => vec![format!("Invalid dosage: {}", raw)],
            None => vec![format!("Non-numeric dosage: {}", raw)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::test_support::{clean_row, row};

    fn with_dosage(dosage: &'static str) -> RowFields<'static> {
        row([
            "P001", "T001", "D001", dosage, "2024-01-01", "2024-01-31", "Improved", "None", "Dr. Smith",
        ])
    }

    #[test]
    fn test_positive_dosage_passes() {
        let rule = DosageRule::new();
        assert!(rule.evaluate(&clean_row(), &mut PassState::new()).is_empty());
        assert!(rule.evaluate(&with_dosage(" 25 "), &mut PassState::new()).is_empty());
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        let rule = DosageRule::new();
        assert_eq!(
            rule.evaluate(&with_dosage("-50"), &mut PassState::new()),
            vec!["Invalid dosage: -50".to_string()]
        );
        assert_eq!(
            rule.evaluate(&with_dosage("0"), &mut PassState::new()),
            vec!["Invalid dosage: 0".to_string()]
        );
    }

    #[test]
    fn test_non_numeric_rejected() {
        let rule = DosageRule::new();
        for raw in ["abc", "12.5", ""] {
            let messages = rule.evaluate(&with_dosage(raw), &mut PassState::new());
            assert_eq!(messages.len(), 1);
            assert!(messages[0].starts_with("Non-numeric dosage"));
        }
    }
}
