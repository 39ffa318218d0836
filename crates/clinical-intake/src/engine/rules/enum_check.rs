//! Outcome enum validation

use super::{PassState, RowFields, RowRule, RuleCategory};
use crate::contracts::Outcome;

/// Rule requiring the outcome to be one of the fixed literals, case-sensitive
pub struct OutcomeRule {
    id: String,
}

impl OutcomeRule {
    pub fn new() -> Self {
        Self {
            id: "outcome-enum".to_string(),
        }
    }

    pub fn allowed_values(&self) -> &'static [&'static str] {
        &Outcome::LITERALS
    }
}

impl Default for OutcomeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRule for OutcomeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Enum
    }

    fn description(&self) -> &str {
        "Validates that the outcome is Improved, No Change or Worsened"
    }

    fn evaluate(&self, row: &RowFields<'_>, _pass: &mut PassState) -> Vec<String> {
        match row.outcome().parse::<Outcome>() {
            Ok(_) => Vec::new(),
            Err(message) => vec![message],
        }
    }
}
