//! Treatment window validation
//!
//! Both dates must parse as `YYYY-MM-DD` with a bare four-digit year. A parse
//! failure on either field is reported once; the ordering check only runs
//! when both parse.

use chrono::NaiveDate;

use super::{PassState, RowFields, RowRule, RuleCategory};
use crate::contracts::DATE_FORMAT;

pub const INVALID_DATE_FORMAT: &str = "Invalid date format";
pub const END_BEFORE_START: &str = "End date before start date";

/// Rule checking date formats and that the window is not reversed
pub struct DateRangeRule {
    id: String,
}

impl DateRangeRule {
    pub fn new() -> Self {
        Self {
            id: "date-range".to_string(),
        }
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        // chrono's %Y also takes a sign and more than four digits
        let year = raw.split('-').next()?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
    }
}

impl Default for DateRangeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RowRule for DateRangeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Temporal
    }

    fn description(&self) -> &str {
        "Validates date formats and that EndDate is not before StartDate"
    }

    fn evaluate(&self, row: &RowFields<'_>, _pass: &mut PassState) -> Vec<String> {
        match (Self::parse(row.start_date()), Self::parse(row.end_date())) {
            (Some(start), Some(end)) if end < start => vec![END_BEFORE_START.to_string()],
            (Some(_), Some(_)) => Vec::new(),
            _ => vec![INVALID_DATE_FORMAT.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::test_support::{clean_row, row};

    fn window(start: &'static str, end: &'static str) -> RowFields<'static> {
        row([
            "P001", "T001", "D001", "100", start, end, "Improved", "None", "Dr. Smith",
        ])
    }

    #[test]
    fn test_valid_window_passes() {
        let rule = DateRangeRule::new();
        assert!(rule.evaluate(&clean_row(), &mut PassState::new()).is_empty());
        // same-day treatment is allowed
        assert!(rule
            .evaluate(&window("2024-03-01", "2024-03-01"), &mut PassState::new())
            .is_empty());
    }

    #[test]
    fn test_reversed_window() {
        let rule = DateRangeRule::new();
        assert_eq!(
            rule.evaluate(&window("2024-12-31", "2024-01-15"), &mut PassState::new()),
            vec![END_BEFORE_START.to_string()]
        );
    }

    #[test]
    fn test_bad_format_reported_once() {
        let rule = DateRangeRule::new();
        assert_eq!(
            rule.evaluate(&window("01/01/2024", "2024-13-45"), &mut PassState::new()),
            vec![INVALID_DATE_FORMAT.to_string()]
        );
        assert_eq!(
            rule.evaluate(&window("2024-01-01", "soon"), &mut PassState::new()),
            vec![INVALID_DATE_FORMAT.to_string()]
        );
    }

    #[test]
    fn test_year_must_be_four_plain_digits() {
        assert!(DateRangeRule::parse("2024-01-01").is_some());
        assert!(DateRangeRule::parse("+2024-01-01").is_none());
        assert!(DateRangeRule::parse("12024-01-01").is_none());
        assert!(DateRangeRule::parse("-024-01-01").is_none());

        let rule = DateRangeRule::new();
        assert_eq!(
            rule.evaluate(&window("+2024-01-01", "2024-02-01"), &mut PassState::new()),
            vec![INVALID_DATE_FORMAT.to_string()]
        );
    }
}
