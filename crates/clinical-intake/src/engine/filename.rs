//! Filename contract for incoming drops
//!
//! A valid name is `CLINICALDATA_` followed by a 14-digit
//! `YYYYMMDDHHMMSS` stamp and `.csv`, compared case-insensitively. The stamp
//! is matched by digit count only; it is not parsed as a date.

use regex::Regex;
use std::sync::OnceLock;

/// Anchored, case-insensitive pattern for incoming filenames
pub const FILENAME_PATTERN: &str = r"(?i)^CLINICALDATA_[0-9]{14}\.csv$";

fn filename_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(FILENAME_PATTERN).expect("filename pattern is a valid regex"))
}

/// Check a candidate remote filename against the naming contract
pub fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty() && filename_regex().is_match(filename)
}

/// Same check for callers holding an optional name; `None` is invalid
pub fn is_valid_optional_filename(filename: Option<&str>) -> bool {
    filename.map(is_valid_filename).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_filenames() {
        for name in [
            "CLINICALDATA_20250115120000.csv",
            "CLINICALDATA_20250115120000.CSV",
            "clinicaldata_20250115120000.csv",
        ] {
            assert!(is_valid_filename(name), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_filenames() {
        for name in [
            "wrongname.csv",
            "CLINICALDATA_2025.csv",
            "CLINICALDATA_20250115120000.txt",
            "test.csv",
            "",
            "CLINICALDATA_202501151200001.csv",
            "xCLINICALDATA_20250115120000.csv",
            "CLINICALDATA_20250115120000.csv.bak",
            "CLINICALDATA20250115120000.csv",
        ] {
            assert!(!is_valid_filename(name), "{:?} should be invalid", name);
        }
    }

    #[test]
    fn test_calendar_is_not_checked() {
        // month 13, day 99
        assert!(is_valid_filename("CLINICALDATA_20251399999999.csv"));
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(!is_valid_filename("CLINICALDATA_٢٠٢٥٠١١٥١٢٠٠٠٠.csv"));
    }

    #[test]
    fn test_optional_name() {
        assert!(!is_valid_optional_filename(None));
        assert!(is_valid_optional_filename(Some("CLINICALDATA_20250115120000.csv")));
    }

    proptest! {
        #[test]
        fn any_fourteen_digits_are_accepted(stamp in "[0-9]{14}", upper in any::<bool>()) {
            let name = format!("CLINICALDATA_{}.csv", stamp);
            let name = if upper { name.to_uppercase() } else { name.to_lowercase() };
            prop_assert!(is_valid_filename(&name));
        }

        #[test]
        fn other_digit_counts_are_rejected(stamp in "[0-9]{0,13}|[0-9]{15,20}") {
            let name = format!("CLINICALDATA_{}.csv", stamp);
            prop_assert!(!is_valid_filename(&name));
        }
    }
}
