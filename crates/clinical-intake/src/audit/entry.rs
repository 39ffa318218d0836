//! Audit log line format
//!
//! `[<YYYY-MM-DDTHH:MM:SS>] GUID: <token> | File: <filename> | Error: <message>`

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Local-time timestamp format used at the start of every line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: NaiveDateTime,
    pub correlation_id: String,
    pub subject_filename: String,
    pub message: String,
}

impl AuditLogEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        correlation_id: impl Into<String>,
        subject_filename: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            correlation_id: correlation_id.into(),
            subject_filename: subject_filename.into(),
            message: message.into(),
        }
    }

    /// Entry stamped with the current local time, truncated to seconds
    pub fn now(
        correlation_id: impl Into<String>,
        subject_filename: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let now = Local::now().naive_local();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        Self::new(timestamp, correlation_id, subject_filename, message)
    }

    /// Parse a line written by [`fmt::Display`]; `None` for anything else
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim_end_matches(['\r', '\n']).strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] GUID: ")?;
        let (correlation_id, rest) = rest.split_once(" | File: ")?;
        let (subject_filename, message) = rest.split_once(" | Error: ")?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self::new(timestamp, correlation_id, subject_filename, message))
    }
}

impl fmt::Display for AuditLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] GUID: {} | File: {} | Error: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.correlation_id,
            self.subject_filename,
            self.message
        )
    }
}
