//! Processed-file ledger
//!
//! The set of original remote filenames that were archived successfully.
//! Held in memory and written back wholesale on every change: one name per
//! line, sorted, newline-terminated. A single process is assumed to own the
//! file.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default ledger filename inside the download directory
pub const LEDGER_FILENAME: &str = "processed_files.txt";

#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl ProcessedLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Loaded processed ledger");
        Ok(Self { path, entries })
    }

    /// Whether a remote file has already been archived
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains(filename)
    }

    /// Record an archived file and persist the whole set
    ///
    /// Returns `false` without writing if the name was already present.
    /// A failed write leaves the set as it was.
    pub fn add(&mut self, filename: impl Into<String>) -> Result<bool> {
        let filename = filename.into();
        if self.entries.contains(&filename) {
            return Ok(false);
        }
        self.entries.insert(filename.clone());
        if let Err(e) = self.flush() {
            self.entries.remove(&filename);
            return Err(e);
        }
        Ok(true)
    }

    /// Rewrite the backing file from the in-memory set
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut text = String::new();
        for name in &self.entries {
            text.push_str(name);
            text.push('\n');
        }
        fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ProcessedLedger::load(dir.path().join(LEDGER_FILENAME)).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("CLINICALDATA_20250115120000.csv"));
    }

    #[test]
    fn test_add_persists_sorted_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILENAME);

        let mut ledger = ProcessedLedger::load(&path).unwrap();
        assert!(ledger.add("CLINICALDATA_20250116000000.csv").unwrap());
        assert!(ledger.add("CLINICALDATA_20250115000000.csv").unwrap());
        assert!(!ledger.add("CLINICALDATA_20250115000000.csv").unwrap());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "CLINICALDATA_20250115000000.csv\nCLINICALDATA_20250116000000.csv\n"
        );

        let reloaded = ProcessedLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("CLINICALDATA_20250116000000.csv"));
    }

    #[test]
    fn test_load_tolerates_unterminated_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILENAME);
        fs::write(&path, "b.csv\n\na.csv").unwrap();

        let ledger = ProcessedLedger::load(&path).unwrap();
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_flush_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(LEDGER_FILENAME);
        let mut ledger = ProcessedLedger::load(&path).unwrap();
        ledger.add("x.csv").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_write_does_not_record_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILENAME);
        let mut ledger = ProcessedLedger::load(&path).unwrap();
        ledger.add("a.csv").unwrap();

        // swap the backing file for a directory so the rewrite fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(ledger.add("b.csv").is_err());
        assert!(!ledger.contains("b.csv"));
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec!["a.csv"]);

        fs::remove_dir(&path).unwrap();
        assert!(ledger.add("b.csv").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a.csv\nb.csv\n");
    }
}
