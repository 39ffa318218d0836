//! Remote file drop abstraction
//!
//! The router only needs to list a drop and copy one named file out of it.
//! `DirectorySource` serves a local directory; network transports implement
//! the same trait.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, Result};

/// A place incoming CSV files are picked up from
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Short description used in logs
    fn describe(&self) -> String;

    /// Open the session; a no-op for sources without one
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Names of the files currently in the drop
    async fn list_files(&self) -> Result<Vec<String>>;

    /// Copy `name` to `dest`, returning the number of bytes written
    async fn retrieve(&self, name: &str, dest: &Path) -> Result<u64>;

    /// Close the session
    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drop backed by a local (or mounted) directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\');
        if !plain {
            return Err(IntakeError::transport(format!(
                "Refusing to retrieve '{}': not a plain filename",
                name
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl RemoteSource for DirectorySource {
    fn describe(&self) -> String {
        format!("dir://{}", self.root.display())
    }

    async fn connect(&mut self) -> Result<()> {
        let meta = tokio::fs::metadata(&self.root).await.map_err(|e| {
            IntakeError::transport(format!("{}: {}", self.root.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(IntakeError::transport(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            IntakeError::transport(format!("Cannot list {}: {}", self.root.display(), e))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| IntakeError::transport(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn retrieve(&self, name: &str, dest: &Path) -> Result<u64> {
        let src = self.resolve(name)?;
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| IntakeError::transport(format!("Failed to retrieve {}: {}", name, e)))
    }
}
