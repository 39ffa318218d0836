//! Pipeline configuration
//!
//! Defaults, then an optional file (`.toml`, `.yaml`/`.yml` or `.json`),
//! then `INTAKE_*` environment variables, then CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, Result};
use crate::ledger::LEDGER_FILENAME;

/// Default timeout for the correlation token request
pub const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 5000;

/// Directory layout and token settings for one intake instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Drop directory served by `DirectorySource`
    pub source_dir: PathBuf,

    /// Staging area; also holds the processed-file ledger
    pub download_dir: PathBuf,

    /// Valid files land here under their canonical name
    pub archive_dir: PathBuf,

    /// Rejected files and `error_report.log`
    pub error_dir: PathBuf,

    /// UUID issuing endpoint; local identifiers when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// Token request timeout in milliseconds
    pub token_timeout_ms: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("incoming"),
            download_dir: PathBuf::from("downloads"),
            archive_dir: PathBuf::from("archive"),
            error_dir: PathBuf::from("errors"),
            token_endpoint: None,
            token_timeout_ms: DEFAULT_TOKEN_TIMEOUT_MS,
        }
    }
}

impl IntakeConfig {
    /// Create a new config builder
    pub fn builder() -> IntakeConfigBuilder {
        IntakeConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `INTAKE_*` variables that are set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("INTAKE_SOURCE_DIR") {
            self.source_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTAKE_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTAKE_ARCHIVE_DIR") {
            self.archive_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTAKE_ERROR_DIR") {
            self.error_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("INTAKE_TOKEN_ENDPOINT") {
            self.token_endpoint = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = std::env::var("INTAKE_TOKEN_TIMEOUT_MS") {
            match v.trim().parse() {
                Ok(ms) => self.token_timeout_ms = ms,
                Err(e) => tracing::warn!(
                    value = %v,
                    error = %e,
                    default_ms = self.token_timeout_ms,
                    "Ignoring invalid INTAKE_TOKEN_TIMEOUT_MS"
                ),
            }
        }
        self
    }

    /// Load from a file; the format follows the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            IntakeError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config = match extension.as_str() {
            "json" => serde_json::from_str(content)?,
            "yaml" | "yml" => serde_yaml::from_str(content)?,
            "toml" => toml::from_str(content)?,
            _ => {
                return Err(IntakeError::config(format!(
                    "Unsupported file format: {}. Supported formats: json, yaml, yml, toml",
                    extension
                )))
            }
        };
        Ok(config)
    }

    /// `<download_dir>/processed_files.txt`
    pub fn ledger_path(&self) -> PathBuf {
        self.download_dir.join(LEDGER_FILENAME)
    }

    /// Create the staging, archive and error directories
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.download_dir, &self.archive_dir, &self.error_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Builder for IntakeConfig
pub struct IntakeConfigBuilder {
    config: IntakeConfig,
}

impl IntakeConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IntakeConfig::default(),
        }
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.archive_dir = dir.into();
        self
    }

    pub fn error_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.error_dir = dir.into();
        self
    }

    /// Put all four directories under one root
    pub fn base_dir(self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.source_dir(root.join("incoming"))
            .download_dir(root.join("downloads"))
            .archive_dir(root.join("archive"))
            .error_dir(root.join("errors"))
    }

    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.token_endpoint = Some(endpoint.into());
        self
    }

    pub fn token_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.token_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> IntakeConfig {
        self.config
    }
}

impl Default for IntakeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
