//! Error types for the clinical intake pipeline
//!
//! Schema and naming defects are never errors: they become `Rejected`
//! outcomes. These types cover transport, filesystem, configuration and
//! internal failures.

use thiserror::Error;

/// Main error type for intake operations
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local filesystem error (staging, moves, ledger, log)
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote source failure (listing or retrieving a file)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parsing or serialization error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        IntakeError::InvalidInput(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        IntakeError::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        IntakeError::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        IntakeError::Parse(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IntakeError::InvalidInput(_)
                | IntakeError::Io(_)
                | IntakeError::Config(_)
                | IntakeError::Parse(_)
        )
    }

    /// Whether the error came from the filesystem or the file drop
    pub fn is_file_error(&self) -> bool {
        matches!(self, IntakeError::Io(_) | IntakeError::Transport(_))
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for IntakeError {
    fn from(err: serde_yaml::Error) -> Self {
        IntakeError::Parse(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for IntakeError {
    fn from(err: toml::de::Error) -> Self {
        IntakeError::Parse(format!("TOML error: {}", err))
    }
}

/// Result type alias for intake operations
pub type Result<T> = std::result::Result<T, IntakeError>;
