//! Correlation token sources
//!
//! Every audit line carries a fresh identifier. The preferred source is a
//! UUID-issuing HTTP endpoint called with a short timeout; any failure
//! falls back to a locally generated v4 UUID. Both paths yield the same
//! 36-character hyphenated shape.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Public endpoint used when none is configured explicitly
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://www.uuidtools.com/api/generate/v4";

/// Errors from a token source; always absorbed by [`CorrelationTokens`]
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Malformed token response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// Something that can issue a correlation token
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Issue one token in 36-character hyphenated form
    async fn issue_token(&self) -> Result<String>;
}

/// Configuration for the HTTP token client
#[derive(Debug, Clone)]
pub struct TokenClientConfig {
    /// Full URL of the generate endpoint
    pub endpoint: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for TokenClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Token source backed by a remote UUID generator
pub struct HttpTokenClient {
    client: Client,
    config: TokenClientConfig,
}

impl HttpTokenClient {
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        Self::with_config(TokenClientConfig {
            endpoint: endpoint.into(),
            timeout_ms,
        })
    }

    pub fn with_config(config: TokenClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TokenError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }
}

#[async_trait]
impl TokenSource for HttpTokenClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn issue_token(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TokenError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        parse_token_body(&body)
    }
}

/// Extract a token from `["<uuid>", ...]` or `{"uuid": "<uuid>"}`
pub fn parse_token_body(body: &Value) -> Result<String> {
    let raw = match body {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::Object(map) => map.get("uuid").and_then(Value::as_str),
        _ => None,
    }
    .ok_or_else(|| TokenError::Malformed(body.to_string()))?;

    Uuid::try_parse(raw)
        .map(|id| id.hyphenated().to_string())
        .map_err(|e| TokenError::Malformed(format!("{}: {}", raw, e)))
}

/// Locally generated v4 UUIDs; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTokenSource;

impl LocalTokenSource {
    pub fn generate(&self) -> String {
        Uuid::new_v4().hyphenated().to_string()
    }
}

#[async_trait]
impl TokenSource for LocalTokenSource {
    fn name(&self) -> &str {
        "local"
    }

    async fn issue_token(&self) -> Result<String> {
        Ok(self.generate())
    }
}

/// A token plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub fallback: bool,
}

/// Primary token source with transparent local fallback
#[derive(Clone)]
pub struct CorrelationTokens {
    primary: Option<Arc<dyn TokenSource>>,
    fallback: LocalTokenSource,
}

impl CorrelationTokens {
    pub fn new(primary: Arc<dyn TokenSource>) -> Self {
        Self {
            primary: Some(primary),
            fallback: LocalTokenSource,
        }
    }

    /// Local generation only; no network calls
    pub fn local() -> Self {
        Self {
            primary: None,
            fallback: LocalTokenSource,
        }
    }

    /// Remote endpoint when configured, local otherwise
    pub fn from_endpoint(endpoint: Option<&str>, timeout_ms: u64) -> Self {
        match endpoint {
            Some(url) => match HttpTokenClient::new(url, timeout_ms) {
                Ok(client) => Self::new(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "Token client unavailable, using local identifiers");
                    Self::local()
                }
            },
            None => Self::local(),
        }
    }

    /// Fresh token for one audit line
    pub async fn next(&self) -> TokenGrant {
        if let Some(primary) = &self.primary {
            match primary.issue_token().await {
                Ok(token) => {
                    return TokenGrant {
                        token,
                        fallback: false,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        source = primary.name(),
                        error = %e,
                        "Correlation token request failed, using local identifier"
                    );
                }
            }
        }

        TokenGrant {
            token: self.fallback.generate(),
            fallback: true,
        }
    }
}

/// True for the canonical 36-character, four-hyphen shape
pub fn is_token_shaped(token: &str) -> bool {
    token.len() == 36
        && token.matches('-').count() == 4
        && Uuid::try_parse(token).is_ok()
}
