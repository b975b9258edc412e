//! Error types for OLIVIA

use serde::Serialize;

/// Result type alias using OLIVIA's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for OLIVIA operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request text or parameters rejected before any processing
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing credentials or malformed lexicon; fatal at startup
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure scoped to a single source adapter call
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Filesystem errors while loading lexicon or configuration
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller is at fault (as opposed to the service)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Failure of one adapter call.
///
/// Never escalated past the aggregator: it is folded into the report
/// diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceError {
    /// Network failure, timeout or 5xx from the provider
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Credentials rejected or missing
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Provider answered with a shape we cannot read
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Empty result set; adapters return an empty batch instead of raising this
    #[error("no results")]
    NoResults,
}

impl SourceError {
    /// Stable short name used for metrics labels and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Unauthorized(_) => "unauthorized",
            Self::Malformed(_) => "malformed",
            Self::NoResults => "no_results",
        }
    }

    /// Only transient failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
