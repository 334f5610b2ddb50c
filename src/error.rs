//! Error types for the web search tool.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Coarse failure classes surfaced in logs and narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configured value is missing or unusable.
    ConfigurationMissing,
    /// Network failure, timeout or cancellation.
    TransportFailure,
    /// Non-2xx status or a body that could not be parsed.
    ProtocolFailure,
    /// A 2xx response whose body signals rejection.
    SemanticFailure,
}

/// Errors that can occur while talking to a search provider.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP request failed. Never carries the request URL, which may hold
    /// credentials in its query string.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// The provider did not answer in time.
    #[error("Search timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The enclosing agent turn was cancelled.
    #[error("Search was cancelled")]
    Cancelled,

    /// Provider answered with a non-success status.
    #[error("{status} - {reason}. params: {params}")]
    Status {
        status: u16,
        reason: String,
        /// Request parameters with credentials masked.
        params: String,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Provider returned a success status with an error payload.
    #[error("{0}")]
    Rejected(String),

    /// A configured value is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::ConfigurationMissing,
            Self::Http(_) | Self::Timeout(_) | Self::Cancelled => ErrorKind::TransportFailure,
            Self::Status { .. } | Self::Parse(_) | Self::UrlParse(_) | Self::Other(_) => {
                ErrorKind::ProtocolFailure
            }
            Self::Rejected(_) => ErrorKind::SemanticFailure,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
