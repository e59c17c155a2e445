//! Error types for gateway operations.
//!
//! This module defines [`DataError`] which covers every failure the gateway can
//! surface, and [`ErrorKind`], the coarse classification the presentation layer
//! maps to a response status.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while serving a market data query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// A required request parameter was absent or empty.
    #[error("{0} parameter is required")]
    MissingParameter(String),

    /// A well-defined empty result (e.g. no option expirations for a symbol).
    #[error("{0}")]
    NotFound(String),

    /// The upstream provider does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Network-related errors (connection failures, timeouts, non-2xx responses).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by the upstream provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// Error parsing data returned by the provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid parameter or configuration value was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a [`DataError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required input was missing; detected before any cache or fetch work.
    MissingParameter,
    /// The query is valid but there is nothing to return.
    NotFound,
    /// The upstream fetch failed. Never cached.
    UpstreamFailure,
}

impl DataError {
    /// Shorthand for a missing `symbol` parameter.
    #[must_use]
    pub fn missing_symbol() -> Self {
        Self::MissingParameter("Symbol".to_string())
    }

    /// Shorthand for a missing `query` parameter.
    #[must_use]
    pub fn missing_query() -> Self {
        Self::MissingParameter("Query".to_string())
    }

    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) => ErrorKind::MissingParameter,
            Self::NotFound(_) | Self::SymbolNotFound(_) => ErrorKind::NotFound,
            Self::Network(_) | Self::RateLimited { .. } | Self::Parse(_) | Self::Other(_) => {
                ErrorKind::UpstreamFailure
            }
        }
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
