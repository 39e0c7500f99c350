//! Error types for catalog operations.

use thiserror::Error;

/// Errors raised while fetching, normalizing, storing or looking up endpoints.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or HTTP failure retrieving a specification.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Location that was requested.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// The document is not a usable specification.
    #[error("invalid specification: {0}")]
    Parse(String),

    /// No endpoint with this identifier exists for the provider.
    #[error("endpoint '{id}' not found for provider '{provider}'")]
    NotFound {
        /// Provider that was searched.
        provider: String,
        /// Identifier that was requested.
        id: String,
    },

    /// The provider is not known to the catalog.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl CatalogError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub(crate) fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// The URL involved, for fetch failures.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. } => Some(url),
            _ => None,
        }
    }
}
