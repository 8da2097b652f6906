//! Error types for the catalog module.

use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage element is not known to the catalog.
    #[error("RSE not found: {0}")]
    RseNotFound(String),

    /// A scope:name is not known to the catalog.
    #[error("data identifier not found: {scope}:{name}")]
    DidNotFound { scope: String, name: String },

    /// A different replica is already registered under this name.
    #[error("replica {scope}:{name} already registered on {rse} with different metadata")]
    Duplicate {
        rse: String,
        scope: String,
        name: String,
    },

    /// The auth token cannot be sent as a header.
    #[error("invalid auth token")]
    InvalidToken,

    /// Login succeeded but no token came back.
    #[error("server did not return an auth token")]
    MissingToken,
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
