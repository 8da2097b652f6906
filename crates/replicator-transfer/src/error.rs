//! Error types for the transfer module.

use thiserror::Error;

/// Errors that can occur during transfer operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token refresh failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A bulk submission with no jobs.
    #[error("no transfer jobs to submit")]
    EmptyJob,

    /// A job is missing sources, destinations, or endpoint metadata.
    #[error("invalid transfer job: {0}")]
    InvalidJob(String),

    /// The service does not know this task.
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// Result type for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
