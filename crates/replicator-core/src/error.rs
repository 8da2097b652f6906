//! Error types for the replicator core.

use thiserror::Error;

/// Errors raised by the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The byte stream could not be opened or failed mid-read.
    #[error("stream unavailable: {0}")]
    StreamUnavailable(#[source] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("invalid pfn: {0}")]
    InvalidPfn(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl CoreError {
    /// Whether this error means the underlying stream could not be read.
    pub fn is_stream_unavailable(&self) -> bool {
        matches!(self, CoreError::StreamUnavailable(_))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
