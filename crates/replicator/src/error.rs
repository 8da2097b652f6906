//! Error types for replicator.

use std::path::PathBuf;

use replicator_catalog::CatalogError;
use replicator_core::{Checksum, CoreError};
use replicator_transfer::TransferError;
use thiserror::Error;

/// Why a single file could not be registered.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The pfn could not be parsed, or no replica name could be derived.
    #[error("invalid pfn {pfn}: {reason}")]
    InvalidPfn { pfn: String, reason: String },

    /// The pfn's scheme is not in the allowed set.
    #[error("unsupported scheme {scheme:?} in {pfn}")]
    UnsupportedScheme { pfn: String, scheme: String },

    /// The source could not be opened or read.
    #[error("checksum failed: {0}")]
    Checksum(#[from] CoreError),

    /// The computed checksum differs from the one in the file list.
    #[error("checksum mismatch for {pfn}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        pfn: String,
        expected: Checksum,
        computed: Checksum,
    },

    /// The computed size differs from the one in the file list.
    #[error("size mismatch for {pfn}: expected {expected} bytes, read {computed}")]
    SizeMismatch {
        pfn: String,
        expected: u64,
        computed: u64,
    },

    #[error("md5 mismatch for {pfn}: expected {expected}, computed {computed}")]
    Md5Mismatch {
        pfn: String,
        expected: String,
        computed: String,
    },

    /// The catalog refused the replica.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The replica was registered but could not be attached to its dataset.
    #[error("failed to attach to dataset {dataset}: {source}")]
    Attach {
        dataset: String,
        #[source]
        source: CatalogError,
    },

    /// The blocking checksum task panicked or was cancelled.
    #[error("checksum task failed: {0}")]
    Join(String),
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A command needs a section the config does not have.
    #[error("missing [{0}] section in config")]
    MissingSection(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that can occur in replicator operations.
#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// Core primitive error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Catalog error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Transfer service error.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Registration error.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// File list or failure log I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File list could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for replicator operations.
pub type Result<T> = std::result::Result<T, ReplicatorError>;
