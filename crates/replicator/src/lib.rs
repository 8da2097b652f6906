//! # Replicator
//!
//! Registers files as replicas in a data catalog and moves them between
//! storage endpoints through a bulk transfer service.
//!
//! ## Overview
//!
//! Registration reads each source once, in bounded chunks, to compute its
//! size and checksum, then records the replica in the catalog and
//! optionally attaches it to a dataset:
//!
//! - **Sources**: local files or HTTP(S) resources, opened by a [`SourceOpener`]
//! - **Catalog**: any [`catalog::Catalog`], usually the Rucio-style HTTP client
//! - **Outcomes**: one `Result` per file, collected in a [`RegistrationReport`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replicator::{Config, DefaultOpener, Registrar};
//! use replicator::core::FileSpec;
//!
//! async fn example() -> replicator::Result<()> {
//!     let config = Config::load("replicator.toml")?;
//!     let catalog = config.catalog()?.connect().await?;
//!     let opener = DefaultOpener::new().with_http_timeout(config.http_timeout());
//!     let registrar = Registrar::new(catalog, opener, config.registrar_config());
//!
//!     let files = vec![FileSpec::new("user.jdoe", "file:///data/run1.h5")];
//!     let report = registrar.register_files("SITE_DISK", &files).await;
//!     report.write_failure_log("registerlog.json")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `replicator::core` - Checksums, pfns, file-list entries and replica records
//! - `replicator::catalog` - Catalog abstraction, HTTP and in-memory catalogs
//! - `replicator::transfer` - Transfer service, Globus client, poller

pub mod config;
pub mod error;
pub mod registrar;
pub mod report;
pub mod source;

// Re-export component crates
pub use replicator_catalog as catalog;
pub use replicator_core as core;
pub use replicator_transfer as transfer;

// Re-export main types for convenience
pub use config::{CatalogConfig, Config, GlobusSection, RegistrationConfig};
pub use error::{ConfigError, RegistrationError, ReplicatorError, Result};
pub use registrar::{RegisteredReplica, Registrar, RegistrarConfig};
pub use report::RegistrationReport;
pub use source::{DefaultOpener, MemoryOpener, SourceOpener};

// Re-export commonly used core types
pub use replicator_core::{
    Checksum, ChecksumAlgorithm, FileSpec, Pfn, ReplicaRecord, StreamDigest,
};

use std::path::Path;

/// Read a JSON file list: an array of [`FileSpec`] entries.
pub fn load_file_list(path: impl AsRef<Path>) -> Result<Vec<FileSpec>> {
    let content = std::fs::read(path.as_ref())?;
    Ok(serde_json::from_slice(&content)?)
}
