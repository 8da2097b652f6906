//! # Replicator Catalog
//!
//! The replica catalog seam. Registration code talks to the [`Catalog`]
//! trait and never to a concrete backend.
//!
//! ## Key Types
//!
//! - [`Catalog`] - The async trait for replica registration and dataset attachment
//! - [`HttpCatalog`] - Client for a Rucio-style REST server
//! - [`MemoryCatalog`] - In-memory catalog for tests and dry runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replicator_catalog::{Catalog, HttpCatalog};
//!
//! async fn example() {
//!     let catalog = HttpCatalog::new("https://rucio.example.org", "token").unwrap();
//!     let attrs = catalog.list_rse_attributes("RUCIOTEST").await.unwrap();
//!     println!("{:?}", attrs.get("globus_endpoint_id"));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Batch granularity**: `add_replicas` succeeds or fails as a whole
//! - **Idempotent registration**: re-registering an identical replica is not an error
//! - **Conflict detection**: same replica with a different size or checksum is `Duplicate`

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{CatalogError, Result};
pub use http::HttpCatalog;
pub use memory::MemoryCatalog;
pub use traits::{Catalog, RseAttributes};
