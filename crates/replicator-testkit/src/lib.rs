//! # Replicator Testkit
//!
//! Testing utilities for replicator.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Published Adler-32 and CRC-32 values every digest path must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Scratch directories, seeded catalogs, and failing readers
//! - **HTTP**: A scripted local server for the catalog, transfer, and source clients
//!
//! ## Golden Vectors
//!
//! ```rust
//! use replicator_core::checksum_bytes;
//! use replicator_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let digest = checksum_bytes(vector.input, vector.algorithm);
//!     assert_eq!(digest.digest(), vector.expected);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use replicator_testkit::generators::{algorithm, chunk_size, payload};
//!
//! proptest! {
//!     #[test]
//!     fn chunking_is_invisible(data in payload(4096), chunk in chunk_size(), alg in algorithm()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use replicator_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let spec = fixture.file_spec("user.test", "a.bin", b"abc");
//! assert!(spec.pfn.starts_with("file://"));
//! ```

pub mod fixtures;
pub mod generators;
pub mod http;
pub mod vectors;

pub use fixtures::{pattern, random_bytes, seeded_catalog, DropCounter, FlakyReader, TestFixture};
pub use http::{MockResponse, MockServer};
