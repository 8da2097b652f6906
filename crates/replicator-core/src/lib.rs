//! # Replicator Core
//!
//! Pure primitives for replicator: streaming checksums, physical file names,
//! and the replica records handed to a catalog.
//!
//! This crate does no networking. The only I/O it performs is reading from a
//! caller-supplied [`std::io::Read`] (or opening a local path in
//! [`checksum_path`]).
//!
//! ## Key Types
//!
//! - [`ChecksumAlgorithm`] - Closed set of supported algorithms (Adler-32, CRC-32)
//! - [`ChecksumAccumulator`] - Running checksum state folded chunk by chunk
//! - [`StreamDigest`] - Final checksum plus total byte count
//! - [`Pfn`] - Parsed physical file name
//! - [`FileSpec`] / [`ReplicaRecord`] - Input entries and catalog records
//!
//! ## Streaming
//!
//! ```rust
//! use replicator_core::{checksum_reader, ChecksumAlgorithm};
//!
//! let digest = checksum_reader(&b"abc"[..], ChecksumAlgorithm::Adler32).unwrap();
//! assert_eq!(digest.digest(), "024d0127");
//! assert_eq!(digest.length, 3);
//! ```

pub mod checksum;
pub mod error;
pub mod pfn;
pub mod replica;
pub mod stream;

pub use checksum::{Checksum, ChecksumAccumulator, ChecksumAlgorithm, StreamDigest};
pub use error::{CoreError, Result};
pub use pfn::Pfn;
pub use replica::{Did, FileSpec, ReplicaRecord};
pub use stream::{
    checksum_bytes, checksum_path, checksum_reader, checksum_reader_with_chunk_size,
    checksum_reader_with_md5, DEFAULT_CHUNK_SIZE,
};
