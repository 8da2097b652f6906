//! Replica records and the file-list entries they are built from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum::{Checksum, ChecksumAlgorithm, StreamDigest};
use crate::pfn::Pfn;

/// One entry of an input file list.
///
/// Only `scope` and `pfn` are required. Size and checksums, when present,
/// are either trusted or verified depending on the caller's policy. Fields
/// this type does not know about are kept in `extra` so the entry can be
/// echoed back unchanged in a failure log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    pub scope: String,
    pub pfn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adler32: Option<Checksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc32: Option<Checksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileSpec {
    /// A minimal entry with just scope and pfn.
    pub fn new(scope: impl Into<String>, pfn: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            pfn: pfn.into(),
            name: None,
            bytes: None,
            adler32: None,
            crc32: None,
            md5: None,
            dataset: None,
            extra: Map::new(),
        }
    }

    /// The precomputed checksum for `algorithm`, if the entry carries one.
    pub fn precomputed(&self, algorithm: ChecksumAlgorithm) -> Option<Checksum> {
        match algorithm {
            ChecksumAlgorithm::Adler32 => self.adler32,
            ChecksumAlgorithm::Crc32 => self.crc32,
        }
    }

    /// Precomputed size and checksum, when both are present.
    pub fn precomputed_digest(&self, algorithm: ChecksumAlgorithm) -> Option<StreamDigest> {
        Some(StreamDigest {
            algorithm,
            checksum: self.precomputed(algorithm)?,
            length: self.bytes?,
        })
    }
}

/// A data identifier: a scoped name in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Did {
    pub scope: String,
    pub name: String,
}

impl Did {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

/// A replica as submitted to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub scope: String,
    pub name: String,
    pub bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adler32: Option<Checksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc32: Option<Checksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    pub pfn: Pfn,
}

impl ReplicaRecord {
    /// Build a record from a finished digest.
    pub fn new(
        scope: impl Into<String>,
        name: impl Into<String>,
        pfn: Pfn,
        digest: &StreamDigest,
    ) -> Self {
        let mut record = Self {
            scope: scope.into(),
            name: name.into(),
            bytes: digest.length,
            adler32: None,
            crc32: None,
            md5: None,
            pfn,
        };
        match digest.algorithm {
            ChecksumAlgorithm::Adler32 => record.adler32 = Some(digest.checksum),
            ChecksumAlgorithm::Crc32 => record.crc32 = Some(digest.checksum),
        }
        record
    }

    /// Attach an md5 hex digest, computed or taken from the input.
    pub fn with_md5(mut self, md5: Option<String>) -> Self {
        self.md5 = md5;
        self
    }

    /// The checksum stored for `algorithm`, if any.
    pub fn checksum(&self, algorithm: ChecksumAlgorithm) -> Option<Checksum> {
        match algorithm {
            ChecksumAlgorithm::Adler32 => self.adler32,
            ChecksumAlgorithm::Crc32 => self.crc32,
        }
    }

    /// The data identifier of this replica.
    pub fn did(&self) -> Did {
        Did::new(&self.scope, &self.name)
    }
}
