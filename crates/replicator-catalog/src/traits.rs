//! Catalog trait: the abstract interface for replica registration.
//!
//! Implementations include an HTTP client for a Rucio-style server and an
//! in-memory catalog for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use replicator_core::{Did, ReplicaRecord};

use crate::error::Result;

/// Attributes attached to a storage element.
pub type RseAttributes = BTreeMap<String, serde_json::Value>;

/// The Catalog trait: async interface for replica registration.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Register a batch of replicas on a storage element.
    ///
    /// The batch succeeds or fails as a whole.
    async fn add_replicas(&self, rse: &str, files: &[ReplicaRecord]) -> Result<()>;

    /// Attach data identifiers to the dataset `scope:name`.
    async fn attach_dids(&self, scope: &str, name: &str, dids: &[Did]) -> Result<()>;

    /// List the attributes of a storage element.
    async fn list_rse_attributes(&self, rse: &str) -> Result<RseAttributes>;
}
