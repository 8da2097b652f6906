//! In-memory implementation of the Catalog trait.
//!
//! This is primarily for testing and dry runs. It follows the same rules as
//! a real catalog but keeps everything in memory with no persistence.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use replicator_core::{Did, ReplicaRecord};

use crate::error::{CatalogError, Result};
use crate::traits::{Catalog, RseAttributes};

/// In-memory catalog implementation.
///
/// All data is lost when the catalog is dropped. Thread-safe via RwLock.
pub struct MemoryCatalog {
    inner: RwLock<MemoryCatalogInner>,
}

struct MemoryCatalogInner {
    /// Known storage elements and their attributes.
    rses: HashMap<String, RseAttributes>,

    /// Replicas indexed by (rse, scope, name).
    replicas: HashMap<(String, String, String), ReplicaRecord>,

    /// Dataset contents indexed by (scope, name).
    datasets: HashMap<(String, String), BTreeSet<Did>>,

    /// When set, every call fails as if the server were down.
    unavailable: bool,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryCatalogInner {
                rses: HashMap::new(),
                replicas: HashMap::new(),
                datasets: HashMap::new(),
                unavailable: false,
            }),
        }
    }

    /// Register a storage element.
    pub fn add_rse(&self, rse: impl Into<String>, attributes: RseAttributes) {
        let mut inner = self.inner.write().unwrap();
        inner.rses.insert(rse.into(), attributes);
    }

    /// Create an empty dataset.
    pub fn add_dataset(&self, scope: impl Into<String>, name: impl Into<String>) {
        let mut inner = self.inner.write().unwrap();
        inner.datasets.entry((scope.into(), name.into())).or_default();
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unwrap().unavailable = unavailable;
    }

    /// Look up a registered replica.
    pub fn replica(&self, rse: &str, scope: &str, name: &str) -> Option<ReplicaRecord> {
        let inner = self.inner.read().unwrap();
        inner
            .replicas
            .get(&(rse.to_string(), scope.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of registered replicas across all storage elements.
    pub fn replica_count(&self) -> usize {
        self.inner.read().unwrap().replicas.len()
    }

    /// The dids attached to a dataset, if it exists.
    pub fn dataset_contents(&self, scope: &str, name: &str) -> Option<Vec<Did>> {
        let inner = self.inner.read().unwrap();
        inner
            .datasets
            .get(&(scope.to_string(), name.to_string()))
            .map(|dids| dids.iter().cloned().collect())
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalogInner {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(CatalogError::Api {
                status: 503,
                body: "catalog unavailable".into(),
            });
        }
        Ok(())
    }

    fn has_any_replica(&self, did: &Did) -> bool {
        self.replicas
            .keys()
            .any(|(_, scope, name)| *scope == did.scope && *name == did.name)
    }
}

/// Same did on the same storage element but different content.
fn conflicts(existing: &ReplicaRecord, file: &ReplicaRecord) -> bool {
    existing.bytes != file.bytes || existing.adler32 != file.adler32 || existing.crc32 != file.crc32
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn add_replicas(&self, rse: &str, files: &[ReplicaRecord]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.check_available()?;

        if !inner.rses.contains_key(rse) {
            return Err(CatalogError::RseNotFound(rse.to_string()));
        }

        // Validate the whole batch, against stored replicas and against
        // itself, before touching anything
        let mut batch: HashMap<(String, String, String), &ReplicaRecord> = HashMap::new();
        for file in files {
            let key = (rse.to_string(), file.scope.clone(), file.name.clone());
            let previous = batch
                .get(&key)
                .copied()
                .or_else(|| inner.replicas.get(&key));
            if previous.is_some_and(|existing| conflicts(existing, file)) {
                return Err(CatalogError::Duplicate {
                    rse: rse.to_string(),
                    scope: file.scope.clone(),
                    name: file.name.clone(),
                });
            }
            batch.insert(key, file);
        }

        for (key, file) in batch {
            inner.replicas.insert(key, file.clone());
        }

        Ok(())
    }

    async fn attach_dids(&self, scope: &str, name: &str, dids: &[Did]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.check_available()?;

        let key = (scope.to_string(), name.to_string());
        if !inner.datasets.contains_key(&key) {
            return Err(CatalogError::DidNotFound {
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }

        if let Some(missing) = dids.iter().find(|did| !inner.has_any_replica(did)) {
            return Err(CatalogError::DidNotFound {
                scope: missing.scope.clone(),
                name: missing.name.clone(),
            });
        }

        if let Some(contents) = inner.datasets.get_mut(&key) {
            contents.extend(dids.iter().cloned());
        }

        Ok(())
    }

    async fn list_rse_attributes(&self, rse: &str) -> Result<RseAttributes> {
        let inner = self.inner.read().unwrap();
        inner.check_available()?;
        inner
            .rses
            .get(rse)
            .cloned()
            .ok_or_else(|| CatalogError::RseNotFound(rse.to_string()))
    }
}
