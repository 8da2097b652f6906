//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a scratch directory to write
//! source files into, catalogs seeded with storage elements and datasets,
//! and readers that fail or count their drops.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tempfile::TempDir;

use replicator_catalog::{MemoryCatalog, RseAttributes};
use replicator_core::FileSpec;

/// A scratch directory for source files.
pub struct TestFixture {
    pub dir: TempDir,
}

impl TestFixture {
    /// Create a fixture with a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `data` to `name` inside the fixture directory.
    pub fn write_file(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, data).expect("write fixture file");
        path
    }

    /// Write a file and return its `file://` pfn.
    pub fn file_pfn(&self, name: &str, data: &[u8]) -> String {
        format!("file://{}", self.write_file(name, data).display())
    }

    /// Write a file and return a minimal file-list entry for it.
    pub fn file_spec(&self, scope: &str, name: &str, data: &[u8]) -> FileSpec {
        FileSpec::new(scope, self.file_pfn(name, data))
    }

    /// Write `specs` as a JSON file list and return its path.
    pub fn file_list(&self, name: &str, specs: &[FileSpec]) -> PathBuf {
        let json = serde_json::to_vec_pretty(specs).expect("serialize file list");
        self.write_file(name, &json)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A memory catalog with one storage element and the given datasets.
pub fn seeded_catalog(rse: &str, datasets: &[(&str, &str)]) -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    catalog.add_rse(rse, RseAttributes::new());
    for (scope, name) in datasets {
        catalog.add_dataset(*scope, *name);
    }
    catalog
}

/// `len` bytes of a repeating 0..=250 pattern.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// `len` pseudo-random bytes, deterministic for a given seed.
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

/// Counts how many times the readers sharing it were dropped.
#[derive(Debug, Clone, Default)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A reader over in-memory data that can fail after a number of bytes.
pub struct FlakyReader {
    data: Vec<u8>,
    pos: usize,
    fail_after: Option<usize>,
    drops: DropCounter,
}

impl FlakyReader {
    /// A reader that yields all of `data` and then EOF.
    pub fn new(data: Vec<u8>, drops: DropCounter) -> Self {
        Self {
            data,
            pos: 0,
            fail_after: None,
            drops,
        }
    }

    /// A reader that errors once `fail_after` bytes have been handed out.
    pub fn failing_after(data: Vec<u8>, fail_after: usize, drops: DropCounter) -> Self {
        Self {
            data,
            pos: 0,
            fail_after: Some(fail_after),
            drops,
        }
    }
}

impl Read for FlakyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut end = self.data.len();
        if let Some(limit) = self.fail_after {
            if self.pos >= limit {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"));
            }
            end = end.min(limit);
        }

        let n = buf.len().min(end - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Drop for FlakyReader {
    fn drop(&mut self) {
        self.drops.hit();
    }
}
