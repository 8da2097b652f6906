//! Opening the byte stream behind a pfn.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use replicator_core::Pfn;

/// Opens a readable stream for a pfn.
///
/// Called from a blocking thread, never from the async runtime, so
/// implementations may block freely.
pub trait SourceOpener: Send + Sync + 'static {
    fn open(&self, pfn: &Pfn) -> io::Result<Box<dyn Read + Send>>;
}

/// Opens local files and HTTP(S) resources.
#[derive(Debug, Clone, Default)]
pub struct DefaultOpener {
    http_timeout: Option<Duration>,
}

impl DefaultOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit each HTTP download to `timeout` end to end.
    pub fn with_http_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http_timeout = timeout;
        self
    }

    fn open_http(&self, pfn: &Pfn) -> io::Result<Box<dyn Read + Send>> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(io::Error::other)?;

        let response = client.get(pfn.as_str()).send().map_err(io::Error::other)?;
        let status = response.status();
        if !status.is_success() {
            return Err(io::Error::other(format!("GET {pfn} returned {status}")));
        }
        Ok(Box::new(response))
    }
}

impl SourceOpener for DefaultOpener {
    fn open(&self, pfn: &Pfn) -> io::Result<Box<dyn Read + Send>> {
        match pfn.scheme() {
            "file" => Ok(Box::new(File::open(pfn.path())?)),
            "http" | "https" => self.open_http(pfn),
            scheme => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot open {scheme} sources"),
            )),
        }
    }
}

/// Serves sources from memory, keyed by the pfn string.
#[derive(Default)]
pub struct MemoryOpener {
    sources: RwLock<HashMap<String, Vec<u8>>>,
    opens: AtomicUsize,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, pfn: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.sources
            .write()
            .unwrap()
            .insert(pfn.into(), data.into());
    }

    /// Number of successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&self, pfn: &Pfn) -> io::Result<Box<dyn Read + Send>> {
        let data = self
            .sources
            .read()
            .unwrap()
            .get(pfn.as_str())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, pfn.to_string()))?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Cursor::new(data)))
    }
}
