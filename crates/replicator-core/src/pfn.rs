//! Physical file names: where the bytes of a replica actually live.
//!
//! A pfn looks like `scheme://host/path`. Strings without a scheme are
//! treated as local paths under the `file` scheme.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A parsed physical file name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pfn {
    raw: String,
    scheme: String,
    host: String,
    path: String,
}

impl Pfn {
    /// Parse a pfn string.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidPfn("empty pfn".into()));
        }

        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Ok(Self {
                raw: trimmed.to_string(),
                scheme: "file".into(),
                host: String::new(),
                path: trimmed.to_string(),
            });
        };

        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(CoreError::InvalidPfn(format!("bad scheme in {trimmed}")));
        }

        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        if host.is_empty() && path.is_empty() {
            return Err(CoreError::InvalidPfn(format!("no location in {trimmed}")));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// The pfn as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased scheme (`file` for bare paths).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host part, empty for local paths.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path part, including its leading `/` when one was present.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last non-empty path segment, used as the replica name.
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').find(|segment| !segment.is_empty())
    }

    /// Whether this pfn points at the local filesystem.
    pub fn is_local(&self) -> bool {
        self.scheme == "file"
    }
}

impl fmt::Debug for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pfn({})", self.raw)
    }
}

impl fmt::Display for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Pfn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Pfn::parse(s)
    }
}

impl Serialize for Pfn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Pfn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pfn::parse(&raw).map_err(serde::de::Error::custom)
    }
}
