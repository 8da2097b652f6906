//! Checksum algorithms, running accumulator state, and digest rendering.
//!
//! Every supported algorithm is a 32-bit checksum defined by a seed (the
//! checksum of empty input) and a two-argument update function that folds
//! more bytes into a previous value. The accumulator threads that value
//! through every chunk, so chunk boundaries never affect the result.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// The checksum algorithms understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// Adler-32 (RFC 1950), the catalog's default.
    #[default]
    Adler32,
    /// CRC-32 (IEEE 802.3, as used by zlib).
    Crc32,
}

impl ChecksumAlgorithm {
    /// All supported algorithms.
    pub const ALL: [ChecksumAlgorithm; 2] = [ChecksumAlgorithm::Adler32, ChecksumAlgorithm::Crc32];

    /// The checksum of empty input.
    pub const fn seed(self) -> u32 {
        match self {
            ChecksumAlgorithm::Adler32 => 1,
            ChecksumAlgorithm::Crc32 => 0,
        }
    }

    /// Fold `data` into a previous checksum value.
    ///
    /// `update(update(seed, a), b) == update(seed, a ++ b)` for every split.
    pub fn update(self, state: u32, data: &[u8]) -> u32 {
        match self {
            ChecksumAlgorithm::Adler32 => {
                let mut rolling = adler32::RollingAdler32::from_value(state);
                rolling.update_buffer(data);
                rolling.hash()
            }
            ChecksumAlgorithm::Crc32 => {
                let mut hasher = crc32fast::Hasher::new_with_initial(state);
                hasher.update(data);
                hasher.finalize()
            }
        }
    }

    /// The name of the replica field that carries this checksum.
    pub const fn field_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Adler32 => "adler32",
            ChecksumAlgorithm::Crc32 => "crc32",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "adler32" | "adler-32" => Ok(ChecksumAlgorithm::Adler32),
            "crc32" | "crc-32" => Ok(ChecksumAlgorithm::Crc32),
            _ => Err(CoreError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// A finished 32-bit checksum value.
///
/// Always rendered as exactly 8 lowercase, zero-padded hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(pub u32);

impl Checksum {
    /// Build from a value that may carry a signed 32-bit representation.
    ///
    /// Negative values in `i32` range are mapped onto their unsigned
    /// equivalent by adding 2^32. Anything outside `i32::MIN..=u32::MAX`
    /// is rejected.
    pub fn from_signed(value: i64) -> Result<Self> {
        if value < i64::from(i32::MIN) {
            return Err(CoreError::InvalidChecksum(value.to_string()));
        }
        let normalized = if value < 0 { value + (1i64 << 32) } else { value };
        u32::try_from(normalized)
            .map(Checksum)
            .map_err(|_| CoreError::InvalidChecksum(value.to_string()))
    }

    /// Parse from hex. Shorter inputs are treated as if zero-padded.
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() > 8 {
            return Err(CoreError::InvalidChecksum(s.to_string()));
        }
        let padded = format!("{trimmed:0>8}");
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| CoreError::InvalidChecksum(s.to_string()))?;
        Ok(Checksum(u32::from_be_bytes(bytes)))
    }

    /// Render as 8 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("{:08x}", self.0)
    }

    /// The raw value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({:08x})", self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Checksum::from_hex(s)
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Checksum(value)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // File lists written by other tools sometimes carry the raw integer,
        // possibly in its signed form.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hex(String),
            Int(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Hex(s) => Checksum::from_hex(&s).map_err(serde::de::Error::custom),
            Raw::Int(v) => Checksum::from_signed(v).map_err(serde::de::Error::custom),
        }
    }
}

/// Running checksum state for one stream.
#[derive(Debug, Clone)]
pub struct ChecksumAccumulator {
    algorithm: ChecksumAlgorithm,
    state: u32,
    length: u64,
}

impl ChecksumAccumulator {
    /// Start from the algorithm's seed with nothing read.
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self {
            algorithm,
            state: algorithm.seed(),
            length: 0,
        }
    }

    /// Fold one chunk into the running state.
    pub fn update(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.state = self.algorithm.update(self.state, chunk);
        self.length += chunk.len() as u64;
    }

    /// The algorithm this accumulator runs.
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Bytes folded in so far.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Consume the accumulator and produce the final digest.
    pub fn finish(self) -> StreamDigest {
        StreamDigest {
            algorithm: self.algorithm,
            checksum: Checksum(self.state),
            length: self.length,
        }
    }
}

/// Final result of checksumming a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDigest {
    pub algorithm: ChecksumAlgorithm,
    pub checksum: Checksum,
    /// Total bytes read.
    pub length: u64,
}

impl StreamDigest {
    /// The 8-character hex digest.
    pub fn digest(&self) -> String {
        self.checksum.to_hex()
    }
}
