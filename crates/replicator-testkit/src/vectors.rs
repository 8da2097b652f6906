//! Golden checksum vectors.
//!
//! Published reference values for both algorithms. Every digest path
//! (one-shot, streamed, any chunk size) must reproduce them exactly.

use replicator_core::ChecksumAlgorithm;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct ChecksumVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub algorithm: ChecksumAlgorithm,
    pub input: &'static [u8],
    /// Expected digest (8 lowercase hex chars).
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<ChecksumVector> {
    let mut vectors = adler32_vectors();
    vectors.extend(crc32_vectors());
    vectors
}

/// Adler-32 reference values.
pub fn adler32_vectors() -> Vec<ChecksumVector> {
    use ChecksumAlgorithm::Adler32;
    vec![
        ChecksumVector {
            name: "adler32 empty",
            algorithm: Adler32,
            input: b"",
            expected: "00000001",
        },
        ChecksumVector {
            name: "adler32 abc",
            algorithm: Adler32,
            input: b"abc",
            expected: "024d0127",
        },
        ChecksumVector {
            name: "adler32 hello",
            algorithm: Adler32,
            input: b"hello",
            expected: "062c0215",
        },
        ChecksumVector {
            name: "adler32 Adler-32",
            algorithm: Adler32,
            input: b"Adler-32",
            expected: "0c34027b",
        },
        ChecksumVector {
            name: "adler32 check string",
            algorithm: Adler32,
            input: b"123456789",
            expected: "091e01de",
        },
        ChecksumVector {
            name: "adler32 Wikipedia",
            algorithm: Adler32,
            input: b"Wikipedia",
            expected: "11e60398",
        },
    ]
}

/// CRC-32 (IEEE) reference values.
pub fn crc32_vectors() -> Vec<ChecksumVector> {
    use ChecksumAlgorithm::Crc32;
    vec![
        ChecksumVector {
            name: "crc32 empty",
            algorithm: Crc32,
            input: b"",
            expected: "00000000",
        },
        ChecksumVector {
            name: "crc32 abc",
            algorithm: Crc32,
            input: b"abc",
            expected: "352441c2",
        },
        ChecksumVector {
            name: "crc32 check string",
            algorithm: Crc32,
            input: b"123456789",
            expected: "cbf43926",
        },
        ChecksumVector {
            name: "crc32 quick brown fox",
            algorithm: Crc32,
            input: b"The quick brown fox jumps over the lazy dog",
            expected: "414fa339",
        },
    ]
}
