//! Streaming checksum computation over arbitrary readers.
//!
//! The reader is read in fixed-size chunks into a single reused buffer, so
//! memory use is bounded by the chunk size no matter how large the stream is.
//! Readers are taken by value and dropped exactly once on every exit path.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use md5::{Digest, Md5};

use crate::checksum::{ChecksumAccumulator, ChecksumAlgorithm, StreamDigest};
use crate::error::{CoreError, Result};

/// Default read size per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Checksum a reader with [`DEFAULT_CHUNK_SIZE`].
pub fn checksum_reader<R: Read>(reader: R, algorithm: ChecksumAlgorithm) -> Result<StreamDigest> {
    checksum_reader_with_chunk_size(reader, algorithm, DEFAULT_CHUNK_SIZE)
}

/// Checksum a reader, reading at most `chunk_size` bytes per call.
///
/// The chunk size bounds memory and never changes the digest. Any read error
/// other than `Interrupted` aborts with [`CoreError::StreamUnavailable`] and
/// no partial digest.
pub fn checksum_reader_with_chunk_size<R: Read>(
    mut reader: R,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<StreamDigest> {
    let mut accumulator = ChecksumAccumulator::new(algorithm);
    read_chunks(&mut reader, chunk_size, |chunk| accumulator.update(chunk))?;
    Ok(accumulator.finish())
}

/// Like [`checksum_reader_with_chunk_size`], but also computes the MD5 of the
/// same bytes in the same pass. The MD5 is returned as 32 lowercase hex chars.
pub fn checksum_reader_with_md5<R: Read>(
    mut reader: R,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<(StreamDigest, String)> {
    let mut accumulator = ChecksumAccumulator::new(algorithm);
    let mut md5 = Md5::new();
    read_chunks(&mut reader, chunk_size, |chunk| {
        accumulator.update(chunk);
        md5.update(chunk);
    })?;
    Ok((accumulator.finish(), hex::encode(md5.finalize())))
}

fn read_chunks<R: Read>(
    reader: &mut R,
    chunk_size: usize,
    mut on_chunk: impl FnMut(&[u8]),
) -> Result<()> {
    if chunk_size == 0 {
        return Err(CoreError::InvalidChunkSize);
    }

    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => on_chunk(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::StreamUnavailable(e)),
        }
    }
}

/// One-shot checksum of an in-memory buffer.
pub fn checksum_bytes(data: &[u8], algorithm: ChecksumAlgorithm) -> StreamDigest {
    let mut accumulator = ChecksumAccumulator::new(algorithm);
    accumulator.update(data);
    accumulator.finish()
}

/// Open a local file and stream it through the accumulator.
pub fn checksum_path(path: impl AsRef<Path>, algorithm: ChecksumAlgorithm) -> Result<StreamDigest> {
    let file = File::open(path.as_ref()).map_err(CoreError::StreamUnavailable)?;
    checksum_reader(file, algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::io::{self, Cursor, Write};
    use std::rc::Rc;

    /// Yields `ok_bytes` bytes, then fails. Counts how often it is dropped.
    struct FailingReader {
        remaining: usize,
        drops: Rc<Cell<usize>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(0x5a);
            self.remaining -= n;
            Ok(n)
        }
    }

    impl Drop for FailingReader {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    /// Returns `Interrupted` once before every real read.
    struct InterruptingReader<R> {
        inner: R,
        interrupt: bool,
    }

    impl<R: Read> Read for InterruptingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_empty_stream_yields_seed() {
        let adler = checksum_reader(io::empty(), ChecksumAlgorithm::Adler32).unwrap();
        assert_eq!(adler.digest(), "00000001");
        assert_eq!(adler.length, 0);

        let crc = checksum_reader(io::empty(), ChecksumAlgorithm::Crc32).unwrap();
        assert_eq!(crc.digest(), "00000000");
        assert_eq!(crc.length, 0);
    }

    #[test]
    fn test_abc_adler32() {
        let digest = checksum_reader(Cursor::new(b"abc"), ChecksumAlgorithm::Adler32).unwrap();
        assert_eq!(digest.digest(), "024d0127");
        assert_eq!(digest.length, 3);
    }

    #[test]
    fn test_read_error_mid_stream_is_stream_unavailable_and_drops_once() {
        let drops = Rc::new(Cell::new(0));
        let reader = FailingReader {
            remaining: 500,
            drops: Rc::clone(&drops),
        };

        let result = checksum_reader_with_chunk_size(reader, ChecksumAlgorithm::Adler32, 128);

        assert!(matches!(result, Err(CoreError::StreamUnavailable(_))));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reader_dropped_once_on_success() {
        let drops = Rc::new(Cell::new(0));

        struct Counted<'a> {
            inner: &'a [u8],
            drops: Rc<Cell<usize>>,
        }
        impl Read for Counted<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.inner.read(buf)
            }
        }
        impl Drop for Counted<'_> {
            fn drop(&mut self) {
                self.drops.set(self.drops.get() + 1);
            }
        }

        let reader = Counted {
            inner: b"some bytes",
            drops: Rc::clone(&drops),
        };
        checksum_reader(reader, ChecksumAlgorithm::Crc32).unwrap();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_zero_chunk_size_rejected_and_reader_dropped() {
        let drops = Rc::new(Cell::new(0));
        let reader = FailingReader {
            remaining: 10,
            drops: Rc::clone(&drops),
        };
        let result = checksum_reader_with_chunk_size(reader, ChecksumAlgorithm::Adler32, 0);
        assert!(matches!(result, Err(CoreError::InvalidChunkSize)));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_chunk_size_one_matches_4096_on_10k_pattern() {
        let data = pattern(10_000);
        for algorithm in ChecksumAlgorithm::ALL {
            let small = checksum_reader_with_chunk_size(&data[..], algorithm, 1).unwrap();
            let large = checksum_reader_with_chunk_size(&data[..], algorithm, 4096).unwrap();
            assert_eq!(small, large);
            assert_eq!(small.length, 10_000);
        }
    }

    #[test]
    fn test_interrupted_reads_are_reissued() {
        let data = pattern(3000);
        let reader = InterruptingReader {
            inner: &data[..],
            interrupt: false,
        };
        let digest = checksum_reader(reader, ChecksumAlgorithm::Adler32).unwrap();
        assert_eq!(digest, checksum_bytes(&data, ChecksumAlgorithm::Adler32));
    }

    #[test]
    fn test_md5_in_same_pass() {
        let (digest, md5) =
            checksum_reader_with_md5(&b"abc"[..], ChecksumAlgorithm::Adler32, 1).unwrap();
        assert_eq!(digest.digest(), "024d0127");
        assert_eq!(digest.length, 3);
        assert_eq!(md5, "900150983cd24fb0d6963f7d28e17f72");

        let (_, empty) =
            checksum_reader_with_md5(io::empty(), ChecksumAlgorithm::Crc32, 64).unwrap();
        assert_eq!(empty, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_md5_read_error_drops_reader_once() {
        let drops = Rc::new(Cell::new(0));
        let reader = FailingReader {
            remaining: 500,
            drops: Rc::clone(&drops),
        };
        let result = checksum_reader_with_md5(reader, ChecksumAlgorithm::Crc32, 128);
        assert!(matches!(result, Err(CoreError::StreamUnavailable(_))));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_checksum_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        file.flush().unwrap();

        let digest = checksum_path(file.path(), ChecksumAlgorithm::Adler32).unwrap();
        assert_eq!(digest.digest(), "024d0127");
    }

    #[test]
    fn test_checksum_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = checksum_path(dir.path().join("nope"), ChecksumAlgorithm::Crc32).unwrap_err();
        assert!(err.is_stream_unavailable());
    }

    proptest! {
        #[test]
        fn chunking_never_changes_digest(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            c1 in 1usize..2048,
            c2 in 1usize..2048,
        ) {
            for algorithm in ChecksumAlgorithm::ALL {
                let a = checksum_reader_with_chunk_size(&data[..], algorithm, c1).unwrap();
                let b = checksum_reader_with_chunk_size(&data[..], algorithm, c2).unwrap();
                prop_assert_eq!(a, b);
                prop_assert_eq!(a.length, data.len() as u64);
            }
        }

        #[test]
        fn streaming_matches_one_shot(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            for algorithm in ChecksumAlgorithm::ALL {
                let streamed = checksum_reader(&data[..], algorithm).unwrap();
                prop_assert_eq!(streamed, checksum_bytes(&data, algorithm));
            }
        }

        #[test]
        fn digest_is_eight_lowercase_hex(value in any::<u32>()) {
            let hex = crate::Checksum(value).to_hex();
            prop_assert_eq!(hex.len(), 8);
            prop_assert!(hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }
}
