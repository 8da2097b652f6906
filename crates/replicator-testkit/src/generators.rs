//! Proptest generators for property-based testing.

use proptest::prelude::*;

use replicator_core::{Checksum, ChecksumAlgorithm, FileSpec};

/// Generate a checksum algorithm.
pub fn algorithm() -> impl Strategy<Value = ChecksumAlgorithm> {
    prop_oneof![Just(ChecksumAlgorithm::Adler32), Just(ChecksumAlgorithm::Crc32)]
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a valid chunk size, biased toward small values.
pub fn chunk_size() -> impl Strategy<Value = usize> {
    prop_oneof![3 => 1usize..=16, 1 => 17usize..=8192]
}

/// Generate any checksum value.
pub fn checksum() -> impl Strategy<Value = Checksum> {
    any::<u32>().prop_map(Checksum)
}

/// Generate a catalog scope such as `user.jdoe`.
pub fn scope() -> impl Strategy<Value = String> {
    "[a-z]{2,8}(\\.[a-z]{2,8})?"
}

/// Generate a file name with an extension.
pub fn file_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}\\.(bin|h5|dat)"
}

/// Generate a local file pfn.
pub fn file_pfn() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-z0-9]{1,8}", 0..4), file_name()).prop_map(|(dirs, name)| {
        let mut pfn = String::from("file:///");
        for dir in dirs {
            pfn.push_str(&dir);
            pfn.push('/');
        }
        pfn.push_str(&name);
        pfn
    })
}

/// Generate a file-list entry with optional precomputed values.
pub fn file_spec() -> impl Strategy<Value = FileSpec> {
    (
        scope(),
        file_pfn(),
        proptest::option::of(0u64..1 << 40),
        proptest::option::of(checksum()),
        proptest::option::of("[a-z]{3,10}"),
    )
        .prop_map(|(scope, pfn, bytes, adler32, dataset)| {
            let mut spec = FileSpec::new(scope, pfn);
            spec.bytes = bytes;
            spec.adler32 = adler32;
            spec.dataset = dataset;
            spec
        })
}
