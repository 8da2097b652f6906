//! End-to-end registration against temp files and an in-memory catalog.

use std::io::{self, Read};

use serde_json::Value;

use replicator::catalog::MemoryCatalog;
use replicator::core::checksum_bytes;
use replicator::{
    load_file_list, ChecksumAlgorithm, Config, DefaultOpener, FileSpec, Pfn, RegistrationError,
    Registrar, SourceOpener,
};
use replicator_testkit::fixtures::{
    pattern, random_bytes, seeded_catalog, DropCounter, FlakyReader, TestFixture,
};

const RSE: &str = "SITE_DISK";
const SCOPE: &str = "user.test";

fn registrar(config: &Config) -> Registrar<MemoryCatalog, DefaultOpener> {
    Registrar::new(
        seeded_catalog(RSE, &[(SCOPE, "run1")]),
        DefaultOpener::new(),
        config.registrar_config(),
    )
}

#[tokio::test]
async fn register_file_list_from_disk() {
    let fixture = TestFixture::new();
    let big = random_bytes(1, 300_000);

    let mut a = fixture.file_spec(SCOPE, "a.bin", b"abc");
    a.dataset = Some("run1".into());
    let b = fixture.file_spec(SCOPE, "nested/b.h5", &big);
    let mut c = fixture.file_spec(SCOPE, "c.bin", b"hello");
    c.name = Some("c-renamed".into());
    let list = fixture.file_list("files.json", &[a, b, c]);

    let specs = load_file_list(&list).unwrap();
    let config = Config::from_toml_str("[registration]\nchunk_size = 4096").unwrap();
    let r = registrar(&config);
    let report = r.register_files(RSE, &specs).await;

    assert!(report.is_success());
    assert_eq!(report.success_count(), 3);

    let catalog = r.catalog();
    let a = catalog.replica(RSE, SCOPE, "a.bin").unwrap();
    assert_eq!(a.adler32.unwrap().to_hex(), "024d0127");
    assert_eq!(a.bytes, 3);

    let b = catalog.replica(RSE, SCOPE, "b.h5").unwrap();
    assert_eq!(b.adler32, Some(checksum_bytes(&big, ChecksumAlgorithm::Adler32).checksum));
    assert_eq!(b.bytes, 300_000);

    assert!(catalog.replica(RSE, SCOPE, "c-renamed").is_some());
    assert_eq!(catalog.dataset_contents(SCOPE, "run1").unwrap().len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("registerlog.json");
    assert!(!report.write_failure_log(&log).unwrap());
}

#[tokio::test]
async fn failures_are_logged_with_original_entries() {
    let fixture = TestFixture::new();
    let good = fixture.file_spec(SCOPE, "good.bin", b"abc");

    let mut mismatched = fixture.file_spec(SCOPE, "mismatch.bin", b"abc");
    mismatched.adler32 = Some("00000001".parse().unwrap());
    mismatched.extra.insert("campaign".into(), Value::from("nightly"));

    let missing = FileSpec::new(SCOPE, format!("file://{}/gone.bin", fixture.path().display()));
    let unsupported = FileSpec::new(SCOPE, "gsiftp://host/data/x.bin");

    let specs = vec![good, mismatched, missing, unsupported];
    let r = registrar(&Config::default());
    let report = r.register_files(RSE, &specs).await;

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failure_count(), 3);
    assert_eq!(r.catalog().replica_count(), 1);

    let errors: Vec<_> = report.failures().map(|(_, e)| e).collect();
    assert!(matches!(errors[0], RegistrationError::ChecksumMismatch { .. }));
    assert!(matches!(errors[1], RegistrationError::Checksum(_)));
    assert!(matches!(errors[2], RegistrationError::UnsupportedScheme { .. }));

    let log_path = fixture.path().join("registerlog.json");
    assert!(report.write_failure_log(&log_path).unwrap());
    let log: Vec<Value> = serde_json::from_slice(&std::fs::read(&log_path).unwrap()).unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0]["campaign"], "nightly");
    assert_eq!(log[0]["adler32"], "00000001");
    assert!(log.iter().all(|entry| entry["error"].is_string()));
}

#[tokio::test]
async fn trusted_values_register_unreachable_sources() {
    let mut spec = FileSpec::new(SCOPE, "https://unreachable.invalid/data/x.bin");
    spec.bytes = Some(1 << 30);
    spec.adler32 = Some("0badc0de".parse().unwrap());

    let config = Config::from_toml_str("[registration]\ntrust_precomputed = true").unwrap();
    let r = registrar(&config);

    let registered = r.register_file(RSE, &spec).await.unwrap();
    assert!(!registered.computed);
    assert_eq!(registered.record.bytes, 1 << 30);
}

/// Serves every pfn from a reader that dies partway through.
struct BrokenOpener {
    drops: DropCounter,
}

impl SourceOpener for BrokenOpener {
    fn open(&self, _pfn: &Pfn) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(FlakyReader::failing_after(
            pattern(4096),
            500,
            self.drops.clone(),
        )))
    }
}

#[tokio::test]
async fn read_failure_midway_registers_nothing() {
    let drops = DropCounter::new();
    let r = Registrar::new(
        seeded_catalog(RSE, &[]),
        BrokenOpener {
            drops: drops.clone(),
        },
        Config::default().registrar_config(),
    );

    let specs = vec![
        FileSpec::new(SCOPE, "file:///data/a.bin"),
        FileSpec::new(SCOPE, "file:///data/b.bin"),
    ];
    let report = r.register_files(RSE, &specs).await;

    assert_eq!(report.failure_count(), 2);
    for (_, err) in report.failures() {
        match err {
            RegistrationError::Checksum(e) => assert!(e.is_stream_unavailable()),
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(r.catalog().replica_count(), 0);
    assert_eq!(drops.count(), 2);
}

#[test]
fn malformed_file_list_is_rejected() {
    let fixture = TestFixture::new();
    let path = fixture.write_file("bad.json", b"{\"not\": \"a list\"}");
    assert!(load_file_list(&path).is_err());
    assert!(load_file_list(fixture.path().join("absent.json")).is_err());
}
