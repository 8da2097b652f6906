//! The Registrar: checksum sources and register them as replicas.
//!
//! Every file in a batch gets its own outcome. A file that fails (bad pfn,
//! unreadable source, checksum mismatch, catalog refusal) is reported and the
//! batch moves on to the next one.

use std::collections::BTreeSet;
use std::sync::Arc;

use replicator_catalog::Catalog;
use replicator_core::{
    checksum_reader_with_md5, ChecksumAlgorithm, CoreError, FileSpec, Pfn, ReplicaRecord,
    StreamDigest, DEFAULT_CHUNK_SIZE,
};

use crate::error::RegistrationError;
use crate::report::RegistrationReport;
use crate::source::SourceOpener;

/// Configuration for registration behavior.
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    /// Pfn schemes that may be registered.
    pub allowed_schemes: BTreeSet<String>,
    /// Algorithm computed and recorded for every replica.
    pub algorithm: ChecksumAlgorithm,
    /// Bytes read per chunk while checksumming.
    pub chunk_size: usize,
    /// Use size and checksum from the file list as-is when both are present.
    pub trust_precomputed: bool,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: ["file", "http", "https"]
                .into_iter()
                .map(String::from)
                .collect(),
            algorithm: ChecksumAlgorithm::Adler32,
            chunk_size: DEFAULT_CHUNK_SIZE,
            trust_precomputed: false,
        }
    }
}

/// A replica that made it into the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredReplica {
    pub record: ReplicaRecord,
    /// Dataset the replica was attached to, if any.
    pub attached_to: Option<String>,
    /// Whether the checksum was computed from the source rather than trusted.
    pub computed: bool,
}

/// Registers replicas in a catalog.
pub struct Registrar<C: Catalog, O: SourceOpener> {
    catalog: C,
    opener: Arc<O>,
    config: RegistrarConfig,
}

impl<C: Catalog, O: SourceOpener> Registrar<C, O> {
    pub fn new(catalog: C, opener: O, config: RegistrarConfig) -> Self {
        Self {
            catalog,
            opener: Arc::new(opener),
            config,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Register one file on `rse`.
    pub async fn register_file(
        &self,
        rse: &str,
        spec: &FileSpec,
    ) -> Result<RegisteredReplica, RegistrationError> {
        let pfn = Pfn::parse(&spec.pfn).map_err(|e| RegistrationError::InvalidPfn {
            pfn: spec.pfn.clone(),
            reason: e.to_string(),
        })?;

        if !self.config.allowed_schemes.contains(pfn.scheme()) {
            return Err(RegistrationError::UnsupportedScheme {
                pfn: spec.pfn.clone(),
                scheme: pfn.scheme().to_string(),
            });
        }

        let name = spec
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| pfn.file_name())
            .map(str::to_string)
            .ok_or_else(|| RegistrationError::InvalidPfn {
                pfn: spec.pfn.clone(),
                reason: "no file name".into(),
            })?;

        let algorithm = self.config.algorithm;
        let (digest, md5, computed) = match spec.precomputed_digest(algorithm) {
            Some(digest) if self.config.trust_precomputed => {
                tracing::debug!(pfn = %pfn, "using precomputed checksum");
                (digest, spec.md5.clone(), false)
            }
            _ => {
                let (digest, md5) = self.compute(&pfn).await?;
                verify(spec, &digest, &md5)?;
                (digest, Some(md5), true)
            }
        };

        tracing::debug!(
            pfn = %pfn,
            %algorithm,
            checksum = %digest.checksum,
            bytes = digest.length,
            "checksum ready"
        );

        let record = ReplicaRecord::new(&spec.scope, name, pfn, &digest).with_md5(md5);
        self.catalog
            .add_replicas(rse, std::slice::from_ref(&record))
            .await?;

        let attached_to = match &spec.dataset {
            Some(dataset) => {
                self.catalog
                    .attach_dids(&spec.scope, dataset, &[record.did()])
                    .await
                    .map_err(|source| RegistrationError::Attach {
                        dataset: dataset.clone(),
                        source,
                    })?;
                Some(dataset.clone())
            }
            None => None,
        };

        Ok(RegisteredReplica {
            record,
            attached_to,
            computed,
        })
    }

    /// Register every file on `rse`, one at a time.
    pub async fn register_files(&self, rse: &str, specs: &[FileSpec]) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for spec in specs {
            let outcome = self.register_file(rse, spec).await;
            match &outcome {
                Ok(registered) => tracing::info!(
                    rse,
                    scope = %registered.record.scope,
                    name = %registered.record.name,
                    bytes = registered.record.bytes,
                    dataset = registered.attached_to.as_deref(),
                    "replica registered"
                ),
                Err(e) => tracing::error!(rse, pfn = %spec.pfn, error = %e, "registration failed"),
            }
            report.outcomes.push((spec.clone(), outcome));
        }

        tracing::info!(
            rse,
            registered = report.success_count(),
            failed = report.failure_count(),
            "registration finished"
        );
        report
    }

    /// Stream the source through the checksum accumulator on a blocking thread.
    /// The md5 of the same bytes comes out of the same pass.
    async fn compute(&self, pfn: &Pfn) -> Result<(StreamDigest, String), RegistrationError> {
        let opener = Arc::clone(&self.opener);
        let pfn = pfn.clone();
        let algorithm = self.config.algorithm;
        let chunk_size = self.config.chunk_size;

        let result = tokio::task::spawn_blocking(move || {
            let reader = opener.open(&pfn).map_err(CoreError::StreamUnavailable)?;
            checksum_reader_with_md5(reader, algorithm, chunk_size)
        })
        .await
        .map_err(|e| RegistrationError::Join(e.to_string()))?;

        Ok(result?)
    }
}

/// Compare a computed digest with whatever the file list claimed.
fn verify(spec: &FileSpec, digest: &StreamDigest, md5: &str) -> Result<(), RegistrationError> {
    if let Some(expected) = spec.precomputed(digest.algorithm) {
        if expected != digest.checksum {
            return Err(RegistrationError::ChecksumMismatch {
                pfn: spec.pfn.clone(),
                expected,
                computed: digest.checksum,
            });
        }
    }
    if let Some(expected) = spec.bytes {
        if expected != digest.length {
            return Err(RegistrationError::SizeMismatch {
                pfn: spec.pfn.clone(),
                expected,
                computed: digest.length,
            });
        }
    }
    if let Some(expected) = &spec.md5 {
        if !expected.eq_ignore_ascii_case(md5) {
            return Err(RegistrationError::Md5Mismatch {
                pfn: spec.pfn.clone(),
                expected: expected.clone(),
                computed: md5.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryOpener;
    use replicator_catalog::{CatalogError, MemoryCatalog, RseAttributes};
    use replicator_core::{checksum_bytes, Checksum};

    const RSE: &str = "RUCIOTEST";

    fn registrar(config: RegistrarConfig) -> Registrar<MemoryCatalog, MemoryOpener> {
        let catalog = MemoryCatalog::new();
        catalog.add_rse(RSE, RseAttributes::new());
        catalog.add_dataset("user.test", "ds");

        let opener = MemoryOpener::new();
        opener.insert("https://host/data/a.bin", b"abc".to_vec());
        opener.insert("https://host/data/b.bin", b"hello".to_vec());

        Registrar::new(catalog, opener, config)
    }

    #[tokio::test]
    async fn test_register_computes_checksum() {
        let r = registrar(RegistrarConfig::default());
        let spec = FileSpec::new("user.test", "https://host/data/a.bin");

        let registered = r.register_file(RSE, &spec).await.unwrap();
        assert!(registered.computed);
        assert_eq!(registered.attached_to, None);
        assert_eq!(registered.record.name, "a.bin");
        assert_eq!(registered.record.bytes, 3);
        assert_eq!(registered.record.adler32.unwrap().to_hex(), "024d0127");
        assert_eq!(
            registered.record.md5.as_deref(),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );
        assert!(r.catalog().replica(RSE, "user.test", "a.bin").is_some());
    }

    #[tokio::test]
    async fn test_listed_md5_is_verified() {
        let r = registrar(RegistrarConfig::default());

        let mut good = FileSpec::new("user.test", "https://host/data/a.bin");
        good.md5 = Some("900150983CD24FB0D6963F7D28E17F72".into());
        let registered = r.register_file(RSE, &good).await.unwrap();
        assert_eq!(
            registered.record.md5.as_deref(),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );

        let mut bad = FileSpec::new("user.test", "https://host/data/b.bin");
        bad.md5 = Some("0123456789abcdef0123456789abcdef".into());
        assert!(matches!(
            r.register_file(RSE, &bad).await,
            Err(RegistrationError::Md5Mismatch { .. })
        ));
        assert_eq!(r.catalog().replica_count(), 1);
    }

    #[tokio::test]
    async fn test_explicit_name_and_crc32() {
        let r = registrar(RegistrarConfig {
            algorithm: ChecksumAlgorithm::Crc32,
            ..RegistrarConfig::default()
        });
        let mut spec = FileSpec::new("user.test", "https://host/data/a.bin");
        spec.name = Some("renamed".into());

        let registered = r.register_file(RSE, &spec).await.unwrap();
        assert_eq!(registered.record.name, "renamed");
        assert_eq!(registered.record.crc32.unwrap().to_hex(), "352441c2");
        assert_eq!(registered.record.adler32, None);
    }

    #[tokio::test]
    async fn test_trusted_precomputed_values_skip_the_source() {
        let r = registrar(RegistrarConfig {
            trust_precomputed: true,
            ..RegistrarConfig::default()
        });
        let mut spec = FileSpec::new("user.test", "https://host/data/unreadable.bin");
        spec.bytes = Some(42);
        spec.adler32 = Some(Checksum(0xdeadbeef));
        spec.md5 = Some("0123456789abcdef0123456789abcdef".into());

        let registered = r.register_file(RSE, &spec).await.unwrap();
        assert!(!registered.computed);
        assert_eq!(registered.record.bytes, 42);
        assert_eq!(registered.record.adler32, Some(Checksum(0xdeadbeef)));
        assert_eq!(registered.record.md5, spec.md5);
        assert_eq!(r.opener().opens(), 0);
    }

    #[tokio::test]
    async fn test_untrusted_precomputed_values_are_verified() {
        let r = registrar(RegistrarConfig::default());

        let mut good = FileSpec::new("user.test", "https://host/data/a.bin");
        good.bytes = Some(3);
        good.adler32 = Some(checksum_bytes(b"abc", ChecksumAlgorithm::Adler32).checksum);
        assert!(r.register_file(RSE, &good).await.unwrap().computed);

        let mut bad_sum = FileSpec::new("user.test", "https://host/data/b.bin");
        bad_sum.adler32 = Some(Checksum(1));
        assert!(matches!(
            r.register_file(RSE, &bad_sum).await,
            Err(RegistrationError::ChecksumMismatch { .. })
        ));

        let mut bad_size = FileSpec::new("user.test", "https://host/data/b.bin");
        bad_size.bytes = Some(6);
        assert!(matches!(
            r.register_file(RSE, &bad_size).await,
            Err(RegistrationError::SizeMismatch {
                expected: 6,
                computed: 5,
                ..
            })
        ));
        assert_eq!(r.catalog().replica_count(), 1);
    }

    #[tokio::test]
    async fn test_pfn_and_scheme_rejections() {
        let r = registrar(RegistrarConfig::default());

        assert!(matches!(
            r.register_file(RSE, &FileSpec::new("s", "  ")).await,
            Err(RegistrationError::InvalidPfn { .. })
        ));
        assert!(matches!(
            r.register_file(RSE, &FileSpec::new("s", "https://host/")).await,
            Err(RegistrationError::InvalidPfn { .. })
        ));
        assert!(matches!(
            r.register_file(RSE, &FileSpec::new("s", "globus://ep/a.bin")).await,
            Err(RegistrationError::UnsupportedScheme { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_source() {
        let r = registrar(RegistrarConfig::default());
        let err = r
            .register_file(RSE, &FileSpec::new("s", "https://host/data/missing.bin"))
            .await
            .unwrap_err();
        match err {
            RegistrationError::Checksum(e) => assert!(e.is_stream_unavailable()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_catalog_and_attach_failures() {
        let r = registrar(RegistrarConfig::default());

        let spec = FileSpec::new("user.test", "https://host/data/a.bin");
        assert!(matches!(
            r.register_file("NOPE", &spec).await,
            Err(RegistrationError::Catalog(CatalogError::RseNotFound(_)))
        ));

        let mut spec = FileSpec::new("user.test", "https://host/data/a.bin");
        spec.dataset = Some("missing-ds".into());
        let err = r.register_file(RSE, &spec).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Attach { ref dataset, .. } if dataset == "missing-ds"
        ));
        // The replica itself stays registered.
        assert!(r.catalog().replica(RSE, "user.test", "a.bin").is_some());
    }

    #[tokio::test]
    async fn test_attach_to_dataset() {
        let r = registrar(RegistrarConfig::default());
        let mut spec = FileSpec::new("user.test", "https://host/data/b.bin");
        spec.dataset = Some("ds".into());

        let registered = r.register_file(RSE, &spec).await.unwrap();
        assert_eq!(registered.attached_to.as_deref(), Some("ds"));
        assert_eq!(
            r.catalog().dataset_contents("user.test", "ds").unwrap(),
            vec![registered.record.did()]
        );
    }

    #[tokio::test]
    async fn test_register_files_continues_after_failures() {
        let r = registrar(RegistrarConfig::default());
        let specs = vec![
            FileSpec::new("user.test", "https://host/data/a.bin"),
            FileSpec::new("user.test", "https://host/data/missing.bin"),
            FileSpec::new("user.test", "https://host/data/b.bin"),
        ];

        let report = r.register_files(RSE, &specs).await;
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_success());
        assert_eq!(r.catalog().replica_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_a_checksum_error() {
        let r = registrar(RegistrarConfig {
            chunk_size: 0,
            ..RegistrarConfig::default()
        });
        assert!(matches!(
            r.register_file(RSE, &FileSpec::new("s", "https://host/data/a.bin")).await,
            Err(RegistrationError::Checksum(CoreError::InvalidChunkSize))
        ));
    }
}
