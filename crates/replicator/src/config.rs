//! Replicator configuration.
//!
//! Configuration is stored as TOML, `replicator.toml` by default:
//!
//! ```toml
//! log_level = "info"
//! allowed_schemes = ["file", "https"]
//!
//! [registration]
//! algorithm = "adler32"
//! chunk_size = 1024
//! trust_precomputed = false
//!
//! [catalog]
//! url = "https://rucio.example.org"
//! auth_token = "..."
//!
//! [globus]
//! client_id = "..."
//! refresh_token = "..."
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use replicator_catalog::HttpCatalog;
use replicator_core::{ChecksumAlgorithm, DEFAULT_CHUNK_SIZE};
use replicator_transfer::GlobusConfig;

use crate::error::{ConfigError, ReplicatorError};
use crate::registrar::RegistrarConfig;

/// Replicator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pfn schemes accepted for registration.
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Catalog server; required by `register`.
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,

    /// Transfer service credentials; required by `transfer`.
    #[serde(default)]
    pub globus: Option<GlobusSection>,
}

/// The `[registration]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub algorithm: ChecksumAlgorithm,

    /// Bytes read per chunk while checksumming.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Use size and checksum from the file list without reading the source.
    #[serde(default)]
    pub trust_precomputed: bool,

    /// End-to-end timeout for HTTP(S) sources.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

/// The `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub url: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The `[globus]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobusSection {
    pub client_id: String,
    pub refresh_token: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_transfer_url")]
    pub transfer_url: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["file".into(), "http".into(), "https".into()]
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_auth_url() -> String {
    "https://auth.globus.org".into()
}

fn default_transfer_url() -> String {
    "https://transfer.api.globus.org/v0.10".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            allowed_schemes: default_allowed_schemes(),
            registration: RegistrationConfig::default(),
            catalog: None,
            globus: None,
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::default(),
            chunk_size: default_chunk_size(),
            trust_precomputed: false,
            http_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.registration.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "registration.chunk_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.allowed_schemes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_schemes",
                reason: "at least one scheme is required".into(),
            });
        }
        for scheme in &mut self.allowed_schemes {
            *scheme = scheme.to_ascii_lowercase();
        }
        Ok(())
    }

    /// Registration settings for a [`crate::Registrar`].
    pub fn registrar_config(&self) -> RegistrarConfig {
        RegistrarConfig {
            allowed_schemes: self.allowed_schemes.iter().cloned().collect::<BTreeSet<_>>(),
            algorithm: self.registration.algorithm,
            chunk_size: self.registration.chunk_size,
            trust_precomputed: self.registration.trust_precomputed,
        }
    }

    /// Timeout for HTTP(S) sources, if configured.
    pub fn http_timeout(&self) -> Option<Duration> {
        self.registration.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn catalog(&self) -> Result<&CatalogConfig, ConfigError> {
        self.catalog.as_ref().ok_or(ConfigError::MissingSection("catalog"))
    }

    pub fn globus(&self) -> Result<GlobusConfig, ConfigError> {
        let section = self.globus.as_ref().ok_or(ConfigError::MissingSection("globus"))?;
        Ok(GlobusConfig {
            client_id: section.client_id.clone(),
            refresh_token: section.refresh_token.clone(),
            auth_url: section.auth_url.clone(),
            transfer_url: section.transfer_url.clone(),
        })
    }
}

impl CatalogConfig {
    /// Connects to the catalog, logging in with username and password when
    /// no token is configured.
    pub async fn connect(&self) -> Result<HttpCatalog, ReplicatorError> {
        if let Some(token) = &self.auth_token {
            return Ok(HttpCatalog::new(&self.url, token)?);
        }

        match (&self.account, &self.username, &self.password) {
            (Some(account), Some(username), Some(password)) => Ok(
                HttpCatalog::login_userpass(&self.url, account, username, password).await?,
            ),
            _ => Err(ConfigError::Invalid {
                field: "catalog",
                reason: "either auth_token or account, username and password is required".into(),
            }
            .into()),
        }
    }
}
