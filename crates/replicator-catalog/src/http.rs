//! HTTP client for a Rucio-style catalog server.
//!
//! Async client using `reqwest` with `X-Rucio-Auth-Token` authentication.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;

use replicator_core::{Did, ReplicaRecord};

use crate::error::{CatalogError, Result};
use crate::traits::{Catalog, RseAttributes};

const AUTH_TOKEN_HEADER: &str = "X-Rucio-Auth-Token";

/// Characters escaped in URL path segments (RFC 3986 unreserved are kept).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Serialize)]
struct AddReplicasBody<'a> {
    rse: &'a str,
    files: &'a [ReplicaRecord],
}

#[derive(Serialize)]
struct AttachDidsBody<'a> {
    dids: &'a [Did],
}

/// Catalog backed by a remote REST server.
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// Creates a client that authenticates every request with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTH_TOKEN_HEADER,
            HeaderValue::from_str(token).map_err(|_| CatalogError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Logs in with username and password, then builds a client from the
    /// returned token.
    pub async fn login_userpass(
        base_url: &str,
        account: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let resp = reqwest::Client::new()
            .get(format!("{base}/auth/userpass"))
            .header("X-Rucio-Account", account)
            .header("X-Rucio-Username", username)
            .header("X-Rucio-Password", password)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token = resp
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(CatalogError::MissingToken)?
            .to_string();

        tracing::debug!(account, "obtained catalog auth token");
        Self::new(base, &token)
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&utf8_percent_encode(segment, PATH_SEGMENT).to_string());
        }
        url
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn add_replicas(&self, rse: &str, files: &[ReplicaRecord]) -> Result<()> {
        let url = self.url(&["replicas"]);
        let resp = self
            .http
            .post(&url)
            .json(&AddReplicasBody { rse, files })
            .send()
            .await?;
        Self::check(resp).await?;
        tracing::debug!(rse, count = files.len(), "replicas added");
        Ok(())
    }

    async fn attach_dids(&self, scope: &str, name: &str, dids: &[Did]) -> Result<()> {
        let url = self.url(&["dids", scope, name, "dids"]);
        let resp = self
            .http
            .post(&url)
            .json(&AttachDidsBody { dids })
            .send()
            .await?;
        Self::check(resp).await?;
        tracing::debug!(scope, name, count = dids.len(), "dids attached");
        Ok(())
    }

    async fn list_rse_attributes(&self, rse: &str) -> Result<RseAttributes> {
        // The server routes this path with a trailing slash.
        let url = format!("{}/", self.url(&["rses", rse, "attr"]));
        let resp = self.http.get(&url).send().await?;
        let body = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replicator_core::{checksum_bytes, ChecksumAlgorithm, Pfn};

    #[test]
    fn test_url_segments_are_encoded() {
        let catalog = HttpCatalog::new("https://rucio.example.org/", "tok").unwrap();
        assert_eq!(catalog.base_url(), "https://rucio.example.org");
        assert_eq!(
            catalog.url(&["dids", "user.jdoe", "my set", "dids"]),
            "https://rucio.example.org/dids/user.jdoe/my%20set/dids"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let err = HttpCatalog::new("https://rucio.example.org", "bad\ntoken")
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::InvalidToken));
    }

    #[test]
    fn test_add_replicas_body_shape() {
        let pfn = Pfn::parse("file:///d/a.bin").unwrap();
        let digest = checksum_bytes(b"abc", ChecksumAlgorithm::Adler32);
        let record = ReplicaRecord::new("s", "a.bin", pfn, &digest);
        let files = [record];
        let body = serde_json::to_value(AddReplicasBody {
            rse: "RUCIOTEST",
            files: &files,
        })
        .unwrap();

        assert_eq!(body["rse"], "RUCIOTEST");
        assert_eq!(body["files"][0]["adler32"], "024d0127");
        assert_eq!(body["files"][0]["name"], "a.bin");
    }
}
