//! Globus Transfer API client.
//!
//! Authenticates as a native app with a long-lived refresh token and calls
//! the Transfer REST API. Access tokens are cached until shortly before they
//! expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, TransferError};
use crate::service::TransferService;
use crate::types::{
    ActivationCode, ActivationResponse, EndpointId, TaskId, TaskStatus, TransferData,
};

const DEFAULT_AUTH_URL: &str = "https://auth.globus.org";
const DEFAULT_TRANSFER_URL: &str = "https://transfer.api.globus.org/v0.10";
const TRANSFER_RESOURCE_SERVER: &str = "transfer.api.globus.org";

/// Characters escaped in URL path segments (RFC 3986 unreserved are kept).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Refresh the access token this long before it actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credentials and service locations for [`GlobusClient`].
#[derive(Debug, Clone)]
pub struct GlobusConfig {
    pub client_id: String,
    pub refresh_token: String,
    pub auth_url: String,
    pub transfer_url: String,
}

impl GlobusConfig {
    /// Config pointing at the public Globus services.
    pub fn new(client_id: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            refresh_token: refresh_token.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            transfer_url: DEFAULT_TRANSFER_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    resource_server: String,
    #[serde(default)]
    other_tokens: Vec<TokenResponse>,
}

impl TokenResponse {
    /// Pick the token issued for the Transfer API.
    fn into_transfer_token(self) -> (String, u64) {
        if self.resource_server == TRANSFER_RESOURCE_SERVER || self.other_tokens.is_empty() {
            return (self.access_token, self.expires_in);
        }
        match self
            .other_tokens
            .into_iter()
            .find(|t| t.resource_server == TRANSFER_RESOURCE_SERVER)
        {
            Some(t) => (t.access_token, t.expires_in),
            None => (self.access_token, self.expires_in),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AutoActivateResponse {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionIdResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct TransferItemDoc<'a> {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'static str,
    source_path: &'a str,
    destination_path: &'a str,
    recursive: bool,
}

#[derive(Debug, Serialize)]
struct TransferDoc<'a> {
    #[serde(rename = "DATA_TYPE")]
    data_type: &'static str,
    submission_id: &'a str,
    source_endpoint: &'a str,
    destination_endpoint: &'a str,
    label: &'a str,
    sync_level: u8,
    verify_checksum: bool,
    #[serde(rename = "DATA")]
    data: Vec<TransferItemDoc<'a>>,
}

impl<'a> TransferDoc<'a> {
    fn new(submission_id: &'a str, data: &'a TransferData) -> Self {
        Self {
            data_type: "transfer",
            submission_id,
            source_endpoint: data.source_endpoint.as_str(),
            destination_endpoint: data.destination_endpoint.as_str(),
            label: &data.label,
            sync_level: data.sync_level.level(),
            verify_checksum: data.verify_checksum,
            data: data
                .items
                .iter()
                .map(|item| TransferItemDoc {
                    data_type: "transfer_item",
                    source_path: &item.source_path,
                    destination_path: &item.destination_path,
                    recursive: item.recursive,
                })
                .collect(),
        }
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Globus Transfer client.
pub struct GlobusClient {
    http: reqwest::Client,
    config: GlobusConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GlobusClient {
    pub fn new(config: GlobusConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    /// A valid access token, refreshing it when needed.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let url = format!("{}/v2/oauth2/token", self.config.auth_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransferError::Auth(format!("{}: {body}", status.as_u16())));
        }

        let (token, expires_in) = resp.json::<TokenResponse>().await?.into_transfer_token();
        let lifetime = Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        tracing::debug!(expires_in, "refreshed transfer access token");
        Ok(token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.transfer_url.trim_end_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let resp = request.bearer_auth(token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransferError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn submission_id(&self) -> Result<String> {
        let resp = self.send(self.http.get(self.url("/submission_id"))).await?;
        Ok(resp.json::<SubmissionIdResponse>().await?.value)
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[async_trait]
impl TransferService for GlobusClient {
    async fn autoactivate_endpoint(
        &self,
        endpoint: &EndpointId,
        if_expires_in: u64,
    ) -> Result<ActivationResponse> {
        let url = self.url(&format!("/endpoint/{}/autoactivate", encode(endpoint.as_str())));
        let request = self
            .http
            .post(url)
            .query(&[("if_expires_in", if_expires_in)]);
        let resp: AutoActivateResponse = self.send(request).await?.json().await?;
        Ok(ActivationResponse {
            code: ActivationCode::parse(&resp.code),
            message: resp.message,
        })
    }

    async fn submit_transfer(&self, data: &TransferData) -> Result<TaskId> {
        let submission_id = self.submission_id().await?;
        let doc = TransferDoc::new(&submission_id, data);
        let resp: SubmitResponse = self
            .send(self.http.post(self.url("/transfer")).json(&doc))
            .await?
            .json()
            .await?;
        Ok(TaskId(resp.task_id))
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<TaskStatus> {
        let url = self.url(&format!("/task/{}", encode(task_id.as_str())));
        match self.send(self.http.get(url)).await {
            Ok(resp) => {
                let task: TaskResponse = resp.json().await?;
                Ok(TaskStatus::parse(&task.status))
            }
            Err(TransferError::Api { status: 404, .. }) => {
                Err(TransferError::TaskNotFound(task_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
