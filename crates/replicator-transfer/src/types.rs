//! Transfer service data types.
//!
//! These mirror what the transfer service expects on submission and reports
//! back when a task is queried.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a transfer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub String);

impl EndpointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a submitted transfer task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Outcome code of an endpoint auto-activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationCode {
    AutoActivationFailed,
    AutoActivatedCachedCredential,
    AutoActivatedGlobusOnlineCredential,
    AlreadyActivated,
    /// A code this client does not know about.
    Other(String),
}

impl ActivationCode {
    /// Parse the service's code string.
    pub fn parse(code: &str) -> Self {
        match code {
            "AutoActivationFailed" => ActivationCode::AutoActivationFailed,
            "AutoActivated.CachedCredential" => ActivationCode::AutoActivatedCachedCredential,
            "AutoActivated.GlobusOnlineCredential" => {
                ActivationCode::AutoActivatedGlobusOnlineCredential
            }
            "AlreadyActivated" => ActivationCode::AlreadyActivated,
            other => ActivationCode::Other(other.to_string()),
        }
    }

    /// The service's code string.
    pub fn as_str(&self) -> &str {
        match self {
            ActivationCode::AutoActivationFailed => "AutoActivationFailed",
            ActivationCode::AutoActivatedCachedCredential => "AutoActivated.CachedCredential",
            ActivationCode::AutoActivatedGlobusOnlineCredential => {
                "AutoActivated.GlobusOnlineCredential"
            }
            ActivationCode::AlreadyActivated => "AlreadyActivated",
            ActivationCode::Other(code) => code,
        }
    }

    /// Whether the endpoint can be used after this response.
    pub fn is_active(&self) -> bool {
        !matches!(self, ActivationCode::AutoActivationFailed)
    }
}

impl fmt::Display for ActivationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to an auto-activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResponse {
    pub code: ActivationCode,
    pub message: String,
}

/// Status of a transfer task as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Active,
    Inactive,
    Succeeded,
    Failed,
    Other(String),
}

impl TaskStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "ACTIVE" => TaskStatus::Active,
            "INACTIVE" => TaskStatus::Inactive,
            "SUCCEEDED" => TaskStatus::Succeeded,
            "FAILED" => TaskStatus::Failed,
            other => TaskStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Inactive => "INACTIVE",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Other(s) => s,
        }
    }

    /// Whether the task has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the service decides whether a file needs to be copied at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLevel {
    Exists,
    Size,
    Mtime,
    /// Only copy files whose checksums differ.
    Checksum,
}

impl SyncLevel {
    /// Numeric level used on the wire.
    pub const fn level(self) -> u8 {
        match self {
            SyncLevel::Exists => 0,
            SyncLevel::Size => 1,
            SyncLevel::Mtime => 2,
            SyncLevel::Checksum => 3,
        }
    }
}

/// One source/destination pair inside a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub source_path: String,
    pub destination_path: String,
    pub recursive: bool,
}

/// A transfer submission: one source endpoint, one destination, many items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferData {
    pub source_endpoint: EndpointId,
    pub destination_endpoint: EndpointId,
    pub label: String,
    pub sync_level: SyncLevel,
    pub verify_checksum: bool,
    pub items: Vec<TransferItem>,
}

impl TransferData {
    /// A new submission that syncs by checksum and verifies after copy.
    pub fn new(source: EndpointId, destination: EndpointId, label: impl Into<String>) -> Self {
        Self {
            source_endpoint: source,
            destination_endpoint: destination,
            label: label.into(),
            sync_level: SyncLevel::Checksum,
            verify_checksum: true,
            items: Vec::new(),
        }
    }

    /// Add a source/destination pair.
    pub fn add_item(
        &mut self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
        recursive: bool,
    ) {
        self.items.push(TransferItem {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            recursive,
        });
    }
}

/// Endpoint metadata carried by a queued transfer job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub source_globus_endpoint_id: EndpointId,
    pub dest_globus_endpoint_id: EndpointId,
}

/// One queued file transfer, as handed over for bulk submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferJob {
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
    pub metadata: JobMetadata,
}

/// State of a transfer request on our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    Submitted,
    Done,
    Failed,
    Lost,
}

impl From<&TaskStatus> for RequestState {
    fn from(status: &TaskStatus) -> Self {
        match status {
            TaskStatus::Succeeded => RequestState::Done,
            TaskStatus::Failed => RequestState::Failed,
            _ => RequestState::Submitted,
        }
    }
}
