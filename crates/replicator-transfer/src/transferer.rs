//! Submission workflow on top of a transfer service.
//!
//! Both endpoints are auto-activated before every submission. Activation
//! failures are logged but do not stop the submission; the service rejects
//! the task itself if an endpoint really is unusable.

use std::collections::BTreeMap;

use crate::error::{Result, TransferError};
use crate::service::TransferService;
use crate::types::{ActivationCode, EndpointId, TaskId, TaskStatus, TransferData, TransferJob};

/// How long (seconds) an endpoint activation must remain valid.
pub const ACTIVATION_WINDOW_SECS: u64 = 3600;

/// Submits and checks transfers through a [`TransferService`].
pub struct Transferer<T: TransferService> {
    service: T,
}

impl<T: TransferService> Transferer<T> {
    pub fn new(service: T) -> Self {
        Self { service }
    }

    /// The underlying service.
    pub fn service(&self) -> &T {
        &self.service
    }

    /// Auto-activate an endpoint and log the outcome.
    pub async fn activate(&self, endpoint: &EndpointId) -> Result<ActivationCode> {
        let resp = self
            .service
            .autoactivate_endpoint(endpoint, ACTIVATION_WINDOW_SECS)
            .await?;

        match &resp.code {
            ActivationCode::AutoActivationFailed => tracing::warn!(
                %endpoint,
                message = %resp.message,
                "endpoint not active"
            ),
            ActivationCode::AutoActivatedCachedCredential => {
                tracing::info!(%endpoint, "endpoint autoactivated using a cached credential")
            }
            ActivationCode::AutoActivatedGlobusOnlineCredential => {
                tracing::info!(%endpoint, "endpoint autoactivated using a built-in credential")
            }
            ActivationCode::AlreadyActivated => tracing::info!(
                %endpoint,
                window_secs = ACTIVATION_WINDOW_SECS,
                "endpoint already active"
            ),
            ActivationCode::Other(code) => {
                tracing::info!(%endpoint, code, "endpoint activation returned unknown code")
            }
        }

        Ok(resp.code)
    }

    /// Activate both endpoints, logging rather than failing on errors.
    async fn activate_pair(&self, source: &EndpointId, destination: &EndpointId) {
        for endpoint in [source, destination] {
            if let Err(e) = self.activate(endpoint).await {
                tracing::warn!(%endpoint, error = %e, "endpoint activation request failed");
            }
        }
    }

    /// Submit a single source/destination transfer.
    pub async fn submit_xfer(
        &self,
        source_endpoint: &EndpointId,
        destination_endpoint: &EndpointId,
        source_path: &str,
        destination_path: &str,
        label: &str,
        recursive: bool,
    ) -> Result<TaskId> {
        self.activate_pair(source_endpoint, destination_endpoint).await;

        let mut data = TransferData::new(
            source_endpoint.clone(),
            destination_endpoint.clone(),
            label,
        );
        data.add_item(source_path, destination_path, recursive);

        let task_id = self.service.submit_transfer(&data).await?;
        tracing::info!(%task_id, label, "transfer submitted");
        Ok(task_id)
    }

    /// Submit many queued jobs as one task.
    ///
    /// Endpoints come from the first job's metadata. Each job contributes its
    /// first source and first destination as one non-recursive item.
    pub async fn bulk_submit_xfer(&self, jobs: &[TransferJob]) -> Result<TaskId> {
        let first = jobs.first().ok_or(TransferError::EmptyJob)?;
        let source_endpoint = &first.metadata.source_globus_endpoint_id;
        let destination_endpoint = &first.metadata.dest_globus_endpoint_id;

        let mut data = TransferData::new(
            source_endpoint.clone(),
            destination_endpoint.clone(),
            job_label(),
        );
        for (idx, job) in jobs.iter().enumerate() {
            let source = job
                .sources
                .first()
                .ok_or_else(|| TransferError::InvalidJob(format!("job {idx} has no sources")))?;
            let destination = job.destinations.first().ok_or_else(|| {
                TransferError::InvalidJob(format!("job {idx} has no destinations"))
            })?;
            data.add_item(source.as_str(), destination.as_str(), false);
        }

        self.activate_pair(source_endpoint, destination_endpoint).await;

        let task_id = self.service.submit_transfer(&data).await?;
        tracing::info!(
            %task_id,
            items = data.items.len(),
            label = %data.label,
            "bulk transfer submitted"
        );
        Ok(task_id)
    }

    /// Status of one task.
    pub async fn check_xfer(&self, task_id: &TaskId) -> Result<TaskStatus> {
        self.service.get_task(task_id).await
    }

    /// Status of many tasks. A failed query for one task does not hide the
    /// others.
    pub async fn bulk_check_xfers(
        &self,
        task_ids: &[TaskId],
    ) -> BTreeMap<TaskId, Result<TaskStatus>> {
        tracing::debug!(count = task_ids.len(), "checking transfer tasks");

        let mut responses = BTreeMap::new();
        for task_id in task_ids {
            let status = self.service.get_task(task_id).await;
            if let Ok(status) = &status {
                tracing::debug!(%task_id, %status, "task status");
            }
            responses.insert(task_id.clone(), status);
        }
        responses
    }
}

/// Label for bulk submissions: the current UTC time.
fn job_label() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}
