//! Transfer service abstraction.
//!
//! The service handles endpoint activation, task submission, and task
//! status. Implementations may talk to Globus or any comparable service.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ActivationResponse, EndpointId, TaskId, TaskStatus, TransferData};

/// Transfer service trait.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Ask the service to activate an endpoint for at least `if_expires_in`
    /// seconds, using whatever credentials it has cached.
    async fn autoactivate_endpoint(
        &self,
        endpoint: &EndpointId,
        if_expires_in: u64,
    ) -> Result<ActivationResponse>;

    /// Submit a transfer and return the new task's id.
    async fn submit_transfer(&self, data: &TransferData) -> Result<TaskId>;

    /// Current status of a task.
    async fn get_task(&self, task_id: &TaskId) -> Result<TaskStatus>;
}

/// A scripted in-memory transfer service for testing.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use tokio::sync::RwLock;

    use crate::error::TransferError;
    use crate::types::ActivationCode;

    #[derive(Default)]
    struct State {
        /// Activation code returned per endpoint.
        endpoints: HashMap<EndpointId, ActivationCode>,
        /// Remaining scripted statuses per task; the last one repeats.
        tasks: HashMap<TaskId, VecDeque<TaskStatus>>,
        /// Everything submitted so far, in order.
        submissions: Vec<(TaskId, TransferData)>,
        /// Endpoints asked to activate, in order.
        activations: Vec<EndpointId>,
        /// Tasks whose queries fail with a 500.
        failing_tasks: HashSet<TaskId>,
        next_task: u64,
        reject_submissions: bool,
    }

    /// In-memory transfer service.
    #[derive(Default)]
    pub struct MemoryTransferService {
        state: RwLock<State>,
    }

    impl MemoryTransferService {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an endpoint and the activation code it answers with.
        pub async fn add_endpoint(&self, endpoint: impl Into<EndpointId>, code: ActivationCode) {
            self.state
                .write()
                .await
                .endpoints
                .insert(endpoint.into(), code);
        }

        /// Script the statuses a task reports, one per query.
        pub async fn script_task(&self, task_id: impl Into<TaskId>, statuses: Vec<TaskStatus>) {
            self.state
                .write()
                .await
                .tasks
                .insert(task_id.into(), statuses.into());
        }

        /// Make every query for `task_id` fail with a 500.
        pub async fn fail_task(&self, task_id: impl Into<TaskId>) {
            self.state.write().await.failing_tasks.insert(task_id.into());
        }

        /// Make submissions fail with a 503.
        pub async fn reject_submissions(&self, reject: bool) {
            self.state.write().await.reject_submissions = reject;
        }

        /// All submissions so far.
        pub async fn submissions(&self) -> Vec<(TaskId, TransferData)> {
            self.state.read().await.submissions.clone()
        }

        /// All activation requests so far.
        pub async fn activations(&self) -> Vec<EndpointId> {
            self.state.read().await.activations.clone()
        }
    }

    #[async_trait]
    impl TransferService for MemoryTransferService {
        async fn autoactivate_endpoint(
            &self,
            endpoint: &EndpointId,
            _if_expires_in: u64,
        ) -> Result<ActivationResponse> {
            let mut state = self.state.write().await;
            state.activations.push(endpoint.clone());

            let code = state.endpoints.get(endpoint).cloned().ok_or_else(|| {
                TransferError::Api {
                    status: 404,
                    body: format!("endpoint {endpoint} not found"),
                }
            })?;

            Ok(ActivationResponse {
                message: format!("{code} for {endpoint}"),
                code,
            })
        }

        async fn submit_transfer(&self, data: &TransferData) -> Result<TaskId> {
            let mut state = self.state.write().await;
            if state.reject_submissions {
                return Err(TransferError::Api {
                    status: 503,
                    body: "service unavailable".into(),
                });
            }

            state.next_task += 1;
            let task_id = TaskId(format!("task-{}", state.next_task));
            state
                .tasks
                .entry(task_id.clone())
                .or_insert_with(|| VecDeque::from([TaskStatus::Active]));
            state.submissions.push((task_id.clone(), data.clone()));
            Ok(task_id)
        }

        async fn get_task(&self, task_id: &TaskId) -> Result<TaskStatus> {
            let mut state = self.state.write().await;
            if state.failing_tasks.contains(task_id) {
                return Err(TransferError::Api {
                    status: 500,
                    body: format!("query for {task_id} failed"),
                });
            }
            let statuses = state
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TransferError::TaskNotFound(task_id.to_string()))?;

            let status = if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            };
            status.ok_or_else(|| TransferError::TaskNotFound(task_id.to_string()))
        }
    }
}
