//! Transfer request polling.
//!
//! Walks the requests still in [`RequestState::Submitted`], asks the service
//! for their task status in bounded batches, and moves each request to its
//! new state.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::TransferError;
use crate::service::TransferService;
use crate::transferer::Transferer;
use crate::types::{RequestState, TaskId};

/// A transfer request tracked on our side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub request_id: String,
    pub task_id: TaskId,
    pub state: RequestState,
}

impl TransferRequest {
    /// A freshly submitted request.
    pub fn submitted(request_id: impl Into<String>, task_id: impl Into<TaskId>) -> Self {
        Self {
            request_id: request_id.into(),
            task_id: task_id.into(),
            state: RequestState::Submitted,
        }
    }
}

/// Configuration for polling behavior.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Maximum number of task ids queried per batch.
    pub bulk: usize,
    /// Pause between polling rounds.
    pub sleep_time: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            bulk: 100,
            sleep_time: Duration::from_secs(60),
        }
    }
}

/// Result of one polling round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Number of task ids queried.
    pub polled: usize,
    /// Requests whose state changed to Done or Failed.
    pub updated: usize,
    /// Requests marked Lost because the service does not know the task.
    pub lost: usize,
    /// Task ids whose query failed for any other reason.
    pub errors: usize,
}

/// Polls transfer tasks and updates request states.
pub struct Poller<T: TransferService> {
    transferer: Transferer<T>,
    config: PollerConfig,
}

impl<T: TransferService> Poller<T> {
    pub fn new(transferer: Transferer<T>, config: PollerConfig) -> Self {
        Self { transferer, config }
    }

    pub fn transferer(&self) -> &Transferer<T> {
        &self.transferer
    }

    /// Run one polling round over `requests`.
    pub async fn poll_once(&self, requests: &mut [TransferRequest]) -> PollReport {
        let mut report = PollReport::default();

        let task_ids: Vec<TaskId> = requests
            .iter()
            .filter(|r| r.state == RequestState::Submitted)
            .map(|r| r.task_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for chunk in task_ids.chunks(self.config.bulk.max(1)) {
            report.polled += chunk.len();
            let responses = self.transferer.bulk_check_xfers(chunk).await;
            report.errors += responses
                .values()
                .filter(|r| matches!(r, Err(e) if !matches!(e, TransferError::TaskNotFound(_))))
                .count();

            for request in requests
                .iter_mut()
                .filter(|r| r.state == RequestState::Submitted)
            {
                let Some(response) = responses.get(&request.task_id) else {
                    continue;
                };
                match response {
                    Ok(status) => {
                        let state = RequestState::from(status);
                        if state != request.state {
                            tracing::debug!(
                                request_id = %request.request_id,
                                task_id = %request.task_id,
                                %status,
                                "request state changed"
                            );
                            request.state = state;
                            report.updated += 1;
                        }
                    }
                    Err(TransferError::TaskNotFound(_)) => {
                        tracing::warn!(
                            request_id = %request.request_id,
                            task_id = %request.task_id,
                            "transfer task not found, marking request lost"
                        );
                        request.state = RequestState::Lost;
                        report.lost += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            request_id = %request.request_id,
                            task_id = %request.task_id,
                            error = %e,
                            "failed to query transfer task"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            polled = report.polled,
            updated = report.updated,
            lost = report.lost,
            errors = report.errors,
            "poll round finished"
        );
        report
    }

    /// Poll until no request is left in Submitted or shutdown is signalled.
    ///
    /// Returns the number of rounds run.
    pub async fn run(
        &self,
        requests: &mut [TransferRequest],
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut rounds = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            self.poll_once(requests).await;
            rounds += 1;

            if !requests.iter().any(|r| r.state == RequestState::Submitted) {
                tracing::info!(rounds, "no submitted transfers left");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.sleep_time) => {}
                changed = shutdown.changed() => {
                    // A dropped sender also ends the loop.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        rounds
    }
}
