//! # Replicator Transfer
//!
//! Moves file bytes between two storage endpoints through a bulk transfer
//! service, and polls submitted tasks until they finish.
//!
//! ## Overview
//!
//! The service itself sits behind the [`TransferService`] trait. The
//! production implementation is [`GlobusClient`]; tests use
//! [`MemoryTransferService`]. [`Transferer`] layers the submission workflow
//! on top (activate both endpoints, build the job, submit), and [`Poller`]
//! maps task statuses back onto transfer requests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replicator_transfer::{EndpointId, GlobusClient, GlobusConfig, Transferer};
//!
//! async fn example() {
//!     let client = GlobusClient::new(GlobusConfig::new("client-id", "refresh-token")).unwrap();
//!     let transferer = Transferer::new(client);
//!
//!     let task_id = transferer
//!         .submit_xfer(
//!             &EndpointId::from("source-ep"),
//!             &EndpointId::from("dest-ep"),
//!             "/~/data/file.h5",
//!             "/archive/file.h5",
//!             "nightly",
//!             false,
//!         )
//!         .await
//!         .unwrap();
//!
//!     println!("status: {}", transferer.check_xfer(&task_id).await.unwrap());
//! }
//! ```
//!
//! ## Task Lifecycle
//!
//! ```text
//! submit ──> ACTIVE ──> SUCCEEDED   (request Done)
//!              │   └──> FAILED      (request Failed)
//!              └──────> INACTIVE    (still Submitted, polled again)
//! unknown task id                   (request Lost)
//! ```

pub mod error;
pub mod globus;
pub mod poller;
pub mod service;
pub mod transferer;
pub mod types;

pub use error::{Result, TransferError};
pub use globus::{GlobusClient, GlobusConfig};
pub use poller::{PollReport, Poller, PollerConfig, TransferRequest};
pub use service::{memory::MemoryTransferService, TransferService};
pub use transferer::{Transferer, ACTIVATION_WINDOW_SECS};
pub use types::{
    ActivationCode, ActivationResponse, EndpointId, JobMetadata, RequestState, SyncLevel,
    TaskId, TaskStatus, TransferData, TransferItem, TransferJob,
};
