//! workq-core
//!
//! Numbered work queues for deferred work, with cancellation.
//!
//! # Modules
//! - **domain**: queue / work identifiers and the `Work` item handle
//! - **queue**: pending list, per-queue lock, submit / claim / cancel
//! - **registry**: `WorkQueues`, the fixed set of queues indexed by `QueueId`
//! - **worker**: one tokio worker per queue
//! - **handler**: the callback a work item runs
//! - **config**: registry configuration (TOML)
//! - **observability**: per-queue counters
//! - **error**: `WorkqError`

pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod observability;
pub mod queue;
pub mod registry;
pub mod worker;

pub use config::{QueueConfig, WorkqConfig};
pub use domain::{QueueId, Work, WorkId};
pub use error::{Result, WorkqError};
pub use handler::{FnHandler, WorkHandler};
pub use observability::QueueCounts;
pub use queue::{Claimed, WorkQueue};
pub use registry::WorkQueues;
pub use worker::WorkerGroup;
