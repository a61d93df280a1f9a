//! Identifiers for queues and work items.
//!
//! `QueueId` is a small index into the registry (`0..nqueues`). It is not
//! validated on construction; the registry rejects out-of-range ids on every
//! operation.
//!
//! `WorkId` is a process-unique label for a work item. It exists for logs and
//! snapshots only; queue membership is tracked by the item's marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound on the number of queues a registry may hold.
///
/// The marker packs the queue index into 32 bits, so any bound below
/// `u32::MAX` works; this one keeps configs sane.
pub const MAX_QUEUES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(usize);

impl QueueId {
    /// High-priority kernel work queue.
    pub const HPWORK: QueueId = QueueId(0);

    /// Low-priority kernel work queue.
    pub const LPWORK: QueueId = QueueId(1);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for QueueId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static NEXT_WORK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(u64);

impl WorkId {
    /// Allocate the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_WORK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "work-{}", self.0)
    }
}
