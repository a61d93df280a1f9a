//! A single work queue: pending list, lock, wake-up signal, counters.

use std::sync::Arc;

use tokio::sync::Notify;

use super::list::PendingList;
use super::lock::QueueLock;
use crate::domain::work::Membership;
use crate::domain::{QueueId, Work, WorkId};
use crate::error::{Result, WorkqError};
use crate::handler::WorkHandler;
use crate::observability::QueueCounts;

/// What a queue node carries while an item waits: the item itself, plus the
/// callback and argument it was submitted with.
pub(crate) struct QueueNode {
    pub work: Work,
    pub handler: Arc<dyn WorkHandler>,
    pub arg: serde_json::Value,
}

#[derive(Default)]
pub(crate) struct QueueState {
    pub pending: PendingList<QueueNode>,
    pub submitted: u64,
    pub cancelled: u64,
    pub claimed: u64,
}

/// One numbered work queue.
///
/// All list and marker mutation happens under `state`'s lock. The lock is
/// never held while a callback runs.
pub struct WorkQueue {
    qid: QueueId,
    name: String,
    pub(crate) state: QueueLock<QueueState>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new(qid: QueueId, name: impl Into<String>) -> Self {
        Self {
            qid,
            name: name.into(),
            state: QueueLock::new(qid, QueueState::default()),
            notify: Notify::new(),
        }
    }

    pub fn qid(&self) -> QueueId {
        self.qid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `work` at the tail and wake the worker.
    pub fn submit(
        &self,
        work: &Work,
        handler: Arc<dyn WorkHandler>,
        arg: serde_json::Value,
    ) -> Result<()> {
        let mut state = self.state.lock();
        self.enqueue_locked(&mut state, work, handler, arg)?;
        drop(state);

        self.notify.notify_one();
        Ok(())
    }

    /// Like `submit`, but returns `WorkqError::Busy` instead of waiting for
    /// the lock.
    pub fn try_submit(
        &self,
        work: &Work,
        handler: Arc<dyn WorkHandler>,
        arg: serde_json::Value,
    ) -> Result<()> {
        let Some(mut state) = self.state.try_lock() else {
            return Err(WorkqError::Busy(self.qid));
        };
        self.enqueue_locked(&mut state, work, handler, arg)?;
        drop(state);

        self.notify.notify_one();
        Ok(())
    }

    fn enqueue_locked(
        &self,
        state: &mut QueueState,
        work: &Work,
        handler: Arc<dyn WorkHandler>,
        arg: serde_json::Value,
    ) -> Result<()> {
        let membership = Membership {
            qid: self.qid,
            slot: state.pending.next_slot(),
        };
        work.try_assign(membership)
            .map_err(|current| WorkqError::AlreadyQueued {
                work: work.id(),
                qid: current.qid,
            })?;

        let slot = state.pending.push_back(QueueNode {
            work: work.clone(),
            handler,
            arg,
        });
        debug_assert_eq!(slot, membership.slot);
        state.submitted += 1;

        tracing::debug!(qid = %self.qid, work = %work.id(), slot, "work queued");
        Ok(())
    }

    /// Take the oldest pending item. Its marker is cleared before the lock is
    /// released, so a cancel that runs afterwards is a no-op.
    pub fn claim(&self) -> Option<Claimed> {
        let mut state = self.state.lock();
        let (slot, node) = state.pending.pop_front()?;
        node.work.clear(Membership {
            qid: self.qid,
            slot,
        });
        state.claimed += 1;
        drop(state);

        tracing::debug!(qid = %self.qid, work = %node.work.id(), "work claimed");
        Some(Claimed {
            qid: self.qid,
            work: node.work,
            handler: node.handler,
            arg: node.arg,
        })
    }

    /// Wake the worker without queuing anything.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next submit or signal.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    /// Snapshot of pending items, oldest first.
    pub fn pending(&self) -> Vec<WorkId> {
        let state = self.state.lock();
        state.pending.iter().map(|node| node.work.id()).collect()
    }

    /// Is `work` linked into this queue's pending list?
    pub fn contains(&self, work: &Work) -> bool {
        let state = self.state.lock();
        state.pending.iter().any(|node| node.work == *work)
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.state.lock();
        QueueCounts {
            pending: state.pending.len(),
            submitted: state.submitted,
            cancelled: state.cancelled,
            claimed: state.claimed,
        }
    }
}

/// An item a worker has taken off a queue. Run it outside any queue lock.
pub struct Claimed {
    qid: QueueId,
    work: Work,
    handler: Arc<dyn WorkHandler>,
    arg: serde_json::Value,
}

impl Claimed {
    pub fn qid(&self) -> QueueId {
        self.qid
    }

    pub fn work(&self) -> &Work {
        &self.work
    }

    pub fn arg(&self) -> &serde_json::Value {
        &self.arg
    }

    pub async fn run(self) -> Result<()> {
        self.handler.run(&self.arg).await
    }
}
