//! Cancel previously queued work.
//!
//! Cancelling removes the item from its queue's pending list so it will not
//! run. Afterwards the item may be submitted again.
//!
//! The check of the marker and the unlink happen in one critical section.
//! Producers submit from interrupt-style contexts; without the lock one could
//! assign the item between the check and the unlink and corrupt the list.

use super::WorkQueue;
use crate::domain::Work;
use crate::error::{Result, WorkqError};

impl WorkQueue {
    /// Remove `work` from this queue if it is pending.
    ///
    /// An item that is not queued (never submitted, already cancelled, or
    /// already claimed by the worker) is left alone and `Ok(())` is returned,
    /// so calling this twice is the same as calling it once.
    ///
    /// # Errors
    /// `WorkqError::QueueMismatch` if `work` is pending on a different queue,
    /// `WorkqError::ForeignQueue` if it is pending on a queue with the same id
    /// that belongs to another registry. The item is not touched in either
    /// case.
    pub fn cancel(&self, work: &Work) -> Result<()> {
        let mut state = self.state.lock();

        let Some(membership) = work.membership() else {
            tracing::trace!(qid = %self.qid(), work = %work.id(), "cancel: work not queued");
            return Ok(());
        };

        if membership.qid != self.qid() {
            return Err(WorkqError::QueueMismatch {
                work: work.id(),
                requested: self.qid(),
                actual: membership.qid,
            });
        }

        // The marker holds only (qid, slot). Same-numbered queues in other
        // registries share that space, so the slot must hold this very item.
        let owned = state
            .pending
            .get(membership.slot)
            .is_some_and(|node| node.work == *work);
        if !owned {
            return Err(WorkqError::ForeignQueue {
                work: work.id(),
                qid: membership.qid,
            });
        }

        state.pending.unlink(membership.slot);
        work.clear(membership);
        state.cancelled += 1;
        drop(state);

        tracing::debug!(qid = %self.qid(), work = %work.id(), "work cancelled");
        Ok(())
    }
}
