//! Per-queue critical section.
//!
//! On a hosted target there are no interrupts to mask, so every context that
//! touches a queue (callers, workers, interrupt-style producer threads) goes
//! through one `std::sync::Mutex`. Critical sections only do O(1) list and
//! marker updates and never `.await`.
//!
//! A poisoned lock is taken over rather than propagated: list surgery runs to
//! completion before anything that could panic, so the state behind a
//! poisoned lock is still consistent.

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::domain::QueueId;

pub type QueueGuard<'a, T> = MutexGuard<'a, T>;

#[derive(Debug)]
pub struct QueueLock<T> {
    qid: QueueId,
    inner: Mutex<T>,
}

impl<T> QueueLock<T> {
    pub fn new(qid: QueueId, value: T) -> Self {
        Self {
            qid,
            inner: Mutex::new(value),
        }
    }

    /// Enter the critical section, waiting if another context holds it.
    pub fn lock(&self) -> QueueGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(qid = %self.qid, "work queue lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Enter the critical section only if it is free. For producers that
    /// must never block.
    pub fn try_lock(&self) -> Option<QueueGuard<'_, T>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(poisoned)) => {
                tracing::warn!(qid = %self.qid, "work queue lock poisoned; recovering");
                Some(poisoned.into_inner())
            }
        }
    }
}
