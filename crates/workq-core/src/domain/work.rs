//! Work item handle and its assigned-worker marker.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{QueueId, WorkId};

const IDLE: u64 = u64::MAX;

/// Where a queued item lives: which queue, and which node slot in that
/// queue's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Membership {
    pub qid: QueueId,
    pub slot: u32,
}

impl Membership {
    fn encode(self) -> u64 {
        ((self.qid.index() as u64) << 32) | u64::from(self.slot)
    }

    fn decode(raw: u64) -> Option<Self> {
        if raw == IDLE {
            return None;
        }
        Some(Self {
            qid: QueueId::new((raw >> 32) as usize),
            slot: raw as u32,
        })
    }
}

/// A unit of deferred work, owned by whoever submits it.
///
/// Cloning yields another handle to the same item. The handle carries only
/// identity and the marker; the callback and argument travel with the queue
/// node while the item is queued.
///
/// Marker protocol:
/// - idle -> queued only by compare-and-swap, under the submitting queue's lock.
/// - queued -> idle only under the lock of the queue the marker names.
#[derive(Clone)]
pub struct Work {
    inner: Arc<WorkInner>,
}

struct WorkInner {
    id: WorkId,
    marker: AtomicU64,
}

impl Work {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WorkInner {
                id: WorkId::next(),
                marker: AtomicU64::new(IDLE),
            }),
        }
    }

    pub fn id(&self) -> WorkId {
        self.inner.id
    }

    /// Is the item currently linked into a queue (and not yet claimed)?
    pub fn is_queued(&self) -> bool {
        self.inner.marker.load(Ordering::Acquire) != IDLE
    }

    /// The queue currently holding the item, if any.
    pub fn queued_on(&self) -> Option<QueueId> {
        self.membership().map(|m| m.qid)
    }

    pub(crate) fn membership(&self) -> Option<Membership> {
        Membership::decode(self.inner.marker.load(Ordering::Acquire))
    }

    /// Mark the item as queued. Fails with the current membership if the item
    /// is already queued somewhere.
    pub(crate) fn try_assign(&self, membership: Membership) -> Result<(), Membership> {
        self.inner
            .marker
            .compare_exchange(IDLE, membership.encode(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|raw| {
                Membership::decode(raw).expect("compare_exchange only fails on a non-idle marker")
            })
    }

    /// Clear the marker. Caller holds the lock of the queue the marker names.
    pub(crate) fn clear(&self, expected: Membership) {
        let prev = self.inner.marker.swap(IDLE, Ordering::Release);
        debug_assert_eq!(
            Membership::decode(prev),
            Some(expected),
            "marker cleared by a queue that does not own the item"
        );
    }
}

impl Default for Work {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Work {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Work {}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work")
            .field("id", &self.inner.id)
            .field("queued_on", &self.queued_on())
            .finish()
    }
}
