//! Work queues: pending list, per-queue lock, submit / claim / cancel.
//!
//! Design intent:
//! - The queue owns the list nodes; items are owned by their submitters.
//! - An item's marker says which queue (and which node) holds it.
//! - Every list or marker mutation happens under the owning queue's lock.

mod cancel;
mod list;
mod lock;
mod work_queue;

pub use list::PendingList;
pub use lock::{QueueGuard, QueueLock};
pub use work_queue::{Claimed, WorkQueue};
