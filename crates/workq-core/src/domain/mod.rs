//! Domain model: queue and work identifiers, the work item handle.

pub mod ids;
pub mod work;

pub use ids::{MAX_QUEUES, QueueId, WorkId};
pub use work::Work;
