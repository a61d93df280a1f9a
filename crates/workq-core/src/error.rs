use thiserror::Error;

use crate::domain::{QueueId, WorkId};

#[derive(Debug, Error)]
pub enum WorkqError {
    #[error("invalid work queue id={qid} (registry holds {nqueues} queues)")]
    InvalidQueue { qid: usize, nqueues: usize },

    #[error("{work} is queued on qid={actual}, not qid={requested}")]
    QueueMismatch {
        work: WorkId,
        requested: QueueId,
        actual: QueueId,
    },

    #[error("{work} is queued on another qid={qid} (different registry or queue instance)")]
    ForeignQueue { work: WorkId, qid: QueueId },

    #[error("{work} is already queued on qid={qid}")]
    AlreadyQueued { work: WorkId, qid: QueueId },

    #[error("work queue qid={0} is locked")]
    Busy(QueueId),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, WorkqError>;
