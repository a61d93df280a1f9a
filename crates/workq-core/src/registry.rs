//! Queue registry: the fixed set of queues, indexed by `QueueId`.
//!
//! Built once from configuration and shared by reference (usually behind an
//! `Arc`). Every operation validates the queue id first, so an out-of-range
//! id is a `WorkqError::InvalidQueue` in every build profile.

use std::sync::Arc;

use crate::config::WorkqConfig;
use crate::domain::{QueueId, Work, WorkId};
use crate::error::{Result, WorkqError};
use crate::handler::WorkHandler;
use crate::observability::QueueCounts;
use crate::queue::{Claimed, WorkQueue};

pub struct WorkQueues {
    queues: Vec<WorkQueue>,
}

impl WorkQueues {
    pub fn new(config: &WorkqConfig) -> Result<Self> {
        config.validate()?;
        let queues = config
            .queues
            .iter()
            .enumerate()
            .map(|(index, q)| WorkQueue::new(QueueId::new(index), q.name.clone()))
            .collect();
        Ok(Self { queues })
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkQueue> {
        self.queues.iter()
    }

    pub fn queue(&self, qid: QueueId) -> Result<&WorkQueue> {
        self.queues
            .get(qid.index())
            .ok_or(WorkqError::InvalidQueue {
                qid: qid.index(),
                nqueues: self.queues.len(),
            })
    }

    /// Look a queue up by its configured name.
    pub fn find(&self, name: &str) -> Option<QueueId> {
        self.queues
            .iter()
            .find(|q| q.name() == name)
            .map(WorkQueue::qid)
    }

    pub fn submit(
        &self,
        qid: QueueId,
        work: &Work,
        handler: Arc<dyn WorkHandler>,
        arg: serde_json::Value,
    ) -> Result<()> {
        self.queue(qid)?.submit(work, handler, arg)
    }

    /// Non-blocking submit for interrupt-style producers.
    pub fn try_submit(
        &self,
        qid: QueueId,
        work: &Work,
        handler: Arc<dyn WorkHandler>,
        arg: serde_json::Value,
    ) -> Result<()> {
        self.queue(qid)?.try_submit(work, handler, arg)
    }

    /// Cancel previously queued work. See [`WorkQueue::cancel`].
    pub fn cancel(&self, qid: QueueId, work: &Work) -> Result<()> {
        self.queue(qid)?.cancel(work)
    }

    pub fn claim(&self, qid: QueueId) -> Result<Option<Claimed>> {
        Ok(self.queue(qid)?.claim())
    }

    pub fn signal(&self, qid: QueueId) -> Result<()> {
        self.queue(qid)?.signal();
        Ok(())
    }

    pub fn pending(&self, qid: QueueId) -> Result<Vec<WorkId>> {
        Ok(self.queue(qid)?.pending())
    }

    pub fn counts(&self, qid: QueueId) -> Result<QueueCounts> {
        Ok(self.queue(qid)?.counts())
    }

    /// Every queue whose pending list holds `work`. At most one, unless an
    /// invariant is broken.
    pub fn holders(&self, work: &Work) -> Vec<QueueId> {
        self.queues
            .iter()
            .filter(|q| q.contains(work))
            .map(WorkQueue::qid)
            .collect()
    }
}
