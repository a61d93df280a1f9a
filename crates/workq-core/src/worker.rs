use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::QueueId;
use crate::queue::WorkQueue;
use crate::registry::WorkQueues;

/// Worker group handle: one worker task per queue.
/// - Dropping `shutdown_tx` stops every worker.
/// - `shutdown_and_join()` waits for all of them.
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn a worker for every queue in the registry.
    pub fn spawn(queues: Arc<WorkQueues>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(queues.len());
        for index in 0..queues.len() {
            let qs = Arc::clone(&queues);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                let Ok(queue) = qs.queue(QueueId::new(index)) else {
                    return;
                };
                worker_loop(queue, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Request shutdown for all workers.
    /// An item already claimed runs to completion; nothing new is claimed.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(e) = join.await {
                tracing::warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop(queue: &WorkQueue, shutdown_rx: &mut watch::Receiver<bool>) {
    tracing::info!(qid = %queue.qid(), name = queue.name(), "worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // Drain everything that is ready. The queue lock is released inside
        // claim(), before the callback runs.
        while let Some(claimed) = queue.claim() {
            let work = claimed.work().id();
            if let Err(e) = claimed.run().await {
                tracing::warn!(qid = %queue.qid(), %work, error = %e, "work failed");
            }
            if *shutdown_rx.borrow() {
                break;
            }
        }

        // Sleep until the next submit/signal or shutdown. A submit that
        // lands between the drain and here leaves a stored permit, so the
        // wakeup is not lost.
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender dropped: treat as shutdown
                if changed.is_err() {
                    break;
                }
            }
            _ = queue.wait() => {}
        }
    }
    tracing::info!(qid = %queue.qid(), "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkqConfig;
    use crate::domain::Work;
    use crate::handler::FnHandler;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    async fn wait_for(mut done: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn workers_execute_submitted_work() {
        let queues = Arc::new(WorkQueues::new(&WorkqConfig::default()).unwrap());
        let group = WorkerGroup::spawn(Arc::clone(&queues));

        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let handler = Arc::new(FnHandler::new(move |arg| {
            counter.fetch_add(arg.as_u64().unwrap_or(0) as u32, Ordering::SeqCst);
            Ok(())
        }));

        let w1 = Work::new();
        let w2 = Work::new();
        queues.submit(QueueId::HPWORK, &w1, handler.clone(), json!(1)).unwrap();
        queues.submit(QueueId::LPWORK, &w2, handler, json!(10)).unwrap();

        wait_for(|| runs.load(Ordering::SeqCst) == 11).await;
        assert!(!w1.is_queued());
        assert!(!w2.is_queued());

        group.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn failing_work_does_not_stop_worker() {
        let queues = Arc::new(WorkQueues::new(&WorkqConfig::default()).unwrap());
        let group = WorkerGroup::spawn(Arc::clone(&queues));

        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let handler = Arc::new(FnHandler::new(move |arg| {
            counter.fetch_add(1, Ordering::SeqCst);
            if arg["fail"].as_bool() == Some(true) {
                return Err(crate::error::WorkqError::Other("boom".to_string()));
            }
            Ok(())
        }));

        let bad = Work::new();
        let good = Work::new();
        queues
            .submit(QueueId::HPWORK, &bad, handler.clone(), json!({"fail": true}))
            .unwrap();
        queues
            .submit(QueueId::HPWORK, &good, handler, json!({"fail": false}))
            .unwrap();

        wait_for(|| runs.load(Ordering::SeqCst) == 2).await;
        group.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn shutdown_joins_past_a_panicked_worker() {
        let queues = Arc::new(WorkQueues::new(&WorkqConfig::default()).unwrap());
        let group = WorkerGroup::spawn(Arc::clone(&queues));

        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let handler = Arc::new(FnHandler::new(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("handler blew up");
            }
            Ok(())
        }));

        let work = Work::new();
        queues.submit(QueueId::HPWORK, &work, handler, json!(null)).unwrap();
        wait_for(|| runs.load(Ordering::SeqCst) == 1).await;

        tokio::time::timeout(Duration::from_secs(5), group.shutdown_and_join())
            .await
            .expect("workers did not stop");
        assert!(!work.is_queued());
    }

    #[tokio::test]
    async fn shutdown_completes_with_idle_workers() {
        let queues = Arc::new(WorkQueues::new(&WorkqConfig::default()).unwrap());
        let group = WorkerGroup::spawn(queues);

        tokio::time::timeout(Duration::from_secs(5), group.shutdown_and_join())
            .await
            .expect("workers did not stop");
    }
}
