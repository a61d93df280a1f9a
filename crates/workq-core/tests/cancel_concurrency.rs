use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use serde_json::json;
use workq_core::{
    FnHandler, QueueId, Work, WorkHandler, WorkQueues, WorkerGroup, WorkqConfig, WorkqError,
};

const ROUNDS: usize = 20_000;

fn noop() -> Arc<dyn WorkHandler> {
    Arc::new(FnHandler::new(|_| Ok(())))
}

fn registry() -> Arc<WorkQueues> {
    Arc::new(WorkQueues::new(&WorkqConfig::default()).unwrap())
}

/// Marker and list agree, and nothing was lost or duplicated.
fn assert_consistent(queues: &WorkQueues, work: &Work, bystanders: &[Work]) {
    let holders = queues.holders(work);
    match work.queued_on() {
        Some(qid) => assert_eq!(holders, vec![qid]),
        None => assert!(holders.is_empty(), "idle item still linked: {holders:?}"),
    }

    let pending = queues.pending(QueueId::HPWORK).unwrap();
    let counts = queues.counts(QueueId::HPWORK).unwrap();
    assert_eq!(pending.len(), counts.pending);
    assert_eq!(
        counts.submitted,
        counts.cancelled + counts.claimed + counts.pending as u64
    );

    let survivors: Vec<_> = pending.iter().filter(|id| **id != work.id()).copied().collect();
    let expected: Vec<_> = bystanders.iter().map(Work::id).collect();
    assert_eq!(survivors, expected, "bystanders lost or reordered");
}

#[test]
fn end_to_end_cancel_of_head_item() {
    let queues = registry();
    let w1 = Work::new();
    let w2 = Work::new();
    queues.submit(QueueId::new(0), &w1, noop(), json!("w1")).unwrap();
    queues.submit(QueueId::new(0), &w2, noop(), json!("w2")).unwrap();

    assert!(queues.cancel(QueueId::new(0), &w1).is_ok());
    assert_eq!(queues.pending(QueueId::new(0)).unwrap(), vec![w2.id()]);
    assert!(!w1.is_queued());

    assert!(queues.cancel(QueueId::new(0), &w1).is_ok());
    assert_eq!(queues.pending(QueueId::new(0)).unwrap(), vec![w2.id()]);
}

#[test]
fn interrupt_producer_races_canceller() {
    let queues = registry();
    let work = Work::new();
    let bystanders: Vec<Work> = (0..3).map(|_| Work::new()).collect();
    for b in &bystanders {
        queues.submit(QueueId::HPWORK, b, noop(), json!(null)).unwrap();
    }

    let start = Arc::new(Barrier::new(2));

    let producer = {
        let queues = Arc::clone(&queues);
        let work = work.clone();
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            let mut queued = 0;
            for _ in 0..ROUNDS {
                // Interrupt context must not block: drop the submission if
                // the queue is busy or the item is still pending.
                match queues.try_submit(QueueId::HPWORK, &work, noop(), json!(null)) {
                    Ok(()) => queued += 1,
                    Err(WorkqError::Busy(_)) | Err(WorkqError::AlreadyQueued { .. }) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            queued
        })
    };

    start.wait();
    for _ in 0..ROUNDS {
        queues.cancel(QueueId::HPWORK, &work).unwrap();
    }

    let queued: u64 = producer.join().unwrap();
    let counts = queues.counts(QueueId::HPWORK).unwrap();
    assert_eq!(counts.submitted, bystanders.len() as u64 + queued);
    assert_consistent(&queues, &work, &bystanders);

    queues.cancel(QueueId::HPWORK, &work).unwrap();
    assert!(queues.holders(&work).is_empty());
    assert_consistent(&queues, &work, &bystanders);
}

#[test]
fn submit_cancel_and_claim_from_three_threads() {
    let queues = registry();
    let work = Work::new();
    let start = Arc::new(Barrier::new(3));

    let submitter = {
        let (queues, work, start) = (Arc::clone(&queues), work.clone(), Arc::clone(&start));
        thread::spawn(move || {
            start.wait();
            for _ in 0..ROUNDS {
                let _ = queues.submit(QueueId::HPWORK, &work, noop(), json!(null));
            }
        })
    };
    let claimer = {
        let (queues, start) = (Arc::clone(&queues), Arc::clone(&start));
        thread::spawn(move || {
            start.wait();
            let mut claimed = 0u64;
            for _ in 0..ROUNDS {
                if queues.claim(QueueId::HPWORK).unwrap().is_some() {
                    claimed += 1;
                }
            }
            claimed
        })
    };

    start.wait();
    for _ in 0..ROUNDS {
        queues.cancel(QueueId::HPWORK, &work).unwrap();
    }

    submitter.join().unwrap();
    let claimed = claimer.join().unwrap();

    assert_eq!(queues.counts(QueueId::HPWORK).unwrap().claimed, claimed);
    assert_consistent(&queues, &work, &[]);
}

#[tokio::test]
async fn submit_cancel_resubmit_then_execute() {
    let queues = registry();

    let runs = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&runs);
    let handler: Arc<dyn WorkHandler> = Arc::new(FnHandler::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let work = Work::new();
    queues.submit(QueueId::LPWORK, &work, handler.clone(), json!(null)).unwrap();
    queues.cancel(QueueId::LPWORK, &work).unwrap();

    // Start the workers only now: the cancelled submission must never run.
    let group = WorkerGroup::spawn(Arc::clone(&queues));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    queues.submit(QueueId::LPWORK, &work, handler, json!(null)).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while runs.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("resubmitted work never ran");

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!work.is_queued());
    let counts = queues.counts(QueueId::LPWORK).unwrap();
    assert_eq!((counts.submitted, counts.cancelled, counts.claimed), (2, 1, 1));

    group.shutdown_and_join().await;
}
