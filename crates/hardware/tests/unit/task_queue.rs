//! # Task Queue Tests
//!
//! Drives the task system through its request protocol the way the Memory stage does:
//! a request is re-issued every cycle until it stops answering `Retry`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rigel_core::config::{Config, TaskPolicy};
use rigel_core::tq::{
    StoreOrder, TaskDescriptor, TaskScheduler, TaskStore, TaskSystem, TqCoreStateType, TqRetType,
};
use rstest::rstest;

const POLL_LIMIT: usize = 500;

fn system(cores: usize, max_size: usize, policy: TaskPolicy) -> TaskSystem {
    let mut config = Config::default();
    config.system.num_cores = cores;
    config.task_queue.max_size = max_size;
    config.task_queue.policy = policy;
    TaskSystem::new(&config)
}

fn step(tq: &mut TaskSystem) {
    tq.per_cycle();
    tq.clock();
}

fn poll(tq: &mut TaskSystem, mut request: impl FnMut(&mut TaskSystem) -> TqRetType) -> TqRetType {
    for _ in 0..POLL_LIMIT {
        let ret = request(tq);
        if ret != TqRetType::Retry {
            return ret;
        }
        step(tq);
    }
    panic!("request still retrying after {POLL_LIMIT} cycles");
}

fn dequeue(tq: &mut TaskSystem, core: usize) -> (TqRetType, Option<TaskDescriptor>) {
    for _ in 0..POLL_LIMIT {
        let (ret, task) = tq.dequeue(core);
        if ret != TqRetType::Retry {
            return (ret, task);
        }
        step(tq);
    }
    panic!("dequeue still retrying after {POLL_LIMIT} cycles");
}

/// Re-issues `request` every cycle and counts the `Retry` answers before the final one.
fn retries(tq: &mut TaskSystem, mut request: impl FnMut(&mut TaskSystem) -> TqRetType) -> (usize, TqRetType) {
    for n in 0..POLL_LIMIT {
        let ret = request(tq);
        if ret != TqRetType::Retry {
            return (n, ret);
        }
        step(tq);
    }
    panic!("request still retrying after {POLL_LIMIT} cycles");
}

/// FIFO scheduler that counts barrier convergences.
#[derive(Debug)]
struct SyncCounter {
    syncs: Arc<AtomicUsize>,
}

impl TaskScheduler for SyncCounter {
    fn select_next_task(&mut self, store: &TaskStore, _cluster: usize) -> Option<usize> {
        store.default_index()
    }

    fn sync_callback(&mut self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_enqueue_dequeue_round_trip() {
    let mut tq = system(1, 16, TaskPolicy::Fifo);
    let task = TaskDescriptor::new(0x400, 0x1000, 3, 9);
    assert_eq!(poll(&mut tq, |tq| tq.enqueue(0, task)), TqRetType::Success);
    assert_eq!(tq.queue_len(), 1);
    assert_eq!(dequeue(&mut tq, 0), (TqRetType::Success, Some(task)));
    assert_eq!(tq.queue_len(), 0);
    let c = tq.counters();
    assert_eq!((c.enqueued, c.dequeued), (1, 1));
    step(&mut tq);
    assert_eq!(tq.state(0), TqCoreStateType::Active);
}

#[test]
fn test_lifo_returns_newest_first() {
    let mut tq = system(1, 16, TaskPolicy::Lifo);
    let a = TaskDescriptor::new(1, 0, 0, 1);
    let b = TaskDescriptor::new(2, 0, 1, 2);
    assert_eq!(poll(&mut tq, |tq| tq.enqueue(0, a)), TqRetType::Success);
    assert_eq!(poll(&mut tq, |tq| tq.enqueue(0, b)), TqRetType::Success);
    assert_eq!(dequeue(&mut tq, 0).1, Some(b));
    assert_eq!(dequeue(&mut tq, 0).1, Some(a));
}

#[test]
fn test_loop_enqueue_splits_range() {
    let mut tq = system(1, 16, TaskPolicy::Fifo);
    let template = TaskDescriptor::new(0x80, 0x2000, 0, 0);
    assert_eq!(poll(&mut tq, |tq| tq.enqueue_loop(0, template, 10, 4)), TqRetType::Success);
    let mut ranges = Vec::new();
    while tq.queue_len() > 0 {
        let (_, task) = dequeue(&mut tq, 0);
        let task = task.unwrap();
        assert_eq!((task.ip, task.data), (0x80, 0x2000));
        ranges.push((task.begin, task.end));
    }
    assert_eq!(ranges, vec![(0, 4), (4, 8), (8, 10)]);
}

#[test]
fn test_overflow_enqueues_nothing() {
    let mut tq = system(1, 2, TaskPolicy::Fifo);
    let template = TaskDescriptor::new(0x80, 0, 0, 0);
    assert_eq!(tq.enqueue_loop(0, template, 3, 1), TqRetType::Overflow);
    assert_eq!(tq.queue_len(), 0);
    assert_eq!(tq.free_slots(), 2);
    assert_eq!(tq.counters().overflows, 1);
}

#[test]
fn test_barrier_releases_every_blocked_core() {
    let mut tq = system(2, 16, TaskPolicy::Fifo);
    let mut results = [None, None];
    for _ in 0..POLL_LIMIT {
        for (core, slot) in results.iter_mut().enumerate() {
            if slot.is_none() {
                let (ret, _) = tq.dequeue(core);
                if ret == TqRetType::Sync {
                    *slot = Some(ret);
                }
            }
        }
        if results.iter().all(Option::is_some) {
            break;
        }
        step(&mut tq);
    }
    assert_eq!(results, [Some(TqRetType::Sync), Some(TqRetType::Sync)]);
    assert_eq!(tq.counters().syncs, 1);
    step(&mut tq);
    assert_eq!(tq.state(0), TqCoreStateType::Active);
    assert_eq!(tq.state(1), TqCoreStateType::Active);
}

#[test]
fn test_end_releases_blocked_core() {
    let mut tq = system(2, 16, TaskPolicy::Fifo);
    assert_eq!(dequeue(&mut tq, 0).0, TqRetType::Block);
    assert_eq!(poll(&mut tq, |tq| tq.end(1)), TqRetType::Success);
    assert!(tq.end_signaled());
    let ret = poll(&mut tq, |tq| match tq.dequeue(0).0 {
        TqRetType::Block => TqRetType::Retry,
        other => other,
    });
    assert_eq!(ret, TqRetType::End);
    assert_eq!(tq.counters().syncs, 0);
}

#[test]
fn test_status_codes() {
    let codes: Vec<u32> = [
        TqRetType::Success,
        TqRetType::Retry,
        TqRetType::Overflow,
        TqRetType::Block,
        TqRetType::Sync,
        TqRetType::End,
    ]
    .iter()
    .map(|r| r.status_code())
    .collect();
    assert_eq!(codes, vec![0, 1, 2, 3, 4, 5]);
}

#[rstest]
#[case(2)]
#[case(5)]
#[case(9)]
fn test_enqueue_answers_after_configured_latency(#[case] latency: u64) {
    let mut config = Config::default();
    config.task_queue.latency_enqueue_one = latency;
    let mut tq = TaskSystem::new(&config);

    let (n, ret) = retries(&mut tq, |tq| tq.enqueue(0, TaskDescriptor::new(1, 0, 0, 1)));
    assert_eq!(ret, TqRetType::Success);
    // The issuing cycle counts toward the latency.
    assert_eq!(n as u64, latency - 1);
    assert_eq!(tq.queue_len(), 1);
}

#[test]
fn test_dequeue_and_end_answer_after_their_latencies() {
    let mut config = Config::default();
    config.task_queue.latency_dequeue = 3;
    config.task_queue.latency_end = 7;
    let mut tq = TaskSystem::new(&config);
    let task = TaskDescriptor::new(0x40, 0, 0, 1);
    assert_eq!(poll(&mut tq, |tq| tq.enqueue(0, task)), TqRetType::Success);
    step(&mut tq);

    let mut got = None;
    let (n, ret) = retries(&mut tq, |tq| {
        let (ret, t) = tq.dequeue(0);
        got = t;
        ret
    });
    assert_eq!((n, ret, got), (2, TqRetType::Success, Some(task)));
    step(&mut tq);

    assert_eq!(retries(&mut tq, |tq| tq.end(0)), (6, TqRetType::Success));
}

#[rstest]
#[case(2)]
#[case(6)]
fn test_barrier_releases_after_blocked_sync_latency(#[case] latency: u64) {
    let syncs = Arc::new(AtomicUsize::new(0));
    let mut config = Config::default();
    config.system.num_cores = 2;
    config.task_queue.latency_blocked_sync = latency;
    let scheduler = SyncCounter {
        syncs: Arc::clone(&syncs),
    };
    let mut tq = TaskSystem::with_scheduler(&config, Box::new(scheduler), TaskStore::new(16, StoreOrder::Fifo));

    for round in 1..=2 {
        for core in 0..2 {
            assert_eq!(dequeue(&mut tq, core).0, TqRetType::Block);
        }
        let mut waited = 0;
        while tq.counters().syncs < round {
            step(&mut tq);
            waited += 1;
            assert!(waited < POLL_LIMIT, "barrier never converged");
        }
        assert_eq!(syncs.load(Ordering::SeqCst), round as usize);
        assert_eq!(tq.state(0), TqCoreStateType::PendingUnblock);

        let mut release = 0;
        while tq.state(0) != TqCoreStateType::Unblock {
            step(&mut tq);
            release += 1;
            assert!(release < POLL_LIMIT, "barrier never released");
        }
        assert_eq!(release as u64, latency - 1);
        assert_eq!(tq.state(1), TqCoreStateType::Unblock);
        assert_eq!(syncs.load(Ordering::SeqCst), round as usize);

        assert_eq!(tq.dequeue(0).0, TqRetType::Sync);
        assert_eq!(tq.dequeue(1).0, TqRetType::Sync);
        step(&mut tq);
        step(&mut tq);
        assert_eq!(syncs.load(Ordering::SeqCst), round as usize);
    }
}
