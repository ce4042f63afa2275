//! Task Selection Policies.
//!
//! `TaskScheduler` decides which queued task a dequeue receives. This module provides:
//! 1. **`OrderedScheduler`:** Plain FIFO or LIFO selection.
//! 2. **`IntervalAffinityScheduler`:** Scores candidates by iteration-range overlap with what
//!    the same cluster processed in the previous barrier epoch. Each cluster keeps a bounded
//!    multiset window of dequeued descriptors; `sync_callback` rolls the current epoch's
//!    windows into the previous slot.
//! 3. **`StackAffinityScheduler`:** Scores candidates by how recently the cluster processed an
//!    overlapping or adjoining range of the same data, using a bounded recency stack.
//!
//! Both affinity policies pick the highest positive score (earliest index on ties) and fall
//! back to round-robin by index when nothing scores, counting which path was taken.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use super::descriptor::TaskDescriptor;
use super::store::{StoreOrder, TaskStore};
use crate::config::TaskPolicy;

/// Dequeues scheduled with and without cache affinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffinityCounters {
    /// Chosen by a positive affinity score.
    pub with_affinity: u64,
    /// Chosen by the round-robin fallback.
    pub without_affinity: u64,
}

/// Task selection policy plugged into the task system.
pub trait TaskScheduler: fmt::Debug {
    /// Picks the index of the task `cluster` receives; `None` only when the store is empty.
    fn select_next_task(&mut self, store: &TaskStore, cluster: usize) -> Option<usize>;

    /// Notes that `cluster` received `task`.
    fn record_dequeue(&mut self, _cluster: usize, _task: &TaskDescriptor) {}

    /// Called once per barrier convergence.
    fn sync_callback(&mut self) {}

    /// Affinity bookkeeping so far.
    fn counters(&self) -> AffinityCounters {
        AffinityCounters::default()
    }
}

/// Builds the scheduler and store order for `policy`.
pub fn scheduler_for(policy: TaskPolicy, window: usize, clusters: usize) -> (Box<dyn TaskScheduler>, StoreOrder) {
    match policy {
        TaskPolicy::Fifo => (Box::new(OrderedScheduler), StoreOrder::Fifo),
        TaskPolicy::Lifo => (Box::new(OrderedScheduler), StoreOrder::Lifo),
        TaskPolicy::IntervalAffinity => (
            Box::new(IntervalAffinityScheduler::new(window, clusters)),
            StoreOrder::Fifo,
        ),
        TaskPolicy::StackAffinity => (
            Box::new(StackAffinityScheduler::new(window, clusters)),
            StoreOrder::Lifo,
        ),
    }
}

/// Takes tasks in the store's default order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedScheduler;

impl TaskScheduler for OrderedScheduler {
    fn select_next_task(&mut self, store: &TaskStore, _cluster: usize) -> Option<usize> {
        store.default_index()
    }
}

/// Greedy best-score pick with round-robin fallback.
#[derive(Debug, Clone, Default)]
struct AffinityPicker {
    rr: usize,
    counters: AffinityCounters,
}

impl AffinityPicker {
    fn pick(&mut self, store: &TaskStore, score: impl Fn(&TaskDescriptor) -> u64) -> Option<usize> {
        if store.is_empty() {
            return None;
        }
        let best = store
            .iter()
            .enumerate()
            .map(|(i, t)| (score(t), i))
            .filter(|(s, _)| *s > 0)
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        if let Some((_, idx)) = best {
            self.counters.with_affinity += 1;
            return Some(idx);
        }
        let idx = self.rr % store.len();
        self.rr = self.rr.wrapping_add(1);
        self.counters.without_affinity += 1;
        Some(idx)
    }
}

/// Bounded multiset of recently dequeued descriptors.
#[derive(Debug, Clone, Default)]
struct HistoryWindow {
    order: VecDeque<TaskDescriptor>,
    counts: BTreeMap<TaskDescriptor, usize>,
}

impl HistoryWindow {
    fn push(&mut self, task: TaskDescriptor, cap: usize) {
        if self.order.len() >= cap {
            if let Some(old) = self.order.pop_front() {
                if let Some(n) = self.counts.get_mut(&old) {
                    *n -= 1;
                    if *n == 0 {
                        let _ = self.counts.remove(&old);
                    }
                }
            }
        }
        self.order.push_back(task);
        *self.counts.entry(task).or_insert(0) += 1;
    }

    fn score(&self, task: &TaskDescriptor) -> u64 {
        self.counts
            .iter()
            .filter(|(h, _)| h.data == task.data)
            .map(|(h, n)| u64::from(h.overlap(task)) * *n as u64)
            .sum()
    }
}

/// Interval-overlap affinity against the previous epoch.
#[derive(Debug, Clone)]
pub struct IntervalAffinityScheduler {
    window: usize,
    current: Vec<HistoryWindow>,
    previous: Vec<HistoryWindow>,
    picker: AffinityPicker,
}

impl IntervalAffinityScheduler {
    /// Creates a scheduler tracking `clusters` clusters with `window` entries each.
    pub fn new(window: usize, clusters: usize) -> Self {
        let clusters = clusters.max(1);
        Self {
            window: window.max(1),
            current: vec![HistoryWindow::default(); clusters],
            previous: vec![HistoryWindow::default(); clusters],
            picker: AffinityPicker::default(),
        }
    }
}

impl TaskScheduler for IntervalAffinityScheduler {
    fn select_next_task(&mut self, store: &TaskStore, cluster: usize) -> Option<usize> {
        let history = self.previous.get(cluster);
        self.picker
            .pick(store, |t| history.map_or(0, |h| h.score(t)))
    }

    fn record_dequeue(&mut self, cluster: usize, task: &TaskDescriptor) {
        let cap = self.window;
        if let Some(w) = self.current.get_mut(cluster) {
            w.push(*task, cap);
        }
    }

    fn sync_callback(&mut self) {
        let fresh = vec![HistoryWindow::default(); self.current.len()];
        self.previous = std::mem::replace(&mut self.current, fresh);
    }

    fn counters(&self) -> AffinityCounters {
        self.picker.counters
    }
}

/// Recency-stack affinity.
#[derive(Debug, Clone)]
pub struct StackAffinityScheduler {
    window: usize,
    stacks: Vec<VecDeque<TaskDescriptor>>,
    picker: AffinityPicker,
}

impl StackAffinityScheduler {
    /// Creates a scheduler tracking `clusters` clusters with `window`-deep stacks.
    pub fn new(window: usize, clusters: usize) -> Self {
        Self {
            window: window.max(1),
            stacks: vec![VecDeque::new(); clusters.max(1)],
            picker: AffinityPicker::default(),
        }
    }
}

impl TaskScheduler for StackAffinityScheduler {
    fn select_next_task(&mut self, store: &TaskStore, cluster: usize) -> Option<usize> {
        let window = self.window as u64;
        let stack = self.stacks.get(cluster);
        self.picker.pick(store, |t| {
            stack.map_or(0, |s| {
                s.iter()
                    .rev()
                    .enumerate()
                    .filter(|(_, h)| h.data == t.data && (h.overlap(t) > 0 || h.adjoins(t)))
                    .map(|(depth, _)| window.saturating_sub(depth as u64))
                    .max()
                    .unwrap_or(0)
            })
        })
    }

    fn record_dequeue(&mut self, cluster: usize, task: &TaskDescriptor) {
        let window = self.window;
        if let Some(s) = self.stacks.get_mut(cluster) {
            s.push_back(*task);
            while s.len() > window {
                let _ = s.pop_front();
            }
        }
    }

    fn counters(&self) -> AffinityCounters {
        self.picker.counters
    }
}
