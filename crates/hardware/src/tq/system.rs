//! Task System.
//!
//! The machine-wide task queue shared by every core. It provides:
//! 1. **Requests:** `enqueue`, `enqueue_loop`, `dequeue` and `end`, polled by the Memory stage
//!    until they stop returning `Retry` / `Block`.
//! 2. **Barrier Detection:** `per_cycle` notices when every core is blocked on an empty queue,
//!    releases them after the blocked-sync latency and fires the scheduler's sync hook once
//!    per convergence.
//! 3. **Clocking:** `clock` commits every core's two-phase state.
//!
//! Enqueues take effect in the store immediately; the requesting core then waits out the
//! operation latency before the request reports `Success`.

use tracing::debug;

use super::core_state::{TqCoreState, TqCoreStateType};
use super::descriptor::{TaskDescriptor, TqRetType};
use super::scheduler::{AffinityCounters, TaskScheduler, scheduler_for};
use super::store::TaskStore;
use crate::config::{Config, TaskQueueConfig};

/// Task queue activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TqCounters {
    /// Tasks accepted.
    pub enqueued: u64,
    /// Tasks handed out.
    pub dequeued: u64,
    /// Rejected enqueue requests.
    pub overflows: u64,
    /// Dequeues that found the queue empty.
    pub blocked: u64,
    /// Barrier convergences.
    pub syncs: u64,
}

/// Machine-wide task queue.
#[derive(Debug)]
pub struct TaskSystem {
    store: TaskStore,
    cores: Vec<TqCoreState>,
    cores_per_cluster: usize,
    cfg: TaskQueueConfig,
    scheduler: Box<dyn TaskScheduler>,
    end_signaled: bool,
    counters: TqCounters,
}

impl TaskSystem {
    /// Builds the task system for the machine described by `config`.
    pub fn new(config: &Config) -> Self {
        let cores = config.system.num_cores;
        let per_cluster = config.system.cores_per_cluster.max(1);
        let clusters = cores.div_ceil(per_cluster);
        let (scheduler, order) = scheduler_for(
            config.task_queue.policy,
            config.task_queue.affinity_window,
            clusters,
        );
        Self::with_scheduler(config, scheduler, TaskStore::new(config.task_queue.max_size, order))
    }

    /// Builds the task system around an explicit scheduler and store.
    pub fn with_scheduler(config: &Config, scheduler: Box<dyn TaskScheduler>, store: TaskStore) -> Self {
        Self {
            store,
            cores: vec![TqCoreState::new(); config.system.num_cores],
            cores_per_cluster: config.system.cores_per_cluster.max(1),
            cfg: config.task_queue.clone(),
            scheduler,
            end_signaled: false,
            counters: TqCounters::default(),
        }
    }

    /// Committed state of `core`.
    pub fn state(&self, core: usize) -> TqCoreStateType {
        self.cores.get(core).map_or(TqCoreStateType::Invalid, TqCoreState::state)
    }

    /// Queued tasks.
    pub fn queue_len(&self) -> usize {
        self.store.len()
    }

    /// Free queue slots.
    pub fn free_slots(&self) -> usize {
        self.store.free()
    }

    /// Activity counters.
    pub fn counters(&self) -> TqCounters {
        self.counters
    }

    /// Affinity counters of the scheduler.
    pub fn affinity_counters(&self) -> AffinityCounters {
        self.scheduler.counters()
    }

    /// Whether `tqend` has been issued.
    pub fn end_signaled(&self) -> bool {
        self.end_signaled
    }

    /// Enqueues one task on behalf of `core`.
    pub fn enqueue(&mut self, core: usize, task: TaskDescriptor) -> TqRetType {
        let latency = self.cfg.latency_enqueue_one;
        self.enqueue_tasks(core, &[task], TqCoreStateType::PendingEnqueueOne, latency)
    }

    /// Enqueues `ceil(count / stride)` tasks covering `[template.begin, template.begin + count)`.
    ///
    /// Every generated task copies `ip` and `data` from `template`. A zero stride is treated
    /// as one.
    pub fn enqueue_loop(&mut self, core: usize, template: TaskDescriptor, count: u32, stride: u32) -> TqRetType {
        let latency = self.cfg.latency_enqueue_loop;
        if self.cores.get(core).map(TqCoreState::state) != Some(TqCoreStateType::Active) {
            return self.enqueue_tasks(core, &[], TqCoreStateType::PendingEnqueueLoop, latency);
        }
        let stride = stride.max(1);
        let base = template.begin;
        let limit = base.saturating_add(count);
        let tasks: Vec<TaskDescriptor> = (0..count.div_ceil(stride))
            .map(|i| {
                let begin = base.saturating_add(i.saturating_mul(stride));
                TaskDescriptor::new(template.ip, template.data, begin, begin.saturating_add(stride).min(limit))
            })
            .collect();
        self.enqueue_tasks(core, &tasks, TqCoreStateType::PendingEnqueueLoop, latency)
    }

    fn enqueue_tasks(
        &mut self,
        core: usize,
        tasks: &[TaskDescriptor],
        pending: TqCoreStateType,
        latency: u64,
    ) -> TqRetType {
        let Some(state) = self.cores.get_mut(core) else {
            return TqRetType::Retry;
        };
        if state.has_request() {
            return TqRetType::Retry;
        }
        match state.state() {
            TqCoreStateType::Active => {
                if !self.store.push_all(tasks) {
                    self.counters.overflows += 1;
                    return TqRetType::Overflow;
                }
                self.counters.enqueued += tasks.len() as u64;
                debug!(core, tasks = tasks.len(), queued = self.store.len(), "tq enqueue");
                state.update(pending, latency);
                TqRetType::Retry
            }
            s if s == pending && state.check_ready() => {
                state.update(TqCoreStateType::Active, 0);
                TqRetType::Success
            }
            _ => TqRetType::Retry,
        }
    }

    /// Requests a task for `core`.
    ///
    /// # Returns
    ///
    /// `(Success, Some(task))` once a task has been delivered; otherwise the status to retry on.
    pub fn dequeue(&mut self, core: usize) -> (TqRetType, Option<TaskDescriptor>) {
        let cluster = core / self.cores_per_cluster;
        let latency = self.cfg.latency_dequeue;
        let Some(state) = self.cores.get_mut(core) else {
            return (TqRetType::Retry, None);
        };
        if state.has_request() {
            return (TqRetType::Retry, None);
        }
        match state.state() {
            TqCoreStateType::Active => {
                state.update(TqCoreStateType::PendingDequeue, latency);
                (TqRetType::Retry, None)
            }
            TqCoreStateType::PendingDequeue if state.check_ready() => {
                let picked = self
                    .scheduler
                    .select_next_task(&self.store, cluster)
                    .and_then(|idx| self.store.remove(idx));
                match picked {
                    Some(task) => {
                        self.scheduler.record_dequeue(cluster, &task);
                        self.counters.dequeued += 1;
                        state.update(TqCoreStateType::Active, 0);
                        debug!(core, %task, "tq dequeue");
                        (TqRetType::Success, Some(task))
                    }
                    None => {
                        self.counters.blocked += 1;
                        state.update(TqCoreStateType::Blocking, 0);
                        (TqRetType::Block, None)
                    }
                }
            }
            TqCoreStateType::Blocking if !self.store.is_empty() => {
                state.update(TqCoreStateType::PendingDequeue, latency);
                (TqRetType::Retry, None)
            }
            TqCoreStateType::Blocking | TqCoreStateType::PendingUnblock => (TqRetType::Block, None),
            TqCoreStateType::Unblock => {
                state.update(TqCoreStateType::Active, 0);
                (TqRetType::Sync, None)
            }
            TqCoreStateType::EndUnblock => (TqRetType::End, None),
            _ => (TqRetType::Retry, None),
        }
    }

    /// Signals on behalf of `core` that no more work will be enqueued.
    pub fn end(&mut self, core: usize) -> TqRetType {
        let latency = self.cfg.latency_end;
        let Some(state) = self.cores.get_mut(core) else {
            return TqRetType::Retry;
        };
        if state.has_request() {
            return TqRetType::Retry;
        }
        match state.state() {
            TqCoreStateType::Active => {
                self.end_signaled = true;
                debug!(core, "tq end signaled");
                state.update(TqCoreStateType::PendingEnd, latency);
                TqRetType::Retry
            }
            TqCoreStateType::PendingEnd if state.check_ready() => {
                state.update(TqCoreStateType::Active, 0);
                TqRetType::Success
            }
            TqCoreStateType::EndUnblock => TqRetType::Success,
            _ => TqRetType::Retry,
        }
    }

    /// Once-per-cycle global step: end propagation, barrier detection and release.
    pub fn per_cycle(&mut self) {
        let settled = |s: &TqCoreState| !s.has_request();
        if self.end_signaled {
            for (core, s) in self.cores.iter_mut().enumerate() {
                if settled(s) && s.state() == TqCoreStateType::Blocking {
                    debug!(core, "tq end unblock");
                    s.update(TqCoreStateType::EndUnblock, 0);
                }
            }
        } else if !self.cores.is_empty()
            && self
                .cores
                .iter()
                .all(|s| settled(s) && s.state() == TqCoreStateType::Blocking)
        {
            let latency = self.cfg.latency_blocked_sync;
            for s in &mut self.cores {
                s.update(TqCoreStateType::PendingUnblock, latency);
            }
            self.counters.syncs += 1;
            self.scheduler.sync_callback();
            debug!(syncs = self.counters.syncs, "tq barrier converged");
        }
        for s in &mut self.cores {
            if settled(s) && s.state() == TqCoreStateType::PendingUnblock && s.check_ready() {
                s.update(TqCoreStateType::Unblock, 0);
            }
        }
    }

    /// Commits every core's requested state.
    pub fn clock(&mut self) {
        for s in &mut self.cores {
            s.clock();
        }
    }
}
