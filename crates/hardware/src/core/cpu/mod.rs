//! Core Definition and Initialization.
//!
//! This module defines the `Core` structure, the container for one Rigel core's pipeline
//! state. It coordinates the following:
//! 1. **Thread Contexts:** Registers, scoreboards, BTBs and control flags per hardware thread.
//! 2. **Pipeline State:** The token arena and the `latches` / `nlatches` matrices.
//! 3. **Shared Resources:** Functional units time-shared by every thread of the core.
//! 4. **Diagnostics:** The bounded retirement trace and `dump_state`.

/// Per-cycle orchestration: stage sweep, latch update, flushes.
pub mod execution;

/// Hardware thread context.
pub mod thread;

use std::collections::VecDeque;
use std::fmt::Write as _;

pub use self::thread::ThreadContext;
use crate::config::Config;
use crate::core::pipeline::arena::{InstrArena, InstrId};
use crate::core::pipeline::commit::{CommitPolicy, CommitTracker};
use crate::core::pipeline::instr::InstrNumber;
use crate::core::pipeline::latches::{LatchMatrix, PipeStage};
use crate::core::units::fu::FunctionalUnitPool;

/// One retirement, kept for post-mortem dumps and ordering checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetireRecord {
    /// Retiring thread.
    pub thread: usize,
    /// Instruction number.
    pub number: InstrNumber,
    /// Program counter.
    pub pc: u32,
    /// Global cycle of retirement.
    pub cycle: u64,
}

/// The group Fetch is building this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchCursor {
    /// Thread being fetched.
    pub thread: usize,
    /// Address of the next instruction of the group.
    pub pc: u32,
    /// Lanes the group may fill.
    pub lanes: usize,
    /// No further lane may be filled.
    pub ended: bool,
    /// The group started from a fix-up address.
    pub used_fixup: bool,
    /// The group contains a serializing instruction.
    pub serializing: bool,
}

/// A fetched group waiting for the latch update to commit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    /// Thread fetched.
    pub thread: usize,
    /// Address the thread continues from.
    pub next_pc: u32,
    /// The group consumed the thread's fix-up.
    pub used_fixup: bool,
    /// The group ends in a serializing instruction.
    pub serializing: bool,
}

/// One Rigel core.
#[derive(Debug)]
pub struct Core {
    /// Core index.
    pub id: usize,
    /// Cluster index.
    pub cluster: usize,
    /// Issue width.
    pub width: usize,
    /// Hardware threads.
    pub threads: Vec<ThreadContext>,
    /// Owner of every live token.
    pub arena: InstrArena,
    /// Committed stage inputs.
    pub latches: LatchMatrix,
    /// Stage outputs of the current cycle.
    pub nlatches: LatchMatrix,
    /// Functional unit availability for this cycle.
    pub fus: FunctionalUnitPool,
    /// Retirement order policy.
    pub commit: CommitTracker,
    /// Memory operations parked off the latch path.
    pub memory_ops: Vec<InstrId>,
    /// Parked operations that completed and wait for a WriteBack slot.
    pub memory_done: VecDeque<InstrId>,
    /// Group under construction in Fetch.
    pub fetch_cursor: Option<FetchCursor>,
    /// Group fetched this cycle.
    pub pending_fetch: Option<PendingFetch>,
    /// Thread of the last committed fetch group.
    pub last_fetch_thread: usize,
    /// Stages with at least one stalled lane this cycle.
    pub stage_stalled: [bool; PipeStage::COUNT],
    /// Thread whose memory or task-queue wait stalled the highest such stage this cycle.
    pub external_wait: Option<usize>,
    /// Most recent retirements, oldest first.
    pub retire_trace: VecDeque<RetireRecord>,
    retire_trace_depth: usize,
}

impl Core {
    /// Builds core `id` with every thread starting at `entry`.
    pub fn new(config: &Config, id: usize, entry: u32) -> Self {
        let threads = config.system.threads_per_core;
        Self {
            id,
            cluster: config.cluster_of(id),
            width: config.pipeline.issue_width,
            threads: (0..threads)
                .map(|t| ThreadContext::new(config, id, t, entry))
                .collect(),
            arena: InstrArena::new(config.pipeline.instr_arena_size),
            latches: LatchMatrix::new(),
            nlatches: LatchMatrix::new(),
            fus: FunctionalUnitPool::new(&config.pipeline.functional_units),
            commit: CommitTracker::new(
                CommitPolicy::for_memory_mode(config.pipeline.non_blocking_memory),
                threads,
            ),
            memory_ops: Vec::new(),
            memory_done: VecDeque::new(),
            fetch_cursor: None,
            pending_fetch: None,
            last_fetch_thread: threads.saturating_sub(1),
            stage_stalled: [false; PipeStage::COUNT],
            external_wait: None,
            retire_trace: VecDeque::new(),
            retire_trace_depth: config.general.retire_trace_depth,
        }
    }

    /// Whether every thread has halted.
    pub fn is_halted(&self) -> bool {
        self.threads.iter().all(|t| t.halted)
    }

    /// Instructions retired by every thread.
    pub fn retired(&self) -> u64 {
        self.threads.iter().map(|t| t.retired).sum()
    }

    /// Hardware thread `t`.
    pub fn thread(&self, t: usize) -> Option<&ThreadContext> {
        self.threads.get(t)
    }

    /// Tokens currently alive in the core.
    pub fn in_flight(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn record_retire(&mut self, record: RetireRecord) {
        if self.retire_trace_depth == 0 {
            return;
        }
        while self.retire_trace.len() >= self.retire_trace_depth {
            let _ = self.retire_trace.pop_front();
        }
        self.retire_trace.push_back(record);
    }

    fn describe(&self, id: InstrId) -> String {
        self.arena
            .get(id)
            .map_or_else(|_| format!("<stale {}>", id.index()), ToString::to_string)
    }

    /// Renders registers, scoreboards, latches, speculative rings and the retirement trace.
    pub fn dump_state(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== core {} (cluster {}) ===", self.id, self.cluster);
        for t in &self.threads {
            let _ = writeln!(
                out,
                "thread {} pc={:#010x} halted={} serializing={} sync_req={} switched_out={} load_pending={:?} retired={} watchdog={}",
                t.id,
                t.fetch_pc(),
                t.halted,
                t.serializing,
                t.sync_req,
                t.switched_out,
                t.load_pending,
                t.retired,
                t.watchdog
            );
            let _ = writeln!(out, "  regs:{}", t.regs.dump());
            let _ = write!(out, "{}", t.scoreboard.dump());
            for id in t.ring.iter() {
                let _ = writeln!(out, "  ring: {}", self.describe(id));
            }
        }
        for stage in PipeStage::ALL {
            for lane in 0..self.width {
                if let Some(id) = self.latches.get(stage, lane) {
                    let _ = writeln!(out, "  {stage}[{lane}]: {}", self.describe(id));
                }
            }
        }
        for id in &self.memory_ops {
            let _ = writeln!(out, "  parked: {}", self.describe(*id));
        }
        for r in &self.retire_trace {
            let _ = writeln!(
                out,
                "  retired #{} t{} pc={:#010x} @{}",
                r.number, r.thread, r.pc, r.cycle
            );
        }
        out
    }
}
