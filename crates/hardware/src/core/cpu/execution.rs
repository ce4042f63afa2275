//! Per-Cycle Orchestration.
//!
//! This module drives one core through one global cycle. It performs the following:
//! 1. **Stage Sweep:** Calls every stage once per lane in pipeline order, enforcing the
//!    lane-ordering rule within a stage.
//! 2. **Latch Update:** Moves `nlatches` into `latches`, stopping propagation at the
//!    highest stalled stage, and commits or discards the group Fetch produced.
//! 3. **Flushes:** Squashes wrong-path and switched-out tokens, releasing their
//!    scoreboard claims.
//! 4. **Non-Blocking Memory:** Polls parked memory operations and re-inserts completed
//!    ones at WriteBack.
//! 5. **End of Cycle:** `sync` rendezvous and the per-thread deadlock watchdog.

use tracing::{debug, trace};

use super::Core;
use crate::common::error::SimError;
use crate::core::pipeline::arena::InstrId;
use crate::core::pipeline::instr::InstrNumber;
use crate::core::pipeline::latches::{LatchMatrix, PipeStage};
use crate::core::pipeline::stages::{
    CcAccess, Decode, Execute, Fetch, FpComplete, Memory, WriteBack, poll_access,
};
use crate::core::pipeline::traits::{PipelineStage, StepResult};
use crate::isa::Opcode;
use crate::sim::SimContext;
use crate::stats::Stat;

impl Core {
    /// Advances the core by one cycle.
    ///
    /// # Errors
    ///
    /// Any fatal condition raised by a stage, the scoreboard or the watchdog.
    pub fn per_cycle(&mut self, ctx: &mut SimContext) -> Result<(), SimError> {
        self.fus.reset();
        self.stage_stalled = [false; PipeStage::COUNT];
        self.external_wait = None;
        self.nlatches = LatchMatrix::new();
        self.pending_fetch = None;
        self.fetch_cursor = None;
        for t in &mut self.threads {
            t.retired_this_cycle = false;
        }

        self.poll_memory_ops(ctx)?;

        self.run_stage::<Fetch>(ctx)?;
        self.run_stage::<Decode>(ctx)?;
        self.run_stage::<Execute>(ctx)?;
        self.run_stage::<Memory>(ctx)?;
        self.run_stage::<FpComplete>(ctx)?;
        self.run_stage::<CcAccess>(ctx)?;
        self.run_stage::<WriteBack>(ctx)?;

        self.update_latches(ctx)?;
        self.reinsert_completed();
        self.end_of_cycle(ctx)
    }

    fn run_stage<S: PipelineStage>(&mut self, ctx: &mut SimContext) -> Result<(), SimError> {
        let mut blocked = false;
        for lane in 0..self.width {
            if blocked {
                if let Some(id) = self.latches.get(S::STAGE, lane) {
                    ctx.stats.inc(Stat::StallLaneOrder);
                    if let Ok(token) = self.arena.get_mut(id) {
                        token.flags.stalled = true;
                    }
                }
                continue;
            }
            match S::update(self, ctx, lane)? {
                StepResult::Bubble => {}
                StepResult::Completed(id) => {
                    if let Some(next) = S::STAGE.next() {
                        self.nlatches.set(next, lane, Some(id));
                    }
                }
                StepResult::Stalled(cause) => {
                    blocked = true;
                    self.stage_stalled[S::STAGE.index()] = true;
                    ctx.stats.inc(cause.stat());
                    if let Some(id) = self.latches.get(S::STAGE, lane) {
                        if let Ok(token) = self.arena.get_mut(id) {
                            token.flags.stalled = true;
                            if cause.is_external_wait() {
                                self.external_wait = Some(token.thread);
                            }
                            trace!(core = self.id, stage = %S::STAGE, lane, ?cause, "{token}");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Highest stage that stalled this cycle, if any.
    fn highest_stall(&self) -> Option<PipeStage> {
        PipeStage::ALL
            .iter()
            .rev()
            .copied()
            .find(|s| self.stage_stalled[s.index()])
    }

    fn update_latches(&mut self, ctx: &mut SimContext) -> Result<(), SimError> {
        let stall = self.highest_stall();
        match stall {
            None => {
                for stage in PipeStage::ALL.into_iter().skip(1) {
                    self.latches.copy_stage(&self.nlatches, stage);
                }
            }
            Some(h) => {
                for stage in PipeStage::ALL.into_iter().skip(h.index() + 1) {
                    self.latches.copy_stage(&self.nlatches, stage);
                }
                // Lanes of the stalled stage that completed have moved on.
                if let Some(next) = h.next() {
                    for lane in 0..self.width {
                        let advanced = self.nlatches.get(next, lane);
                        if advanced.is_some() && self.latches.get(h, lane) == advanced {
                            self.latches.set(h, lane, None);
                        }
                    }
                }
            }
        }

        for id in self.latches.stage_ids(PipeStage::Mem).collect::<Vec<_>>() {
            let thread = self.arena.get(id)?.thread;
            let _ = self.threads[thread].ring.remove(id);
        }

        if matches!(stall, None | Some(PipeStage::Fetch)) {
            self.commit_fetch()?;
        } else {
            let fresh: Vec<InstrId> = self.nlatches.stage_ids(PipeStage::Decode).collect();
            if !fresh.is_empty() {
                ctx.stats.add(Stat::FetchDiscarded, fresh.len() as u64);
                for id in fresh {
                    self.arena.free(id)?;
                }
            }
        }
        Ok(())
    }

    fn commit_fetch(&mut self) -> Result<(), SimError> {
        let Some(fetch) = self.pending_fetch.take() else {
            return Ok(());
        };
        let ids: Vec<InstrId> = self.latches.stage_ids(PipeStage::Decode).collect();
        let thread = &mut self.threads[fetch.thread];
        for id in ids {
            if self.arena.get(id)?.thread == fetch.thread && !thread.ring.iter().any(|r| r == id) {
                thread.ring.push_back(id)?;
            }
        }
        thread.pc = fetch.next_pc;
        if fetch.used_fixup {
            thread.signals.clear();
        }
        if fetch.serializing {
            thread.serializing = true;
        }
        self.last_fetch_thread = fetch.thread;
        Ok(())
    }

    fn poll_memory_ops(&mut self, ctx: &mut SimContext) -> Result<(), SimError> {
        let parked = std::mem::take(&mut self.memory_ops);
        for id in parked {
            poll_access(self, ctx, id)?;
            if self.arena.get(id)?.flags.done_cc_access {
                trace!(core = self.id, "parked access complete: {}", self.arena.get(id)?);
                self.memory_done.push_back(id);
            } else {
                self.memory_ops.push(id);
            }
        }
        Ok(())
    }

    fn reinsert_completed(&mut self) {
        for lane in 0..self.width {
            if self.memory_done.is_empty() {
                break;
            }
            if self.latches.get(PipeStage::WriteBack, lane).is_none() {
                let id = self.memory_done.pop_front();
                self.latches.set(PipeStage::WriteBack, lane, id);
            }
        }
    }

    /// Removes `id` from every structure that refers to it and frees it.
    ///
    /// Destinations acquired at Execute are released, and locks still held are cleared.
    pub(crate) fn squash(&mut self, id: InstrId, ctx: &mut SimContext) -> Result<(), SimError> {
        let _ = self.latches.remove(id);
        let _ = self.nlatches.remove(id);
        self.memory_ops.retain(|m| *m != id);
        let token = self.arena.free(id)?;
        let thread = &mut self.threads[token.thread];
        let _ = thread.ring.remove(id);
        if token.flags.done_execute {
            let scalar = thread.regs.scalar_len();
            for dst in token.dst_slots() {
                let slot = dst.reg.slot(scalar);
                if token.flags.has_reg_lock && thread.scoreboard.is_locked(slot) {
                    thread.scoreboard.unlock(slot)?;
                }
                thread.scoreboard.release(slot)?;
            }
            if matches!(token.op(), Opcode::Mtsr | Opcode::TqDeq) {
                thread.pending_spr_writes = thread.pending_spr_writes.saturating_sub(1);
            }
        }
        if token.op().is_serializing() {
            thread.serializing = false;
        }
        ctx.stats.inc(Stat::InstrFlushed);
        debug!(core = self.id, "squash {token}");
        Ok(())
    }

    /// Squashes every token of `thread` younger than `number`, including the group fetched
    /// this cycle.
    pub(crate) fn squash_younger(
        &mut self,
        ctx: &mut SimContext,
        thread: usize,
        number: InstrNumber,
    ) -> Result<(), SimError> {
        let mut victims: Vec<InstrId> = self.threads[thread].ring.iter().collect();
        victims.extend(self.nlatches.stage_ids(PipeStage::Decode));
        for id in victims {
            let Ok(token) = self.arena.get(id) else {
                continue;
            };
            if token.thread == thread && token.number > number {
                self.squash(id, ctx)?;
            }
        }
        if self.pending_fetch.is_some_and(|f| f.thread == thread) {
            self.pending_fetch = None;
        }
        Ok(())
    }

    /// Deschedules `thread` after a data cache miss.
    ///
    /// Every token of the thread that has not reached Mem is squashed and fetch resumes
    /// from the oldest of them once the miss is serviced.
    pub(crate) fn switch_out(&mut self, ctx: &mut SimContext, thread: usize) -> Result<(), SimError> {
        let mut victims: Vec<InstrId> = self.threads[thread].ring.iter().collect();
        victims.extend(self.nlatches.stage_ids(PipeStage::Decode));
        let mut oldest: Option<(InstrNumber, u32)> = None;
        for id in victims {
            let Ok(token) = self.arena.get(id) else {
                continue;
            };
            if token.thread != thread {
                continue;
            }
            if oldest.is_none_or(|(n, _)| token.number < n) {
                oldest = Some((token.number, token.pc));
            }
            self.squash(id, ctx)?;
        }
        if self.pending_fetch.is_some_and(|f| f.thread == thread) {
            self.pending_fetch = None;
        }
        let t = &mut self.threads[thread];
        if let Some((_, pc)) = oldest {
            t.signals.redirect(pc);
        }
        t.switched_out = true;
        debug!(core = self.id, thread, resume = t.fetch_pc(), "switch out on miss");
        Ok(())
    }

    fn end_of_cycle(&mut self, ctx: &mut SimContext) -> Result<(), SimError> {
        let live = self.threads.iter().filter(|t| !t.halted);
        let mut any = false;
        let mut all = true;
        for t in live {
            any = true;
            all &= t.sync_req;
        }
        if any && all {
            for t in &mut self.threads {
                t.sync_req = false;
                t.serializing = false;
            }
            ctx.stats.inc(Stat::SyncRendezvous);
            debug!(core = self.id, cycle = ctx.cycle, "sync rendezvous");
        }

        // Threads queued behind another thread's memory or task-queue wait cannot fetch
        // or retire; only the waiting thread is held to the watchdog.
        let reset = ctx.config.general.watchdog_cycles;
        let held_by = self.external_wait;
        for t in &mut self.threads {
            let behind_wait = held_by.is_some_and(|owner| owner != t.id);
            if t.retired_this_cycle || behind_wait {
                t.watchdog = reset;
            }
            if !t.watched() || behind_wait {
                continue;
            }
            t.watchdog = t.watchdog.saturating_sub(1);
            if t.watchdog == 0 {
                return Err(SimError::Deadlock {
                    core: self.id,
                    thread: t.id,
                    pc: t.fetch_pc(),
                    cycle: ctx.cycle,
                });
            }
        }
        Ok(())
    }
}
