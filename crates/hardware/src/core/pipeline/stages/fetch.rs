//! Instruction Fetch (IF) Stage.
//!
//! This module implements the first stage of the pipeline. It performs the following:
//! 1. **Thread Selection:** Picks the hardware thread to fetch for (round-robin, or stay on
//!    the current thread until it misses).
//! 2. **Instruction Cache:** Polls the cache model; a stall leaves the group empty.
//! 3. **Group Formation:** Up to `issue_width` sequential instructions, cut short at an
//!    unaligned start, a BTB hit or a serializing instruction.
//! 4. **Prediction:** Looks up each pc in the thread's BTB to choose the next fetch pc.
//!
//! Tokens created here are not committed to the thread until the latch update accepts the
//! group; a group rejected because Decode held is discarded and fetched again.

use tracing::trace;

use crate::common::constants::{FETCH_GROUP_BYTES, INSTRUCTION_BYTES};
use crate::common::error::SimError;
use crate::config::ThreadSwitchPolicy;
use crate::core::cpu::{Core, FetchCursor, PendingFetch};
use crate::core::pipeline::instr::InstrToken;
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StallCause, StepResult};
use crate::sim::SimContext;
use crate::soc::AccessRequest;
use crate::stats::Stat;

/// Fetch stage.
#[derive(Debug)]
pub struct Fetch;

impl PipelineStage for Fetch {
    const STAGE: PipeStage = PipeStage::Fetch;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        if lane == 0 {
            let Some(thread) = select_thread(core, ctx) else {
                return Ok(StepResult::Bubble);
            };
            let pc = core.threads[thread].fetch_pc();
            let req = AccessRequest {
                instr: ctx.instr_counter,
                core: core.id,
                cluster: core.cluster,
                thread,
                addr: pc,
                cycle: ctx.cycle,
            };
            let stall = ctx.cache.icache_access(&req);
            if stall.is_stall() {
                return Ok(StepResult::Stalled(StallCause::Icache(stall)));
            }
            let lanes = if core.width > 1 && pc % FETCH_GROUP_BYTES != 0 {
                ctx.stats.inc(Stat::UnalignedFetch);
                1
            } else {
                core.width
            };
            core.fetch_cursor = Some(FetchCursor {
                thread,
                pc,
                lanes,
                ended: false,
                used_fixup: core.threads[thread].signals.fixup_needed,
                serializing: false,
            });
        }

        let Some(mut cursor) = core.fetch_cursor else {
            return Ok(StepResult::Bubble);
        };
        if cursor.ended || lane >= cursor.lanes {
            return Ok(StepResult::Bubble);
        }

        let pc = cursor.pc;
        let inst = ctx.program.fetch(pc);
        let thread = &mut core.threads[cursor.thread];
        let predicted = match thread.btb.lookup(pc, ctx.cycle) {
            Some(target) => {
                ctx.stats.inc(Stat::BtbHit);
                cursor.ended = true;
                target
            }
            None => {
                ctx.stats.inc(Stat::BtbMiss);
                pc.wrapping_add(INSTRUCTION_BYTES)
            }
        };
        if inst.op.is_serializing() {
            cursor.ended = true;
            cursor.serializing = true;
        }

        let mut token = InstrToken::new(ctx.instr_counter, core.id, cursor.thread, pc, inst);
        token.predicted_pc = predicted;
        token.next_pc = predicted;
        token.fetch_cycle = ctx.cycle;
        ctx.instr_counter += 1;
        trace!(core = core.id, lane, "IF  {token}");
        let id = core.arena.alloc(token)?;
        ctx.stats.inc(Stat::InstrFetched);

        cursor.pc = predicted;
        core.fetch_cursor = Some(cursor);
        core.pending_fetch = Some(PendingFetch {
            thread: cursor.thread,
            next_pc: predicted,
            used_fixup: cursor.used_fixup,
            serializing: cursor.serializing,
        });
        Ok(StepResult::Completed(id))
    }
}

/// Chooses the thread to fetch for this cycle.
fn select_thread(core: &mut Core, ctx: &mut SimContext) -> Option<usize> {
    let n = core.threads.len();
    let last = core.last_fetch_thread;
    let pick = match ctx.config.pipeline.thread_switch {
        ThreadSwitchPolicy::SwitchOnMiss if core.threads[last].can_fetch() => Some(last),
        _ => (1..=n)
            .map(|i| (last + i) % n)
            .find(|&t| core.threads[t].can_fetch()),
    };
    if ctx.config.pipeline.thread_switch == ThreadSwitchPolicy::SwitchOnMiss {
        if let Some(t) = pick {
            if t != last && n > 1 {
                ctx.stats.inc(Stat::ThreadSwitches);
            }
        }
    }
    pick
}

