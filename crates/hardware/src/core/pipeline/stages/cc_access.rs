//! Cache Completion (CC) Stage.
//!
//! Second half of every data access that missed in Mem. It performs the following:
//! 1. **Completion Polling:** Re-issues the access to the cache model each cycle until it
//!    reports `NoStall`; the result is then published on the bypass network.
//! 2. **Non-Blocking Mode:** A still-stalled access leaves the latch path for the core's
//!    side list and rejoins at WriteBack when it completes, possibly out of program order.

use tracing::debug;

use super::memory::poll_access;
use crate::common::error::SimError;
use crate::core::cpu::Core;
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StallCause, StepResult};
use crate::sim::SimContext;
use crate::stats::Stat;

/// CCacheAccess stage.
#[derive(Debug)]
pub struct CcAccess;

impl PipelineStage for CcAccess {
    const STAGE: PipeStage = PipeStage::CcAccess;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.get(PipeStage::CcAccess, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.get(id)?;
        if token.flags.done_cc_access || !token.flags.mem_outstanding {
            return Ok(StepResult::Completed(id));
        }

        let stall = poll_access(core, ctx, id)?;
        if !stall.is_stall() {
            return Ok(StepResult::Completed(id));
        }
        if ctx.config.pipeline.non_blocking_memory {
            let _ = core.latches.take(PipeStage::CcAccess, lane);
            core.memory_ops.push(id);
            let token = core.arena.get_mut(id)?;
            token.flags.parked = true;
            ctx.stats.inc(Stat::NonBlockingParked);
            debug!(core = core.id, ?stall, "parked {token}");
            return Ok(StepResult::Bubble);
        }
        Ok(StepResult::Stalled(StallCause::Memory(stall)))
    }
}
