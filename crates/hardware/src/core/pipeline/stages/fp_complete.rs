//! Floating-Point Completion (FPC) Stage.
//!
//! Holds floating-point results until their configured latency has elapsed. Only active in
//! multi-cycle ALU mode; otherwise every token passes straight through.

use crate::common::error::SimError;
use crate::core::cpu::Core;
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StallCause, StepResult};
use crate::sim::SimContext;

/// FPComplete stage.
#[derive(Debug)]
pub struct FpComplete;

impl PipelineStage for FpComplete {
    const STAGE: PipeStage = PipeStage::FpComplete;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.get(PipeStage::FpComplete, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.get(id)?;
        if ctx.config.pipeline.multi_cycle_alu && token.class().is_fp() && ctx.cycle < token.ready_cycle {
            return Ok(StepResult::Stalled(StallCause::FpLatency));
        }
        Ok(StepResult::Completed(id))
    }
}
