//! Writeback (WB) Stage.
//!
//! This module implements the final stage of the pipeline. It performs the following:
//! 1. **Ordering:** Reports each retirement to the core's commit policy.
//! 2. **Register Commit:** Writes destination values into the register file, clears any
//!    lock still held and releases every scoreboard claim.
//! 3. **Side Effects:** SPR writes, task-queue status, halt, `sync` requests and debug
//!    instructions.
//! 4. **Accounting:** Instruction mix, retirement counters and the retirement trace.
//!
//! An undefined instruction reaching this stage is fatal.

use tracing::{debug, trace};

use crate::common::constants::SPR_TQ_STATUS;
use crate::common::error::SimError;
use crate::core::cpu::{Core, RetireRecord};
use crate::core::pipeline::instr::RegRef;
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StepResult};
use crate::isa::{OpClass, Opcode};
use crate::sim::SimContext;
use crate::stats::Stat;

/// WriteBack stage.
#[derive(Debug)]
pub struct WriteBack;

/// Instruction-mix counter of a retired class.
fn mix_stat(class: OpClass) -> Stat {
    match class {
        OpClass::IntAlu | OpClass::Shift | OpClass::Mul | OpClass::Compare => Stat::RetiredAlu,
        OpClass::Fp | OpClass::FpLong => Stat::RetiredFp,
        OpClass::Vector | OpClass::VectorFp | OpClass::VectorMem => Stat::RetiredVector,
        OpClass::Branch | OpClass::Jump => Stat::RetiredBranch,
        OpClass::Load => Stat::RetiredLoad,
        OpClass::Store => Stat::RetiredStore,
        OpClass::GlobalLoad | OpClass::GlobalStore | OpClass::Broadcast => Stat::RetiredGlobal,
        OpClass::Atomic => Stat::RetiredAtomic,
        OpClass::TaskQueue => Stat::RetiredTaskQueue,
        OpClass::Syscall => Stat::RetiredSyscall,
        _ => Stat::RetiredOther,
    }
}

impl PipelineStage for WriteBack {
    const STAGE: PipeStage = PipeStage::WriteBack;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.take(PipeStage::WriteBack, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.free(id)?;
        let op = token.op();
        if op == Opcode::Undef {
            return Err(SimError::UndefinedInstruction {
                core: core.id,
                thread: token.thread,
                pc: token.pc,
            });
        }
        if core.commit.on_retire(token.thread, token.number)? {
            ctx.stats.inc(Stat::OutOfOrderRetire);
        }

        let thread = &mut core.threads[token.thread];
        let scalar = thread.regs.scalar_len();
        for dst in token.dst_slots() {
            match dst.reg {
                RegRef::Scalar(r) => thread.regs.write(usize::from(r), dst.value)?,
                RegRef::VectorLane { reg, lane } => {
                    thread
                        .regs
                        .write_vector_lane(usize::from(reg), usize::from(lane), dst.value)?;
                }
            }
            let slot = dst.reg.slot(scalar);
            if token.flags.has_reg_lock && thread.scoreboard.is_locked(slot) {
                thread.scoreboard.unlock(slot)?;
            }
            thread.scoreboard.release(slot)?;
        }

        match op {
            Opcode::Mtsr => {
                thread.sprs.write(token.inst.imm as u32, token.src(0));
                thread.pending_spr_writes = thread.pending_spr_writes.saturating_sub(1);
            }
            Opcode::TqDeq => {
                let status = token.tq_status.map_or(0, |s| s.status_code());
                thread.sprs.write(SPR_TQ_STATUS, status);
                thread.pending_spr_writes = thread.pending_spr_writes.saturating_sub(1);
            }
            Opcode::Sync => thread.sync_req = true,
            Opcode::Syscall => thread.serializing = false,
            Opcode::Brk => ctx.stats.inc(Stat::Breakpoints),
            Opcode::Event => ctx.stats.inc(Stat::Events),
            Opcode::Printreg => {
                let reg = token.inst.rs;
                ctx.syscalls
                    .write_output(&format!("r{reg} = {:#x}\n", token.src(0)));
            }
            _ => {}
        }
        if op == Opcode::Hlt || token.exit_thread {
            thread.halted = true;
            thread.serializing = false;
            ctx.stats.inc(Stat::ThreadsHalted);
            debug!(core = core.id, thread = token.thread, cycle = ctx.cycle, "thread halted");
        }

        thread.retired += 1;
        thread.retired_this_cycle = true;
        ctx.stats.inc(Stat::InstrRetired);
        ctx.stats.inc(mix_stat(token.class()));
        trace!(core = core.id, lane, cycle = ctx.cycle, "WB  {token}");
        core.record_retire(RetireRecord {
            thread: token.thread,
            number: token.number,
            pc: token.pc,
            cycle: ctx.cycle,
        });
        Ok(StepResult::Bubble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_buckets() {
        assert_eq!(mix_stat(OpClass::Shift), Stat::RetiredAlu);
        assert_eq!(mix_stat(OpClass::VectorMem), Stat::RetiredVector);
        assert_eq!(mix_stat(OpClass::Broadcast), Stat::RetiredGlobal);
        assert_eq!(mix_stat(OpClass::Halt), Stat::RetiredOther);
    }
}
