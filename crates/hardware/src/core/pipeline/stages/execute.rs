//! Execute (EX) Stage.
//!
//! This module implements the third stage of the pipeline. It performs the following:
//! 1. **Hazard Checks:** Sources must pass the scoreboard, destinations must not be locked
//!    by an older long-latency producer, and the thread must not be draining.
//! 2. **Structural Checks:** Claims a functional unit of the instruction's class for this
//!    cycle; vector operations occupy Execute for several cycles.
//! 3. **Computation:** ALU, FPU, per-lane vector, SPR reads, effective addresses and
//!    branch resolution.
//! 4. **Scoreboard Acquisition:** Destinations become bypass-readable, or are locked when
//!    their value only arrives from memory.
//! 5. **Misprediction Recovery:** On a wrong prediction, squashes every younger token of
//!    the thread and redirects Fetch.

use tracing::{debug, trace};

use crate::common::constants::{INSTRUCTION_BYTES, SPR_CYCLE, VECTOR_LANES};
use crate::common::error::SimError;
use crate::core::cpu::Core;
use crate::core::pipeline::arena::InstrId;
use crate::core::pipeline::instr::{InstrToken, RegRef};
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StallCause, StepResult};
use crate::core::units::alu::Alu;
use crate::core::units::bru::Bru;
use crate::core::units::fpu::Fpu;
use crate::core::units::lsu::Lsu;
use crate::isa::opcode::Format;
use crate::isa::{OpClass, Opcode};
use crate::sim::SimContext;
use crate::stats::Stat;

/// Execute stage.
#[derive(Debug)]
pub struct Execute;

impl PipelineStage for Execute {
    const STAGE: PipeStage = PipeStage::Execute;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.get(PipeStage::Execute, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.get_mut(id)?;
        if token.flags.done_execute {
            return Ok(StepResult::Completed(id));
        }
        let thread = &mut core.threads[token.thread];
        let scalar = thread.regs.scalar_len();
        let now = ctx.cycle;

        if thread.scoreboard.is_draining() {
            return Ok(StepResult::Stalled(StallCause::Drain));
        }
        for src in token.src_slots() {
            if !thread.scoreboard.check(src.reg.slot(scalar), now)? {
                return Ok(StepResult::Stalled(StallCause::RegDependency));
            }
        }
        if token.op() == Opcode::Mfsr && thread.pending_spr_writes > 0 {
            return Ok(StepResult::Stalled(StallCause::Spr));
        }
        if token
            .dst_slots()
            .any(|d| thread.scoreboard.is_locked(d.reg.slot(scalar)))
        {
            return Ok(StepResult::Stalled(StallCause::Waw));
        }
        let class = token.class();
        let fu = class.fu_class();
        if !core.fus.try_claim(fu) {
            return Ok(StepResult::Stalled(StallCause::Fu(fu)));
        }
        if token.vec_remaining > 1 {
            token.vec_remaining -= 1;
            return Ok(StepResult::Stalled(StallCause::Vector));
        }
        token.vec_remaining = 0;

        read_operands(token, thread)?;
        compute(token, thread, ctx)?;

        let latency = class.latency(&ctx.config.latency);
        let locked = token.acquires_locked();
        for dst in token.dst_slots() {
            let slot = dst.reg.slot(scalar);
            if locked {
                thread.scoreboard.acquire_locked(slot)?;
            } else {
                thread.scoreboard.acquire(slot, dst.value, now, latency)?;
            }
        }
        token.flags.has_reg_lock = locked && token.dst_slots().next().is_some();
        if matches!(token.op(), Opcode::Mtsr | Opcode::TqDeq) {
            thread.pending_spr_writes += 1;
        }

        let fallthrough = token.pc.wrapping_add(INSTRUCTION_BYTES);
        if class.is_control() {
            ctx.stats.inc(Stat::BranchResolved);
        }
        if token.next_pc != fallthrough {
            thread.btb.update(token.pc, token.next_pc, now);
        } else if token.predicted_pc != fallthrough {
            thread.btb.penalize(token.pc);
        }

        token.execute_cycle = now;
        token.ready_cycle = now + latency;
        token.flags.done_execute = true;
        trace!(core = core.id, lane, next = token.next_pc, "EX  {token}");

        if token.next_pc != token.predicted_pc {
            token.flags.mispredict = true;
            let (t, number, target) = (token.thread, token.number, token.next_pc);
            recover(core, ctx, id, t, number, target)?;
        }
        Ok(StepResult::Completed(id))
    }
}

/// Reads every source slot from the bypass network or the register file.
fn read_operands(token: &mut InstrToken, thread: &crate::core::cpu::ThreadContext) -> Result<(), SimError> {
    let scalar = thread.regs.scalar_len();
    for src in token.srcs.iter_mut().flatten() {
        let slot = src.reg.slot(scalar);
        src.value = if thread.scoreboard.bypassed(slot) {
            thread.scoreboard.forward(slot)
        } else {
            match src.reg {
                RegRef::Scalar(r) => thread.regs.read(usize::from(r))?,
                RegRef::VectorLane { reg, lane } => thread.regs.read_vector(usize::from(reg))?[usize::from(lane)],
            }
        };
    }
    token.flags.done_regaccess = true;
    Ok(())
}

/// Scalar opcode applied to each lane of a vector arithmetic opcode.
fn lane_op(op: Opcode) -> Opcode {
    match op {
        Opcode::Vadd => Opcode::Add,
        Opcode::Vsub => Opcode::Sub,
        Opcode::Vaddi => Opcode::Addi,
        Opcode::Vfadd => Opcode::Fadd,
        Opcode::Vfsub => Opcode::Fsub,
        Opcode::Vfmul => Opcode::Fmul,
        other => other,
    }
}

fn compute(
    token: &mut InstrToken,
    thread: &crate::core::cpu::ThreadContext,
    ctx: &SimContext,
) -> Result<(), SimError> {
    let op = token.op();
    let imm = token.inst.imm as u32;
    let fallthrough = token.pc.wrapping_add(INSTRUCTION_BYTES);
    token.next_pc = fallthrough;
    match token.class() {
        OpClass::IntAlu | OpClass::Shift | OpClass::Mul | OpClass::Compare => {
            let b = match op.format() {
                Format::Ri | Format::RdImm => imm,
                _ => token.src(1),
            };
            let v = Alu::execute(op, token.src(0), b);
            token.set_dst_values(&[v]);
        }
        OpClass::Fp | OpClass::FpLong => {
            let v = Fpu::execute(op, token.src(0), token.src(1), token.src(2));
            token.set_dst_values(&[v]);
        }
        OpClass::Vector | OpClass::VectorFp => {
            let scalar_op = lane_op(op);
            let mut out = [0u32; VECTOR_LANES];
            for (lane, v) in out.iter_mut().enumerate() {
                *v = match op {
                    Opcode::Vsplat => token.src(0),
                    Opcode::Vaddi => Alu::execute(scalar_op, token.src(lane), imm),
                    _ if op.class() == OpClass::VectorFp => {
                        Fpu::execute(scalar_op, token.src(lane), token.src(VECTOR_LANES + lane), 0)
                    }
                    _ => Alu::execute(scalar_op, token.src(lane), token.src(VECTOR_LANES + lane)),
                };
            }
            token.set_dst_values(&out);
        }
        OpClass::Branch | OpClass::Jump => {
            let r = Bru::resolve(op, token.pc, token.src(0), token.src(1), imm);
            token.next_pc = r.next_pc;
            if op.links() {
                token.set_dst_values(&[fallthrough]);
            }
        }
        OpClass::Atomic => {
            token.addr = token.src(0);
            Lsu::check_alignment(op, token.pc, token.addr)?;
        }
        OpClass::Load
        | OpClass::Store
        | OpClass::GlobalLoad
        | OpClass::GlobalStore
        | OpClass::Broadcast
        | OpClass::Prefetch
        | OpClass::CacheLine
        | OpClass::VectorMem => {
            token.addr = Lsu::effective_address(token.src(0), imm);
            Lsu::check_alignment(op, token.pc, token.addr)?;
        }
        OpClass::Spr if op == Opcode::Mfsr => {
            let v = if imm == SPR_CYCLE {
                ctx.cycle as u32
            } else {
                thread.sprs.read(imm)
            };
            token.set_dst_values(&[v]);
        }
        _ => {}
    }
    Ok(())
}

/// Squashes the wrong path behind `branch` and points Fetch at `target`.
fn recover(
    core: &mut Core,
    ctx: &mut SimContext,
    branch: InstrId,
    thread: usize,
    number: u64,
    target: u32,
) -> Result<(), SimError> {
    ctx.stats.inc(Stat::BranchMispredict);
    debug!(core = core.id, thread, number, target, "mispredict");
    core.squash_younger(ctx, thread, number)?;
    let t = &mut core.threads[thread];
    t.signals.redirect(target);
    if ctx.config.pipeline.drain_on_mispredict {
        t.scoreboard.begin_drain();
        ctx.stats.inc(Stat::ScoreboardDrains);
    }
    trace!(core = core.id, ?branch, "fix-up scheduled");
    Ok(())
}
