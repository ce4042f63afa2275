//! Instruction Decode (DE) Stage.
//!
//! This module implements the second stage of the pipeline. It performs the following:
//! 1. **Operand Slots:** Expands the instruction's register fields into source and
//!    destination slots according to its format (vector operands fan out to four lanes).
//! 2. **Range Checks:** Rejects register indices beyond the configured register files.
//! 3. **Tagging:** Marks float operands, vector operations and the vector lane countdown.
//!
//! Decode never stalls on its own; it only inherits stalls through the lane-ordering rule.

use tracing::trace;

use crate::common::constants::{LINK_REG, SYSCALL_REG, TQ_DEQUEUE_REGS, VECTOR_LANES};
use crate::common::error::SimError;
use crate::core::cpu::Core;
use crate::core::pipeline::instr::{InstrToken, MAX_DSTS, MAX_SRCS, RegRef, RegSlot};
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StepResult};
use crate::isa::opcode::Format;
use crate::isa::{OpClass, Opcode};
use crate::sim::SimContext;

/// Decode stage.
#[derive(Debug)]
pub struct Decode;

impl PipelineStage for Decode {
    const STAGE: PipeStage = PipeStage::Decode;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.get(PipeStage::Decode, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.get_mut(id)?;
        if token.flags.done_decode {
            return Ok(StepResult::Completed(id));
        }
        let regs = &core.threads[token.thread].regs;
        let (srcs, dsts) = operand_slots(token);
        check_range(&srcs, &dsts, regs.scalar_len(), regs.vector_len())?;

        let (src_float, dst_float) = float_tags(token.op());
        for (slot, reg) in token.srcs.iter_mut().zip(&srcs) {
            *slot = Some(RegSlot::new(*reg, src_float));
        }
        for (slot, reg) in token.dsts.iter_mut().zip(&dsts) {
            *slot = Some(RegSlot::new(*reg, dst_float));
        }

        let class = token.class();
        token.flags.is_vector_op = class.is_vector();
        if matches!(class, OpClass::Vector | OpClass::VectorFp) {
            let per_cycle = ctx.config.pipeline.vector_lanes_per_cycle.max(1);
            token.vec_remaining = VECTOR_LANES.div_ceil(per_cycle) as u8;
        }
        if token.op() == Opcode::Syscall {
            token.syscall_wait = 1;
        }
        token.flags.done_decode = true;
        trace!(core = core.id, lane, "DE  {token}");
        Ok(StepResult::Completed(id))
    }
}

fn scalar(r: u8) -> RegRef {
    RegRef::Scalar(r)
}

fn lanes(reg: u8) -> impl Iterator<Item = RegRef> {
    (0..VECTOR_LANES as u8).map(move |lane| RegRef::VectorLane { reg, lane })
}

/// Source and destination registers of `token`, in operand order.
fn operand_slots(token: &InstrToken) -> (Vec<RegRef>, Vec<RegRef>) {
    let i = token.inst;
    let op = i.op;
    let link = scalar(LINK_REG as u8);
    match op {
        Opcode::Fmadd | Opcode::Fmsub => {
            return (vec![scalar(i.rs), scalar(i.rt), scalar(i.rd)], vec![scalar(i.rd)]);
        }
        Opcode::AtomCas => {
            return (vec![scalar(i.rs), scalar(i.rt), scalar(i.rd)], vec![scalar(i.rd)]);
        }
        Opcode::Stc => return (vec![scalar(i.rs), scalar(i.rd)], vec![scalar(i.rd)]),
        Opcode::TqDeq => {
            let dsts = (0..TQ_DEQUEUE_REGS as u8)
                .map(|k| scalar(i.rd.wrapping_add(k)))
                .collect();
            return (Vec::new(), dsts);
        }
        Opcode::Syscall => {
            let srcs = (0..4u8)
                .map(|k| scalar(SYSCALL_REG as u8 + k))
                .collect();
            return (srcs, vec![scalar(SYSCALL_REG as u8)]);
        }
        Opcode::Vstw => {
            let mut srcs = vec![scalar(i.rs)];
            srcs.extend(lanes(i.rd));
            return (srcs, Vec::new());
        }
        _ => {}
    }
    if op.stores_rd() {
        return (vec![scalar(i.rs), scalar(i.rd)], Vec::new());
    }
    match op.format() {
        Format::None | Format::Imm => (Vec::new(), Vec::new()),
        Format::R3 => (vec![scalar(i.rs), scalar(i.rt)], vec![scalar(i.rd)]),
        Format::R2 | Format::Ri | Format::Mem => (vec![scalar(i.rs)], vec![scalar(i.rd)]),
        Format::RdImm => (Vec::new(), vec![scalar(i.rd)]),
        Format::RsImm | Format::B1 | Format::Addr | Format::Rs => (vec![scalar(i.rs)], Vec::new()),
        Format::B2 => (vec![scalar(i.rs), scalar(i.rt)], Vec::new()),
        Format::J => (Vec::new(), if op.links() { vec![link] } else { Vec::new() }),
        Format::Jr => (vec![scalar(i.rs)], if op.links() { vec![link] } else { Vec::new() }),
        Format::R4 => (
            vec![scalar(i.rd), scalar(i.rs), scalar(i.rt), scalar(i.ru)],
            Vec::new(),
        ),
        Format::Rd => (Vec::new(), vec![scalar(i.rd)]),
        Format::V3 => (lanes(i.rs).chain(lanes(i.rt)).collect(), lanes(i.rd).collect()),
        Format::Vi => (lanes(i.rs).collect(), lanes(i.rd).collect()),
        Format::VSplat | Format::VMem => (vec![scalar(i.rs)], lanes(i.rd).collect()),
    }
}

fn check_range(srcs: &[RegRef], dsts: &[RegRef], scalar_len: usize, vector_len: usize) -> Result<(), SimError> {
    debug_assert!(srcs.len() <= MAX_SRCS && dsts.len() <= MAX_DSTS);
    for reg in srcs.iter().chain(dsts) {
        let (idx, size) = match *reg {
            RegRef::Scalar(r) => (usize::from(r), scalar_len),
            RegRef::VectorLane { reg, .. } => (usize::from(reg), vector_len),
        };
        if idx >= size {
            return Err(SimError::RegisterOutOfRange { reg: idx, size });
        }
    }
    Ok(())
}

/// Whether sources and destinations of `op` hold single-precision floats.
fn float_tags(op: Opcode) -> (bool, bool) {
    match op {
        Opcode::I2f => (false, true),
        Opcode::F2i | Opcode::Ceqf | Opcode::Cltf | Opcode::Clef => (true, false),
        _ => {
            let fp = matches!(op.class(), OpClass::Fp | OpClass::FpLong | OpClass::VectorFp);
            (fp, fp)
        }
    }
}
