//! Instruction Token.
//!
//! The mutable record an instruction carries through the pipeline, created at Fetch and
//! destroyed at WriteBack or on a flush. It holds:
//! 1. **Identity:** Global instruction number, owning core and thread, pc and the predicted
//!    and resolved next pc.
//! 2. **Operands:** Up to eight source slots (four scalars or four vector lanes per vector
//!    operand) and up to four destination slots, each a register reference, a value and an
//!    is-float tag.
//! 3. **Progress Flags:** Which stages have already done their work, so a token held in a
//!    stage by a downstream stall passes through without repeating side effects.
//! 4. **Timing:** Cycle stamps and memory stall accounting.

use std::fmt;

use crate::common::constants::VECTOR_LANES;
use crate::isa::{Instruction, OpClass, Opcode};
use crate::tq::TqRetType;

/// Globally unique, monotonically increasing instruction number.
pub type InstrNumber = u64;

/// Maximum source slots of one instruction.
pub const MAX_SRCS: usize = 8;

/// Maximum destination slots of one instruction.
pub const MAX_DSTS: usize = 4;

/// A register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegRef {
    /// Scalar register `r<n>`.
    Scalar(u8),
    /// One 32-bit lane of vector register `v<reg>`.
    VectorLane {
        /// Vector register index.
        reg: u8,
        /// Lane within the register.
        lane: u8,
    },
}

impl RegRef {
    /// Scoreboard slot of the operand, given the number of scalar registers.
    ///
    /// Vector lanes are laid out after the scalar registers, four slots per vector register.
    pub fn slot(self, scalar_regs: usize) -> usize {
        match self {
            RegRef::Scalar(r) => usize::from(r),
            RegRef::VectorLane { reg, lane } => {
                scalar_regs + usize::from(reg) * VECTOR_LANES + usize::from(lane)
            }
        }
    }
}

impl fmt::Display for RegRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegRef::Scalar(r) => write!(f, "r{r}"),
            RegRef::VectorLane { reg, lane } => write!(f, "v{reg}.{lane}"),
        }
    }
}

/// A register slot of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegSlot {
    /// Register referenced.
    pub reg: RegRef,
    /// Value read (sources) or produced (destinations).
    pub value: u32,
    /// Whether the value is a single-precision float.
    pub is_float: bool,
}

impl RegSlot {
    /// A slot for `reg` with no value yet.
    pub const fn new(reg: RegRef, is_float: bool) -> Self {
        Self {
            reg,
            value: 0,
            is_float,
        }
    }
}

/// Per-token progress and control bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstrFlags {
    /// Operand slots filled in.
    pub done_decode: bool,
    /// Source values read.
    pub done_regaccess: bool,
    /// Result computed and destinations acquired in the scoreboard.
    pub done_execute: bool,
    /// Memory access issued (or the Memory-stage operation finished).
    pub done_mem_access: bool,
    /// Memory access complete.
    pub done_cc_access: bool,
    /// Destinations were acquired locked and still hold the lock.
    pub has_reg_lock: bool,
    /// The branch was resolved against its prediction.
    pub mispredict: bool,
    /// Was stalled at least once.
    pub stalled: bool,
    /// Vector operation.
    pub is_vector_op: bool,
    /// Issued an access that has not completed yet.
    pub mem_outstanding: bool,
    /// Completed out of order through the non-blocking memory path.
    pub parked: bool,
}

/// The instruction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrToken {
    /// Global instruction number.
    pub number: InstrNumber,
    /// Owning core.
    pub core: usize,
    /// Owning hardware thread.
    pub thread: usize,
    /// Program counter.
    pub pc: u32,
    /// Next pc predicted at Fetch.
    pub predicted_pc: u32,
    /// Next pc resolved at Execute.
    pub next_pc: u32,
    /// Assembled instruction.
    pub inst: Instruction,
    /// Effective address of memory operations.
    pub addr: u32,
    /// Source slots, in the operand order of the opcode.
    pub srcs: [Option<RegSlot>; MAX_SRCS],
    /// Destination slots.
    pub dsts: [Option<RegSlot>; MAX_DSTS],
    /// Progress and control bits.
    pub flags: InstrFlags,
    /// Execute cycles still needed by a vector operation.
    pub vec_remaining: u8,
    /// Vector memory lanes completed so far.
    pub vec_lanes_done: u8,
    /// Cycle the token was fetched.
    pub fetch_cycle: u64,
    /// Cycle the token executed.
    pub execute_cycle: u64,
    /// Cycle the result is complete, for FPComplete.
    pub ready_cycle: u64,
    /// Cycles spent waiting on the memory system.
    pub mem_stall_cycles: u64,
    /// Result of a task-queue request.
    pub tq_status: Option<TqRetType>,
    /// Cycles left on a syscall's Memory-stage occupancy.
    pub syscall_wait: u8,
    /// Syscall requested the thread to exit.
    pub exit_thread: bool,
}

impl InstrToken {
    /// Creates a freshly fetched token.
    pub fn new(number: InstrNumber, core: usize, thread: usize, pc: u32, inst: Instruction) -> Self {
        Self {
            number,
            core,
            thread,
            pc,
            predicted_pc: pc,
            next_pc: pc,
            inst,
            addr: 0,
            srcs: [None; MAX_SRCS],
            dsts: [None; MAX_DSTS],
            flags: InstrFlags::default(),
            vec_remaining: 0,
            vec_lanes_done: 0,
            fetch_cycle: 0,
            execute_cycle: 0,
            ready_cycle: 0,
            mem_stall_cycles: 0,
            tq_status: None,
            syscall_wait: 0,
            exit_thread: false,
        }
    }

    /// Opcode.
    pub fn op(&self) -> Opcode {
        self.inst.op
    }

    /// Execution class.
    pub fn class(&self) -> OpClass {
        self.inst.op.class()
    }

    /// Value of source slot `i`, or zero if absent.
    pub fn src(&self, i: usize) -> u32 {
        self.srcs.get(i).copied().flatten().map_or(0, |s| s.value)
    }

    /// Present source slots.
    pub fn src_slots(&self) -> impl Iterator<Item = &RegSlot> {
        self.srcs.iter().flatten()
    }

    /// Present destination slots.
    pub fn dst_slots(&self) -> impl Iterator<Item = &RegSlot> {
        self.dsts.iter().flatten()
    }

    /// Sets the value of every destination, in slot order, from `values`.
    pub fn set_dst_values(&mut self, values: &[u32]) {
        for (slot, v) in self.dsts.iter_mut().flatten().zip(values) {
            slot.value = *v;
        }
    }

    /// Whether the token's destinations are acquired locked in Execute.
    pub fn acquires_locked(&self) -> bool {
        matches!(
            self.op(),
            Opcode::Ldw
                | Opcode::Ldl
                | Opcode::Gldw
                | Opcode::Stc
                | Opcode::Vldw
                | Opcode::TqDeq
                | Opcode::Syscall
        ) || self.class() == OpClass::Atomic
    }
}

impl fmt::Display for InstrToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} t{} {:#010x}: {}", self.number, self.thread, self.pc, self.inst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_lanes_follow_scalars() {
        assert_eq!(RegRef::Scalar(5).slot(32), 5);
        assert_eq!(RegRef::VectorLane { reg: 0, lane: 0 }.slot(32), 32);
        assert_eq!(RegRef::VectorLane { reg: 2, lane: 3 }.slot(32), 43);
    }

    #[test]
    fn test_dst_values_fill_in_order() {
        let mut t = InstrToken::new(1, 0, 0, 0, Instruction::new(Opcode::TqDeq));
        t.dsts[0] = Some(RegSlot::new(RegRef::Scalar(4), false));
        t.dsts[1] = Some(RegSlot::new(RegRef::Scalar(5), false));
        t.set_dst_values(&[7, 8, 9]);
        let got: Vec<u32> = t.dst_slots().map(|s| s.value).collect();
        assert_eq!(got, vec![7, 8]);
        assert!(t.acquires_locked());
    }
}
