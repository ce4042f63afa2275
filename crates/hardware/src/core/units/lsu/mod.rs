//! Load/Store Unit (LSU).
//!
//! Address generation and alignment checking for memory instructions, plus the
//! [`atomic`] read-modify-write ALU. The access protocol itself (issue, polling,
//! completion) lives in the Memory and CCacheAccess stages.

/// Atomic memory operation ALU.
pub mod atomic;

use crate::common::constants::{INSTRUCTION_BYTES, VECTOR_LANES};
use crate::common::error::SimError;
use crate::isa::{OpClass, Opcode};

/// Load/Store Unit.
#[derive(Debug)]
pub struct Lsu;

impl Lsu {
    /// Effective address `base + offset`.
    pub fn effective_address(base: u32, offset: u32) -> u32 {
        base.wrapping_add(offset)
    }

    /// Required alignment of `op`'s address in bytes, or `None` if it has no address.
    pub fn alignment(op: Opcode) -> Option<u32> {
        match op.class() {
            OpClass::VectorMem => Some(INSTRUCTION_BYTES * VECTOR_LANES as u32),
            OpClass::Load
            | OpClass::Store
            | OpClass::GlobalLoad
            | OpClass::GlobalStore
            | OpClass::Atomic
            | OpClass::Broadcast
            | OpClass::Prefetch
            | OpClass::CacheLine => Some(INSTRUCTION_BYTES),
            _ => None,
        }
    }

    /// Checks `addr` against the alignment `op` requires.
    pub fn check_alignment(op: Opcode, pc: u32, addr: u32) -> Result<(), SimError> {
        match Self::alignment(op) {
            Some(align) if addr % align != 0 => Err(SimError::MisalignedAddress { pc, addr }),
            _ => Ok(()),
        }
    }

    /// Address of lane `lane` of a vector access at `base`.
    pub fn lane_address(base: u32, lane: usize) -> u32 {
        base.wrapping_add(INSTRUCTION_BYTES * lane as u32)
    }
}
