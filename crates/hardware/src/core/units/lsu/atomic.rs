//! Atomic read-modify-write ALU.
//!
//! Global atomics are resolved functionally once the cache model reports the access
//! complete: the destination register receives the old memory word and memory receives
//! the value computed here.

use crate::isa::Opcode;

/// Computes the word an atomic leaves in memory.
///
/// # Arguments
///
/// * `op` - Atomic opcode.
/// * `old` - Current memory word.
/// * `operand` - Source operand (`rt`); unused by `atominc` / `atomdec`.
/// * `compare` - Expected value for `atomcas`.
///
/// # Returns
///
/// The new memory word, or `None` when memory is left unchanged (failed `atomcas`).
pub fn atomic_alu(op: Opcode, old: u32, operand: u32, compare: u32) -> Option<u32> {
    Some(match op {
        Opcode::AtomCas => {
            if old != compare {
                return None;
            }
            operand
        }
        Opcode::AtomAdd => old.wrapping_add(operand),
        Opcode::AtomInc => old.wrapping_add(1),
        Opcode::AtomDec => old.wrapping_sub(1),
        Opcode::AtomXchg => operand,
        Opcode::AtomMax => (old as i32).max(operand as i32) as u32,
        Opcode::AtomMin => (old as i32).min(operand as i32) as u32,
        Opcode::AtomOr => old | operand,
        Opcode::AtomAnd => old & operand,
        Opcode::AtomXor => old ^ operand,
        _ => return None,
    })
}
