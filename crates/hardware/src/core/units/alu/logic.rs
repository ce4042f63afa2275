//! ALU logical and comparison operations.
//!
//! Compares produce `1` when the relation holds and `0` otherwise.

use crate::isa::Opcode;

/// Executes a logical or compare operation. Returns `0` for other opcodes.
pub fn execute(op: Opcode, a: u32, b: u32) -> u32 {
    match op {
        Opcode::And | Opcode::Andi => a & b,
        Opcode::Or | Opcode::Ori => a | b,
        Opcode::Xor | Opcode::Xori => a ^ b,
        Opcode::Nor => !(a | b),
        Opcode::Clz => a.leading_zeros(),
        Opcode::Ceq => u32::from(a == b),
        Opcode::Clt => u32::from((a as i32) < (b as i32)),
        Opcode::Cltu => u32::from(a < b),
        Opcode::Cle => u32::from((a as i32) <= (b as i32)),
        Opcode::Cleu => u32::from(a <= b),
        _ => 0,
    }
}
