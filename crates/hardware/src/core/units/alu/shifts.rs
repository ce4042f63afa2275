//! ALU shift operations.
//!
//! Only the low five bits of the shift amount are used.

use crate::isa::Opcode;

/// Mask applied to shift amounts.
const SHAMT_MASK: u32 = 0x1F;

/// Executes a shift operation. Returns `0` for other opcodes.
pub fn execute(op: Opcode, a: u32, b: u32) -> u32 {
    let shamt = b & SHAMT_MASK;
    match op {
        Opcode::Sll | Opcode::Slli => a << shamt,
        Opcode::Srl | Opcode::Srli => a >> shamt,
        Opcode::Sra | Opcode::Srai => ((a as i32) >> shamt) as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_shift_keeps_sign() {
        assert_eq!(execute(Opcode::Sra, 0x8000_0000, 31), u32::MAX);
        assert_eq!(execute(Opcode::Srl, 0x8000_0000, 31), 1);
    }

    #[test]
    fn test_shift_amount_is_masked() {
        assert_eq!(execute(Opcode::Sll, 1, 33), 2);
    }
}
