//! ALU arithmetic operations.
//!
//! All arithmetic wraps on overflow; `mulh` returns the high word of the signed
//! 64-bit product.

use crate::isa::Opcode;

/// Number of bits in a machine word (used for the high-multiply shift).
const WORD_BITS: u32 = 32;

/// Shift applied by `mvui` to place its immediate in the upper half-word.
const UPPER_IMM_SHIFT: u32 = 16;

/// Executes an integer arithmetic operation. Returns `0` for other opcodes.
pub fn execute(op: Opcode, a: u32, b: u32) -> u32 {
    match op {
        Opcode::Add | Opcode::Addi => a.wrapping_add(b),
        Opcode::Sub | Opcode::Subi => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Mulh => ((i64::from(a as i32) * i64::from(b as i32)) >> WORD_BITS) as u32,
        Opcode::Mvui => b << UPPER_IMM_SHIFT,
        Opcode::Sext8 => a as u8 as i8 as i32 as u32,
        Opcode::Sext16 => a as u16 as i16 as i32 as u32,
        Opcode::Zext8 => a & 0xFF,
        Opcode::Zext16 => a & 0xFFFF,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_add_sub() {
        assert_eq!(execute(Opcode::Add, u32::MAX, 1), 0);
        assert_eq!(execute(Opcode::Subi, 0, 1), u32::MAX);
    }

    #[test]
    fn test_mulh_signed() {
        assert_eq!(execute(Opcode::Mulh, (-1i32) as u32, 2), u32::MAX);
        assert_eq!(execute(Opcode::Mulh, 0x8000_0000, 0x8000_0000), 0x4000_0000);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(execute(Opcode::Sext8, 0x80, 0), 0xFFFF_FF80);
        assert_eq!(execute(Opcode::Zext16, 0xDEAD_BEEF, 0), 0xBEEF);
        assert_eq!(execute(Opcode::Mvui, 0, 0x1234), 0x1234_0000);
    }
}
