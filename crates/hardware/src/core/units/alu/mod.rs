//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage. It handles
//! arithmetic, logical, compare and shift operations on 32-bit operands.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul, Mulh, Mvui and the sign/zero extensions
//! - [`logic`]:      And, Or, Xor, Nor, Clz and the compares
//! - [`shifts`]:     Sll, Srl, Sra and their immediate forms

/// Integer arithmetic operations (add, subtract, multiply, extensions).
pub mod arithmetic;

/// Bitwise logical and comparison operations.
pub mod logic;

/// Shift operations.
pub mod shifts;

use crate::isa::Opcode;

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// Immediate forms receive the immediate as `b`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rigel_core::core::units::alu::Alu;
    /// use rigel_core::isa::Opcode;
    ///
    /// assert_eq!(Alu::execute(Opcode::Add, 40, 2), 42);
    /// assert_eq!(Alu::execute(Opcode::Clt, (-5i32) as u32, 10), 1);
    /// assert_eq!(Alu::execute(Opcode::Slli, 1, 4), 0x10);
    /// ```
    pub fn execute(op: Opcode, a: u32, b: u32) -> u32 {
        match op {
            Opcode::Add
            | Opcode::Addi
            | Opcode::Sub
            | Opcode::Subi
            | Opcode::Mul
            | Opcode::Mulh
            | Opcode::Mvui
            | Opcode::Sext8
            | Opcode::Sext16
            | Opcode::Zext8
            | Opcode::Zext16 => arithmetic::execute(op, a, b),

            Opcode::And
            | Opcode::Andi
            | Opcode::Or
            | Opcode::Ori
            | Opcode::Xor
            | Opcode::Xori
            | Opcode::Nor
            | Opcode::Clz
            | Opcode::Ceq
            | Opcode::Clt
            | Opcode::Cltu
            | Opcode::Cle
            | Opcode::Cleu => logic::execute(op, a, b),

            Opcode::Sll
            | Opcode::Srl
            | Opcode::Sra
            | Opcode::Slli
            | Opcode::Srli
            | Opcode::Srai => shifts::execute(op, a, b),

            // Non-integer operations are not handled here.
            _ => 0,
        }
    }
}
