//! Instruction Set.
//!
//! This module defines the simulated Rigel instruction set. It provides:
//! 1. **Opcodes:** The closed opcode table with formats and execution classes.
//! 2. **Instructions:** The assembled instruction value type.
//! 3. **Programs:** The text/data image shared by all cores.
//! 4. **Assembler:** Source text to program translation.

/// Text assembler.
pub mod asm;

/// Assembled instruction type.
pub mod instruction;

/// Opcode table, operand formats and execution classes.
pub mod opcode;

/// Program image.
pub mod program;

pub use asm::assemble;
pub use instruction::Instruction;
pub use opcode::{FuClass, OpClass, Opcode};
pub use program::Program;
