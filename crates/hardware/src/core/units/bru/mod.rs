//! Branch Resolution Unit (BRU).
//!
//! Resolves conditional branches and jumps in Execute and owns the per-thread
//! [`btb::Btb`] that Fetch uses to predict redirections. Branch immediates are
//! absolute targets.

/// Branch Target Buffer for storing predicted branch targets.
pub mod btb;

pub use self::btb::Btb;

use crate::common::constants::INSTRUCTION_BYTES;
use crate::isa::Opcode;

/// Outcome of a resolved control-flow instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Whether control leaves the fall-through path.
    pub taken: bool,
    /// Address of the next instruction actually executed.
    pub next_pc: u32,
}

/// Branch Resolution Unit.
#[derive(Debug)]
pub struct Bru;

impl Bru {
    /// Resolves the control-flow instruction at `pc`.
    ///
    /// # Arguments
    ///
    /// * `op` - Branch or jump opcode.
    /// * `a` - First source (`rs`), or the jump register for `jmpr` / `jalr`.
    /// * `b` - Second source (`rt`) for two-register branches.
    /// * `target` - Absolute immediate target.
    pub fn resolve(op: Opcode, pc: u32, a: u32, b: u32, target: u32) -> Resolution {
        let (sa, sb) = (a as i32, b as i32);
        let taken = match op {
            Opcode::Beq => a == b,
            Opcode::Bne => a != b,
            Opcode::Blt => sa < sb,
            Opcode::Bgt => sa > sb,
            Opcode::Ble => sa <= sb,
            Opcode::Bge => sa >= sb,
            Opcode::Beqz => a == 0,
            Opcode::Bnez => a != 0,
            Opcode::Bltz => sa < 0,
            Opcode::Bgtz => sa > 0,
            Opcode::Blez => sa <= 0,
            Opcode::Bgez => sa >= 0,
            Opcode::Jmp | Opcode::Jal | Opcode::Jmpr | Opcode::Jalr => true,
            _ => false,
        };
        let dest = match op {
            Opcode::Jmpr | Opcode::Jalr => a,
            _ => target,
        };
        Resolution {
            taken,
            next_pc: if taken { dest } else { pc.wrapping_add(INSTRUCTION_BYTES) },
        }
    }
}
