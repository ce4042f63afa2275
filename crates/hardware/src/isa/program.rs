//! Program Image.
//!
//! An assembled program: the text segment (word addressed from address 0), the initial
//! data words and the entry point. Every core executes the same image.

use std::collections::BTreeMap;

use super::instruction::Instruction;
use crate::common::constants::INSTRUCTION_BYTES;

/// Assembled program shared read-only by all cores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Instructions; the one at index `i` lives at address `4 * i`.
    pub text: Vec<Instruction>,
    /// Initial memory contents as `(address, word)` pairs.
    pub data: Vec<(u32, u32)>,
    /// Address where every thread starts.
    pub entry: u32,
    /// Label addresses.
    pub labels: BTreeMap<String, u32>,
}

impl Program {
    /// Builds a program from a bare instruction list starting at address 0.
    pub fn from_instructions(text: Vec<Instruction>) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    /// Fetches the instruction at `pc`.
    ///
    /// # Returns
    ///
    /// The instruction, or `undef` when `pc` is unaligned or outside the text segment.
    pub fn fetch(&self, pc: u32) -> Instruction {
        if pc % INSTRUCTION_BYTES != 0 {
            return Instruction::undef();
        }
        self.text
            .get((pc / INSTRUCTION_BYTES) as usize)
            .copied()
            .unwrap_or_else(Instruction::undef)
    }

    /// Address one past the last instruction.
    pub fn text_end(&self) -> u32 {
        self.text.len() as u32 * INSTRUCTION_BYTES
    }

    /// Address of `label`, if defined.
    pub fn label(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }
}
