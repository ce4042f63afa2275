//! Pipeline latch matrices.
//!
//! `latches[stage][lane]` is the committed input of `stage` this cycle; the core keeps a
//! second matrix, `nlatches`, that stages write their outputs into. An empty slot is a
//! bubble.
//!
//! Seven stages: Fetch → Decode → Execute → Mem → FPComplete → CCacheAccess → WriteBack.
//! Fetch has no input latch; its row is always empty.

use std::fmt;

use super::arena::InstrId;
use crate::common::constants::MAX_ISSUE_WIDTH;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipeStage {
    /// Instruction fetch and next-pc prediction.
    Fetch,
    /// Operand slot decode.
    Decode,
    /// Register read, ALU/FPU/branch resolution.
    Execute,
    /// Memory access issue, task-queue and syscall handling.
    Mem,
    /// Floating-point completion.
    FpComplete,
    /// Cache completion polling.
    CcAccess,
    /// Retirement.
    WriteBack,
}

impl PipeStage {
    /// Every stage in pipeline order.
    pub const ALL: [PipeStage; 7] = [
        PipeStage::Fetch,
        PipeStage::Decode,
        PipeStage::Execute,
        PipeStage::Mem,
        PipeStage::FpComplete,
        PipeStage::CcAccess,
        PipeStage::WriteBack,
    ];

    /// Number of stages.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in the pipeline.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The stage this one feeds, or `None` for WriteBack.
    pub fn next(self) -> Option<PipeStage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Short name for dumps.
    pub const fn name(self) -> &'static str {
        match self {
            PipeStage::Fetch => "IF",
            PipeStage::Decode => "DE",
            PipeStage::Execute => "EX",
            PipeStage::Mem => "MEM",
            PipeStage::FpComplete => "FPC",
            PipeStage::CcAccess => "CC",
            PipeStage::WriteBack => "WB",
        }
    }
}

impl fmt::Display for PipeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `[stage][lane]` matrix of token handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatchMatrix {
    slots: [[Option<InstrId>; MAX_ISSUE_WIDTH]; PipeStage::COUNT],
}

impl LatchMatrix {
    /// An all-bubble matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token in `stage`/`lane`.
    pub fn get(&self, stage: PipeStage, lane: usize) -> Option<InstrId> {
        self.slots[stage.index()].get(lane).copied().flatten()
    }

    /// Places `id` (or a bubble) in `stage`/`lane`.
    pub fn set(&mut self, stage: PipeStage, lane: usize, id: Option<InstrId>) {
        if let Some(slot) = self.slots[stage.index()].get_mut(lane) {
            *slot = id;
        }
    }

    /// Removes and returns the token in `stage`/`lane`.
    pub fn take(&mut self, stage: PipeStage, lane: usize) -> Option<InstrId> {
        self.slots[stage.index()].get_mut(lane).and_then(Option::take)
    }

    /// Bubbles every lane of `stage`.
    pub fn clear_stage(&mut self, stage: PipeStage) {
        self.slots[stage.index()] = [None; MAX_ISSUE_WIDTH];
    }

    /// Copies `stage`'s row from `other`.
    pub fn copy_stage(&mut self, other: &LatchMatrix, stage: PipeStage) {
        self.slots[stage.index()] = other.slots[stage.index()];
    }

    /// Replaces `id` with a bubble wherever it appears.
    ///
    /// # Returns
    ///
    /// Whether the handle was found.
    pub fn remove(&mut self, id: InstrId) -> bool {
        let mut found = false;
        for slot in self.slots.iter_mut().flatten() {
            if *slot == Some(id) {
                *slot = None;
                found = true;
            }
        }
        found
    }

    /// Tokens of `stage` in lane order.
    pub fn stage_ids(&self, stage: PipeStage) -> impl Iterator<Item = InstrId> + '_ {
        self.slots[stage.index()].iter().flatten().copied()
    }

    /// Every token handle in the matrix.
    pub fn ids(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.slots.iter().flatten().flatten().copied()
    }

    /// Whether `stage` holds no token.
    pub fn is_stage_empty(&self, stage: PipeStage) -> bool {
        self.slots[stage.index()].iter().all(Option::is_none)
    }

    /// Whether the matrix holds no token.
    pub fn is_empty(&self) -> bool {
        self.ids().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::arena::InstrArena;
    use crate::core::pipeline::instr::InstrToken;
    use crate::isa::{Instruction, Opcode};

    #[test]
    fn test_remove_clears_every_copy() {
        let mut arena = InstrArena::new(4);
        let id = arena
            .alloc(InstrToken::new(1, 0, 0, 0, Instruction::new(Opcode::Nop)))
            .unwrap();
        let mut m = LatchMatrix::new();
        m.set(PipeStage::Decode, 1, Some(id));
        m.set(PipeStage::Execute, 0, Some(id));
        assert!(m.remove(id));
        assert!(m.is_empty());
        assert!(!m.remove(id));
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(PipeStage::Fetch.next(), Some(PipeStage::Decode));
        assert_eq!(PipeStage::CcAccess.next(), Some(PipeStage::WriteBack));
        assert_eq!(PipeStage::WriteBack.next(), None);
    }
}
