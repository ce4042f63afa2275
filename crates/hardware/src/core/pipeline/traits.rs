//! Pipeline Stage Interface.
//!
//! Every stage is a unit struct implementing [`PipelineStage`]. The core calls
//! `update` once per lane per cycle in pipeline order; the stage reads its input from
//! `core.latches[STAGE][lane]` and reports one of three outcomes:
//! 1. **Bubble:** Nothing to do in this lane.
//! 2. **Stalled:** The token stays where it is; the cause is attributed to a counter.
//! 3. **Completed:** The token moves to the next stage's `nlatches` slot.

use super::arena::InstrId;
use super::latches::PipeStage;
use crate::common::error::SimError;
use crate::core::cpu::Core;
use crate::isa::FuClass;
use crate::sim::SimContext;
use crate::soc::StallReason;
use crate::stats::Stat;

/// Why a lane could not advance this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StallCause {
    /// A source register is not readable yet.
    RegDependency,
    /// A destination register is locked by an older producer.
    Waw,
    /// An older lane of the same stage stalled.
    LaneOrder,
    /// The thread's scoreboard is draining.
    Drain,
    /// Every unit of the class is busy.
    Fu(FuClass),
    /// Multi-cycle vector work in progress.
    Vector,
    /// Floating-point result not complete.
    FpLatency,
    /// Another load of the same thread is outstanding.
    LoadPending,
    /// The cache model reported a stall.
    Memory(StallReason),
    /// A task-queue request is in progress.
    TaskQueue,
    /// The system call occupies the Memory stage.
    Syscall,
    /// `mfsr` waits for an older `mtsr`.
    Spr,
    /// The instruction cache stalled fetch.
    Icache(StallReason),
}

impl StallCause {
    /// Whether the stall waits on the memory system or the task queue rather than on
    /// another instruction of the core.
    pub fn is_external_wait(self) -> bool {
        matches!(self, StallCause::Memory(_) | StallCause::TaskQueue)
    }

    /// Counter the stall is attributed to.
    pub fn stat(self) -> Stat {
        match self {
            StallCause::RegDependency => Stat::StallRegDependency,
            StallCause::Waw => Stat::StallWaw,
            StallCause::LaneOrder => Stat::StallLaneOrder,
            StallCause::Drain => Stat::StallDrain,
            StallCause::Fu(FuClass::Alu | FuClass::None) => Stat::StallFuAlu,
            StallCause::Fu(FuClass::Fpu) => Stat::StallFuFpu,
            StallCause::Fu(FuClass::Shifter) => Stat::StallFuShifter,
            StallCause::Fu(FuClass::Branch) => Stat::StallFuBranch,
            StallCause::Fu(FuClass::Mem) => Stat::StallFuMem,
            StallCause::Vector => Stat::StallVector,
            StallCause::FpLatency => Stat::StallFpLatency,
            StallCause::LoadPending => Stat::StallLoadPending,
            StallCause::Memory(_) => Stat::StallMemory,
            StallCause::TaskQueue => Stat::StallTaskQueue,
            StallCause::Syscall => Stat::StallSyscall,
            StallCause::Spr => Stat::StallSpr,
            StallCause::Icache(_) => Stat::FetchIcacheStall,
        }
    }
}

/// Outcome of one stage step for one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// Empty lane.
    Bubble,
    /// The token stays in this stage.
    Stalled(StallCause),
    /// The token advances.
    Completed(InstrId),
}

/// One pipeline stage.
pub trait PipelineStage {
    /// Position of the stage.
    const STAGE: PipeStage;

    /// Advances the token in `lane`, if any.
    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError>;
}
