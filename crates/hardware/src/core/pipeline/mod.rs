//! Instruction Pipeline.
//!
//! The seven-stage in-order pipeline of a Rigel core. It provides:
//! 1. **Tokens:** The per-instruction record and the arena that owns every live token.
//! 2. **Latches:** The `latches` / `nlatches` matrices tokens move through.
//! 3. **Hazards:** The per-thread scoreboard with its bypass network.
//! 4. **Speculation:** Per-thread speculative rings and the fix-up signals of Execute.
//! 5. **Stages:** Fetch, Decode, Execute, Mem, FPComplete, CCacheAccess and WriteBack.
//! 6. **Commit Policy:** In-order retirement, or the non-blocking memory waiver.

/// Instruction token arena with generation-checked handles.
pub mod arena;

/// Retirement order tracking.
pub mod commit;

/// The instruction token.
pub mod instr;

/// Latch matrices and stage identifiers.
pub mod latches;

/// Register hazard scoreboard.
pub mod scoreboard;

/// Execute-to-Fetch redirect signals.
pub mod signals;

/// Per-thread speculative instruction ring.
pub mod speculative;

/// Stage implementations.
pub mod stages;

/// Stage trait and step results.
pub mod traits;

pub use arena::{InstrArena, InstrId};
pub use commit::{CommitPolicy, CommitTracker};
pub use instr::{InstrNumber, InstrToken, RegRef, RegSlot};
pub use latches::{LatchMatrix, PipeStage};
pub use scoreboard::ScoreBoard;
pub use traits::{PipelineStage, StallCause, StepResult};
