//! Pipeline stage implementations.
//!
//! One unit struct per stage, each implementing
//! [`PipelineStage`](super::traits::PipelineStage). In pipeline order:
//! 1. **Fetch:** Thread selection, instruction cache, BTB prediction.
//! 2. **Decode:** Operand slot expansion.
//! 3. **Execute:** Hazard checks, computation, branch resolution.
//! 4. **Memory:** Access issue, task queue and system calls.
//! 5. **FPComplete:** Floating-point latency.
//! 6. **CCacheAccess:** Completion polling and the non-blocking side list.
//! 7. **WriteBack:** Retirement.

/// Cache completion stage.
pub mod cc_access;

/// Instruction decode stage.
pub mod decode;

/// Execute stage.
pub mod execute;

/// Instruction fetch stage.
pub mod fetch;

/// Floating-point completion stage.
pub mod fp_complete;

/// Memory access stage.
pub mod memory;

/// Writeback stage.
pub mod writeback;

pub use cc_access::CcAccess;
pub use decode::Decode;
pub use execute::Execute;
pub use fetch::Fetch;
pub use fp_complete::FpComplete;
pub use memory::{Memory, poll_access};
pub use writeback::WriteBack;
