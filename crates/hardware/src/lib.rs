//! Rigel many-core simulator library.
//!
//! This crate implements a cycle-accurate simulator of the Rigel tiled architecture with
//! the following:
//! 1. **Core:** A 2-wide in-order multithreaded pipeline (fetch, decode, execute, memory,
//!    FP completion, cache completion, writeback) with scoreboarded hazards and bypassing.
//! 2. **Task Queue:** The hardware task scheduler with barrier detection and
//!    cache-affinity task selection.
//! 3. **ISA:** A closed 32-bit instruction set, its assembler and program images.
//! 4. **SoC:** The cache-model interface, reference cache models and the syscall hook.
//! 5. **Simulation:** Configuration, the simulator driver and statistics collection.

/// Common types and constants (registers, error taxonomy, architectural limits).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Processor core (pipeline, execution units, per-cycle orchestration).
pub mod core;
/// Instruction set (opcodes, instructions, assembler, program images).
pub mod isa;
/// Simulation context and driver.
pub mod sim;
/// System collaborators (cache models, functional memory, syscalls).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Hardware task queue.
pub mod tq;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// One simulated core.
pub use crate::core::Core;
/// Fatal simulation error.
pub use crate::common::error::SimError;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::{RunSummary, Simulator};
