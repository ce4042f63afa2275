//! Core processor implementation.
//!
//! This module contains one Rigel core: the in-order multithreaded pipeline, its
//! execution units, and the per-cycle orchestration that ties them together.

/// Core state, hardware threads and per-cycle orchestration.
pub mod cpu;

/// Instruction pipeline (tokens, latches, scoreboard, stages, commit policy).
pub mod pipeline;

/// Execution units (ALU, FPU, branch resolution and BTB, load/store, FU pool).
pub mod units;

pub use self::cpu::{Core, RetireRecord, ThreadContext};
