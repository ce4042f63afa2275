//! # Unit Components
//!
//! Fine-grained tests for individual components, plus scenario tests that drive small
//! assembled programs through the whole pipeline and inspect the result.

/// Configuration parsing, defaults and validation.
pub mod config;

/// Assembler and program images.
pub mod isa;

/// Scoreboard use counts, locks and bypass rules.
pub mod scoreboard;

/// Branch target buffer capacity and replacement.
pub mod btb;

/// Task queue request protocol, overflow and barrier detection.
pub mod task_queue;

/// Pipeline scenarios: forwarding, misprediction recovery, memory stalls, retirement order.
pub mod pipeline;

/// Whole programs: system calls, loops, task parallel code and fatal conditions.
pub mod programs;

/// Statistics reporting.
pub mod stats;
