//! Simulation driver.
//!
//! Provides the shared simulation context and the top-level simulator that steps every
//! core through global cycles.

/// Shared per-run state passed to every stage.
pub mod context;

/// Top-level simulator and run loop.
pub mod simulator;

pub use context::SimContext;
pub use simulator::{RunSummary, Simulator};
