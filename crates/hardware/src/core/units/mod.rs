//! Execution units and functional components.
//!
//! This module contains the units the Execute and Memory stages drive: the integer ALU,
//! the FPU, the branch resolution unit with its target buffer, the load/store unit and
//! the per-core functional unit pool.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Branch Resolution Unit and Branch Target Buffer.
pub mod bru;

/// Floating-Point Unit for single-precision operations.
pub mod fpu;

/// Per-cycle functional unit arbitration.
pub mod fu;

/// Load/Store Unit: address generation, alignment and atomics.
pub mod lsu;
