//! Per-Thread Register Files.
//!
//! This module provides the architectural state of one hardware thread. It provides:
//! 1. **Scalar File:** 32-bit general-purpose registers, `r0` hard-wired to zero.
//! 2. **Vector File:** Four-lane 32-bit vector registers.
//! 3. **SPR File:** Special-purpose registers written by `mtsr` and the task queue.
//!
//! Every write is traced at `trace` level; that is the observability hook used when
//! debugging a retirement stream.

use std::fmt::Write as _;

use tracing::trace;

use super::constants::{NUM_SPRS, VECTOR_LANES, ZERO_REG};
use super::error::SimError;

/// One vector register value.
pub type VectorValue = [u32; VECTOR_LANES];

/// Architectural register state of a single hardware thread.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    scalar: Vec<u32>,
    vector: Vec<VectorValue>,
    core: usize,
    thread: usize,
}

impl RegisterFile {
    /// Creates a zeroed register file.
    ///
    /// # Arguments
    ///
    /// * `scalar_regs` - Number of scalar registers.
    /// * `vector_regs` - Number of vector registers.
    /// * `core` - Owning core, used to tag trace events.
    /// * `thread` - Owning thread, used to tag trace events.
    pub fn new(scalar_regs: usize, vector_regs: usize, core: usize, thread: usize) -> Self {
        Self {
            scalar: vec![0; scalar_regs],
            vector: vec![[0; VECTOR_LANES]; vector_regs],
            core,
            thread,
        }
    }

    /// Number of scalar registers.
    pub fn scalar_len(&self) -> usize {
        self.scalar.len()
    }

    /// Number of vector registers.
    pub fn vector_len(&self) -> usize {
        self.vector.len()
    }

    /// Reads a scalar register.
    ///
    /// # Returns
    ///
    /// The register value, or `RegisterOutOfRange` for an index past the file.
    pub fn read(&self, idx: usize) -> Result<u32, SimError> {
        self.scalar
            .get(idx)
            .copied()
            .ok_or(SimError::RegisterOutOfRange {
                reg: idx,
                size: self.scalar.len(),
            })
    }

    /// Writes a scalar register. Writes to `r0` are discarded.
    pub fn write(&mut self, idx: usize, val: u32) -> Result<(), SimError> {
        let size = self.scalar.len();
        let slot = self
            .scalar
            .get_mut(idx)
            .ok_or(SimError::RegisterOutOfRange { reg: idx, size })?;
        if idx != ZERO_REG {
            *slot = val;
            trace!(core = self.core, thread = self.thread, reg = idx, value = val, "r write");
        }
        Ok(())
    }

    /// Reads a whole vector register.
    pub fn read_vector(&self, idx: usize) -> Result<VectorValue, SimError> {
        self.vector
            .get(idx)
            .copied()
            .ok_or(SimError::RegisterOutOfRange {
                reg: idx,
                size: self.vector.len(),
            })
    }

    /// Writes one lane of a vector register.
    pub fn write_vector_lane(&mut self, idx: usize, lane: usize, val: u32) -> Result<(), SimError> {
        let size = self.vector.len();
        let reg = self
            .vector
            .get_mut(idx)
            .ok_or(SimError::RegisterOutOfRange { reg: idx, size })?;
        if let Some(slot) = reg.get_mut(lane) {
            *slot = val;
        }
        trace!(core = self.core, thread = self.thread, reg = idx, lane, value = val, "v write");
        Ok(())
    }

    /// Renders the non-zero scalar registers and all non-zero vector registers.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, v) in self.scalar.iter().enumerate().filter(|(_, v)| **v != 0) {
            let _ = write!(out, " r{i}={v:#x}");
        }
        for (i, v) in self.vector.iter().enumerate().filter(|(_, v)| v.iter().any(|l| *l != 0)) {
            let _ = write!(out, " v{i}={v:x?}");
        }
        out
    }
}

/// Special-purpose register storage.
///
/// Only the writable slots live here. Identity and cycle SPRs are synthesized by the
/// Execute stage at read time.
#[derive(Clone, Debug, Default)]
pub struct SprFile {
    regs: [u32; NUM_SPRS],
}

impl SprFile {
    /// Reads an SPR slot; unknown indices read as zero.
    pub fn read(&self, idx: u32) -> u32 {
        self.regs.get(idx as usize).copied().unwrap_or(0)
    }

    /// Writes an SPR slot; unknown indices are ignored.
    pub fn write(&mut self, idx: u32, val: u32) {
        if let Some(slot) = self.regs.get_mut(idx as usize) {
            *slot = val;
        }
    }
}
