//! Global System Constants.
//!
//! This module defines architecture-wide constants used across the simulator. It includes:
//! 1. **Register Constants:** Special scalar registers and vector geometry.
//! 2. **Instruction Constants:** Instruction size and fetch alignment.
//! 3. **Special-Purpose Registers:** Indices understood by `mfsr` / `mtsr`.
//! 4. **Simulation Limits:** Structural maxima the pipeline is sized against.

/// Scalar register hard-wired to zero.
pub const ZERO_REG: usize = 0;

/// Scalar register written by `jal` / `jalr` with the return address.
pub const LINK_REG: usize = 31;

/// Scalar register carrying the system-call number and result.
pub const SYSCALL_REG: usize = 1;

/// Number of architectural scalar registers addressable by the assembler.
pub const ARCH_SCALAR_REGS: usize = 32;

/// Number of architectural vector registers addressable by the assembler.
pub const ARCH_VECTOR_REGS: usize = 16;

/// Number of 32-bit lanes in a vector register.
pub const VECTOR_LANES: usize = 4;

/// Size of one instruction in bytes.
pub const INSTRUCTION_BYTES: u32 = 4;

/// Alignment of a dual-issue fetch group in bytes.
pub const FETCH_GROUP_BYTES: u32 = 8;

/// Maximum supported issue width.
pub const MAX_ISSUE_WIDTH: usize = 2;

/// Number of scalar registers written by `tqdeq` (ip, data, begin, end).
pub const TQ_DEQUEUE_REGS: usize = 4;

/// SPR holding the core index.
pub const SPR_CORE_ID: u32 = 0;

/// SPR holding the hardware thread index within the core.
pub const SPR_THREAD_ID: u32 = 1;

/// SPR holding the cluster index.
pub const SPR_CLUSTER_ID: u32 = 2;

/// SPR holding the low 32 bits of the global cycle counter.
pub const SPR_CYCLE: u32 = 3;

/// SPR holding the number of cores in the system.
pub const SPR_NUM_CORES: u32 = 4;

/// SPR holding the number of hardware threads per core.
pub const SPR_THREADS_PER_CORE: u32 = 5;

/// SPR holding the status code of the most recent `tqdeq`.
pub const SPR_TQ_STATUS: u32 = 6;

/// First general-purpose scratch SPR.
pub const SPR_SCRATCH_BASE: u32 = 8;

/// Total number of SPR slots.
pub const NUM_SPRS: usize = 16;
