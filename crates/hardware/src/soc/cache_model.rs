//! Cache Model Interface.
//!
//! The pipeline never models cache timing itself; it polls a `CacheModel` and reacts to the
//! `StallReason` it reports. This module defines:
//! 1. **`StallReason`:** Why an access is not complete yet, or `NoStall` when it is.
//! 2. **Requests and Outcomes:** The per-access request record and the completion payload.
//! 3. **`CacheModel`:** The trait implemented by the reference models and by test mocks.
//!
//! Polling is idempotent: a model must accept the same request every cycle until it reports
//! `NoStall`, without double-issuing the access.

use std::fmt;

use crate::core::pipeline::instr::InstrNumber;

/// Why a memory access has not completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StallReason {
    /// The access is complete.
    NoStall,
    /// L1 miss outstanding; request travelling to the cluster cache.
    L1DPending,
    /// No free L1 miss status holding register.
    L1DMSHR,
    /// Waiting for cluster cache arbitration.
    L2DArbitrate,
    /// Cluster cache is servicing the access.
    L2DAccess,
    /// No free cluster cache miss status holding register.
    L2DMSHR,
    /// Cluster cache line locked by an access-bit interlock.
    L2DAccessBitInterlock,
    /// Cluster cache miss outstanding to memory.
    L2DPending,
    /// Ordered behind an in-flight global operation to the same line.
    StuckBehindGlobal,
}

impl StallReason {
    /// Every reason in declaration order.
    pub const ALL: [StallReason; 9] = [
        StallReason::NoStall,
        StallReason::L1DPending,
        StallReason::L1DMSHR,
        StallReason::L2DArbitrate,
        StallReason::L2DAccess,
        StallReason::L2DMSHR,
        StallReason::L2DAccessBitInterlock,
        StallReason::L2DPending,
        StallReason::StuckBehindGlobal,
    ];

    /// Number of reasons.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index for histograms.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the access is still outstanding.
    pub const fn is_stall(self) -> bool {
        !matches!(self, StallReason::NoStall)
    }

    /// Report name.
    pub const fn name(self) -> &'static str {
        match self {
            StallReason::NoStall => "no_stall",
            StallReason::L1DPending => "l1d_pending",
            StallReason::L1DMSHR => "l1d_mshr",
            StallReason::L2DArbitrate => "l2d_arbitrate",
            StallReason::L2DAccess => "l2d_access",
            StallReason::L2DMSHR => "l2d_mshr",
            StallReason::L2DAccessBitInterlock => "l2d_access_bit_interlock",
            StallReason::L2DPending => "l2d_pending",
            StallReason::StuckBehindGlobal => "stuck_behind_global",
        }
    }
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a global (uncached) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// `gldw`
    GlobalLoad,
    /// `gstw`
    GlobalStore,
    /// Any atomic read-modify-write.
    Atomic,
}

/// One memory access as seen by the cache model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest {
    /// Issuing instruction.
    pub instr: InstrNumber,
    /// Issuing core.
    pub core: usize,
    /// Cluster of the issuing core.
    pub cluster: usize,
    /// Issuing thread.
    pub thread: usize,
    /// Effective byte address.
    pub addr: u32,
    /// Global cycle of this poll.
    pub cycle: u64,
}

/// Levels of the hierarchy that serviced an access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitLevels {
    /// Serviced by L1.
    pub l1: bool,
    /// Serviced by the cluster cache.
    pub l2: bool,
    /// Serviced by off-chip memory.
    pub l3: bool,
}

/// Result of one data-access poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessOutcome {
    /// `NoStall` once complete.
    pub stall: StallReason,
    /// Loaded word; meaningful only on `NoStall` reads.
    pub value: u32,
    /// Which levels serviced the access; meaningful only on `NoStall`.
    pub hits: HitLevels,
}

impl AccessOutcome {
    /// An incomplete access.
    pub const fn stalled(stall: StallReason) -> Self {
        Self {
            stall,
            value: 0,
            hits: HitLevels {
                l1: false,
                l2: false,
                l3: false,
            },
        }
    }

    /// A completed access.
    pub const fn done(value: u32, hits: HitLevels) -> Self {
        Self {
            stall: StallReason::NoStall,
            value,
            hits,
        }
    }
}

/// Timing model of the memory hierarchy, polled by the pipeline.
///
/// Implementations own the functional backing store as well, so the pipeline reads and writes
/// architectural memory through `functional_read` / `functional_write`.
pub trait CacheModel {
    /// Instruction fetch for the group starting at `req.addr`.
    fn icache_access(&mut self, _req: &AccessRequest) -> StallReason {
        StallReason::NoStall
    }

    /// Cached data read.
    fn read_access(&mut self, req: &AccessRequest) -> AccessOutcome;

    /// Cached data write of `value`; performed functionally once `NoStall` is returned.
    fn write_access(&mut self, req: &AccessRequest, value: u32) -> AccessOutcome;

    /// Uncached global operation. The caller performs the functional effect on `NoStall`.
    fn global_memory_access(&mut self, req: &AccessRequest, tag: MessageTag) -> StallReason;

    /// Non-binding prefetch of the line holding `req.addr`.
    fn prefetch_line(&mut self, req: &AccessRequest) -> StallReason;

    /// Drops the line holding `req.addr` from the issuing core's L1.
    fn invalidate_line(&mut self, req: &AccessRequest) -> StallReason;

    /// Writes the line holding `req.addr` back to the cluster cache.
    fn writeback_line(&mut self, req: &AccessRequest) -> StallReason;

    /// Completes once every outstanding access of `core` has drained.
    fn memory_barrier(&mut self, core: usize, cycle: u64) -> StallReason;

    /// Broadcast store of `value`; the caller writes memory on `NoStall`.
    fn broadcast(&mut self, req: &AccessRequest, value: u32) -> StallReason;

    /// Reads architectural memory without timing.
    fn functional_read(&self, addr: u32) -> u32;

    /// Writes architectural memory without timing.
    fn functional_write(&mut self, addr: u32, value: u32);

    /// Advances internal state by one global cycle.
    fn per_cycle(&mut self, _cycle: u64) {}
}
