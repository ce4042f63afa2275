//! Ideal cache model: every access completes on its first poll.

use super::cache_model::{AccessOutcome, AccessRequest, CacheModel, HitLevels, MessageTag, StallReason};
use super::flat::FlatMemory;

/// Zero-stall memory hierarchy over a flat store.
#[derive(Debug, Clone, Default)]
pub struct IdealCache {
    memory: FlatMemory,
}

impl IdealCache {
    /// Creates an ideal model with empty memory.
    pub fn new() -> Self {
        Self::default()
    }
}

const L1_HIT: HitLevels = HitLevels {
    l1: true,
    l2: false,
    l3: false,
};

impl CacheModel for IdealCache {
    fn read_access(&mut self, req: &AccessRequest) -> AccessOutcome {
        AccessOutcome::done(self.memory.read(req.addr), L1_HIT)
    }

    fn write_access(&mut self, req: &AccessRequest, value: u32) -> AccessOutcome {
        self.memory.write(req.addr, value);
        AccessOutcome::done(value, L1_HIT)
    }

    fn global_memory_access(&mut self, _req: &AccessRequest, _tag: MessageTag) -> StallReason {
        StallReason::NoStall
    }

    fn prefetch_line(&mut self, _req: &AccessRequest) -> StallReason {
        StallReason::NoStall
    }

    fn invalidate_line(&mut self, _req: &AccessRequest) -> StallReason {
        StallReason::NoStall
    }

    fn writeback_line(&mut self, _req: &AccessRequest) -> StallReason {
        StallReason::NoStall
    }

    fn memory_barrier(&mut self, _core: usize, _cycle: u64) -> StallReason {
        StallReason::NoStall
    }

    fn broadcast(&mut self, _req: &AccessRequest, _value: u32) -> StallReason {
        StallReason::NoStall
    }

    fn functional_read(&self, addr: u32) -> u32 {
        self.memory.read(addr)
    }

    fn functional_write(&mut self, addr: u32, value: u32) {
        self.memory.write(addr, value);
    }
}
