//! Register Hazard Scoreboard.
//!
//! One entry per register slot of a hardware thread (scalar registers followed by every
//! vector lane). Each entry tracks:
//! 1. **Use Count:** Outstanding producers; a register with producers in flight can only be
//!    read through the bypass network.
//! 2. **Lock:** A hard block for long-latency results (loads, atomics, task-queue dequeues)
//!    whose value is unknown until the memory system answers.
//! 3. **Bypass:** The forwarded value, the number of producers that published one, and the
//!    cycle from which it may be read.
//!
//! A drain barrier makes every `check` fail until the last producer has released, at which
//! point the table is cleared in one shot.

use std::fmt::Write as _;

use tracing::{trace, warn};

use crate::common::constants::ZERO_REG;
use crate::common::error::SimError;
use crate::config::BypassPolicy;

/// Hazard state of one register slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreboardEntry {
    /// First cycle the bypassed value may be read.
    pub ready_cycle: u64,
    /// Producers acquired and not yet released.
    pub use_count: u32,
    /// Hard long-latency block.
    pub locked: bool,
    /// Most recently published bypass value.
    pub bypass_value: u32,
    /// Producers whose value is on the bypass network.
    pub bypass_count: u32,
}

impl ScoreboardEntry {
    fn is_idle(&self) -> bool {
        self.use_count == 0 && !self.locked
    }
}

/// Per-thread hazard tracker.
#[derive(Clone, Debug)]
pub struct ScoreBoard {
    entries: Vec<ScoreboardEntry>,
    skip_zero: bool,
    multi_cycle_alu: bool,
    policy: BypassPolicy,
    draining: bool,
}

impl ScoreBoard {
    /// Creates a scoreboard of `size` idle entries.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of register slots tracked.
    /// * `skip_zero` - Treat slot 0 as always available and never tracked.
    /// * `multi_cycle_alu` - Publish results `latency` cycles after acquisition instead of
    ///   immediately.
    /// * `policy` - Bypass network policy.
    pub fn new(size: usize, skip_zero: bool, multi_cycle_alu: bool, policy: BypassPolicy) -> Self {
        Self {
            entries: vec![ScoreboardEntry::default(); size],
            skip_zero,
            multi_cycle_alu,
            policy,
            draining: false,
        }
    }

    /// Number of tracked slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the scoreboard tracks no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn skipped(&self, reg: usize) -> bool {
        self.skip_zero && reg == ZERO_REG
    }

    fn entry(&self, reg: usize) -> Result<&ScoreboardEntry, SimError> {
        self.entries.get(reg).ok_or(SimError::RegisterOutOfRange {
            reg,
            size: self.entries.len(),
        })
    }

    fn entry_mut(&mut self, reg: usize) -> Result<&mut ScoreboardEntry, SimError> {
        let size = self.entries.len();
        self.entries
            .get_mut(reg)
            .ok_or(SimError::RegisterOutOfRange { reg, size })
    }

    /// Whether `reg` may be read at cycle `now`.
    pub fn check(&self, reg: usize, now: u64) -> Result<bool, SimError> {
        let e = self.entry(reg)?;
        if self.draining {
            return Ok(false);
        }
        if self.skipped(reg) {
            return Ok(true);
        }
        if e.locked {
            return Ok(false);
        }
        if e.use_count == 0 {
            return Ok(true);
        }
        Ok(self.policy == BypassPolicy::Full && e.bypass_count > 0 && e.ready_cycle <= now)
    }

    /// Registers a producer of `reg` whose `value` is known now.
    ///
    /// The value becomes bypass-readable at `now`, or at `now + latency` in multi-cycle ALU
    /// mode.
    pub fn acquire(&mut self, reg: usize, value: u32, now: u64, latency: u64) -> Result<(), SimError> {
        if self.skipped(reg) {
            return Ok(());
        }
        let multi_cycle = self.multi_cycle_alu;
        let bypass = self.policy == BypassPolicy::Full;
        let e = self.entry_mut(reg)?;
        e.use_count += 1;
        e.ready_cycle = if multi_cycle { now + latency } else { now };
        if bypass {
            e.bypass_value = value;
            e.bypass_count += 1;
        }
        trace!(reg, value, ready = e.ready_cycle, "sb acquire");
        Ok(())
    }

    /// Registers a producer of `reg` whose value is not known yet, and locks the register.
    pub fn acquire_locked(&mut self, reg: usize) -> Result<(), SimError> {
        if self.skipped(reg) {
            return Ok(());
        }
        self.lock(reg)?;
        self.entry_mut(reg)?.use_count += 1;
        Ok(())
    }

    /// Retires one producer of `reg`.
    pub fn release(&mut self, reg: usize) -> Result<(), SimError> {
        if self.skipped(reg) {
            return Ok(());
        }
        let e = self.entry_mut(reg)?;
        if e.use_count == 0 {
            return Err(SimError::NegativeUseCount { reg });
        }
        e.use_count -= 1;
        e.bypass_count = e.bypass_count.saturating_sub(1);
        if self.draining && self.is_idle() {
            self.clear();
        }
        Ok(())
    }

    /// Locks `reg`.
    pub fn lock(&mut self, reg: usize) -> Result<(), SimError> {
        if self.skipped(reg) {
            return Ok(());
        }
        let e = self.entry_mut(reg)?;
        if e.locked {
            return Err(SimError::DoubleLock { reg });
        }
        e.locked = true;
        Ok(())
    }

    /// Unlocks `reg`.
    ///
    /// Unlocking an unlocked register is fatal under the full bypass policy and only
    /// logged when bypassing is disabled.
    pub fn unlock(&mut self, reg: usize) -> Result<(), SimError> {
        if self.skipped(reg) {
            return Ok(());
        }
        let policy = self.policy;
        let e = self.entry_mut(reg)?;
        if !e.locked {
            if policy == BypassPolicy::Full {
                return Err(SimError::UnlockWhileUnlocked { reg });
            }
            warn!(reg, "unlock of unlocked register tolerated without bypass");
        }
        e.locked = false;
        Ok(())
    }

    /// Whether `reg` is locked.
    pub fn is_locked(&self, reg: usize) -> bool {
        !self.skipped(reg) && self.entries.get(reg).is_some_and(|e| e.locked)
    }

    /// Bypassed value of `reg`, or zero when nothing is on the bypass network.
    pub fn forward(&self, reg: usize) -> u32 {
        self.entries
            .get(reg)
            .filter(|e| e.bypass_count > 0)
            .map_or(0, |e| e.bypass_value)
    }

    /// Whether a read of `reg` is served by the bypass network rather than the register file.
    pub fn bypassed(&self, reg: usize) -> bool {
        !self.skipped(reg) && self.entries.get(reg).is_some_and(|e| e.use_count > 0 && e.bypass_count > 0)
    }

    /// Publishes the value of a locked producer of `reg` once memory has answered.
    ///
    /// # Returns
    ///
    /// `true` if the register was unlocked (full bypass policy); otherwise the lock is left
    /// for WriteBack to clear.
    pub fn upgrade(&mut self, reg: usize, value: u32, now: u64) -> Result<bool, SimError> {
        if self.skipped(reg) {
            return Ok(false);
        }
        let unlock = self.policy == BypassPolicy::Full;
        let e = self.entry_mut(reg)?;
        e.bypass_value = value;
        e.bypass_count += 1;
        e.ready_cycle = now;
        if unlock {
            e.locked = false;
        }
        trace!(reg, value, "sb upgrade");
        Ok(unlock)
    }

    /// Starts a drain barrier. Clears immediately if nothing is in flight.
    pub fn begin_drain(&mut self) {
        if self.is_idle() {
            self.clear();
        } else {
            self.draining = true;
        }
    }

    /// Whether a drain barrier is active.
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Whether no register has a producer in flight.
    pub fn is_idle(&self) -> bool {
        self.entries.iter().all(ScoreboardEntry::is_idle)
    }

    /// Entry of `reg`, for inspection.
    pub fn entry_at(&self, reg: usize) -> Option<&ScoreboardEntry> {
        self.entries.get(reg)
    }

    fn clear(&mut self) {
        self.entries.fill(ScoreboardEntry::default());
        self.draining = false;
    }

    /// Renders every non-idle entry.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.draining {
            out.push_str(" [draining]");
        }
        for (i, e) in self.entries.iter().enumerate().filter(|(_, e)| !e.is_idle() || e.bypass_count > 0) {
            let _ = write!(
                out,
                " {i}:use={} lock={} byp={}x{:#x}@{}",
                e.use_count, e.locked, e.bypass_count, e.bypass_value, e.ready_cycle
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sb(policy: BypassPolicy) -> ScoreBoard {
        ScoreBoard::new(8, true, true, policy)
    }

    #[test]
    fn test_bypass_after_latency() {
        let mut s = sb(BypassPolicy::Full);
        s.acquire(3, 42, 10, 2).unwrap();
        assert!(!s.check(3, 11).unwrap());
        assert!(s.check(3, 12).unwrap());
        assert_eq!(s.forward(3), 42);
        s.release(3).unwrap();
        assert!(s.check(3, 12).unwrap());
        assert_eq!(s.forward(3), 0);
    }

    #[test]
    fn test_no_bypass_waits_for_release() {
        let mut s = sb(BypassPolicy::Disabled);
        s.acquire(3, 42, 10, 0).unwrap();
        assert!(!s.check(3, 100).unwrap());
        s.release(3).unwrap();
        assert!(s.check(3, 100).unwrap());
    }

    #[test]
    fn test_release_without_acquire_is_fatal() {
        let mut s = sb(BypassPolicy::Full);
        assert!(matches!(s.release(2), Err(SimError::NegativeUseCount { reg: 2 })));
    }

    #[test]
    fn test_zero_register_is_untracked() {
        let mut s = sb(BypassPolicy::Full);
        s.acquire_locked(0).unwrap();
        s.release(0).unwrap();
        s.release(0).unwrap();
        assert!(s.check(0, 0).unwrap());
        assert!(s.is_idle());
    }

    #[test]
    fn test_upgrade_unlocks_only_with_bypass() {
        let mut full = sb(BypassPolicy::Full);
        full.acquire_locked(4).unwrap();
        assert!(!full.check(4, 5).unwrap());
        assert!(full.upgrade(4, 7, 5).unwrap());
        assert!(full.check(4, 5).unwrap());
        assert_eq!(full.forward(4), 7);

        let mut off = sb(BypassPolicy::Disabled);
        off.acquire_locked(4).unwrap();
        assert!(!off.upgrade(4, 7, 5).unwrap());
        assert!(off.is_locked(4));
        off.unlock(4).unwrap();
        // Tolerated without bypass.
        off.unlock(4).unwrap();
        off.release(4).unwrap();
    }

    #[test]
    fn test_double_unlock_is_fatal_with_bypass() {
        let mut s = sb(BypassPolicy::Full);
        s.lock(1).unwrap();
        assert!(matches!(s.lock(1), Err(SimError::DoubleLock { reg: 1 })));
        s.unlock(1).unwrap();
        assert!(matches!(s.unlock(1), Err(SimError::UnlockWhileUnlocked { reg: 1 })));
    }

    #[test]
    fn test_drain_clears_when_last_producer_releases() {
        let mut s = sb(BypassPolicy::Full);
        s.acquire(1, 1, 0, 0).unwrap();
        s.acquire(2, 2, 0, 0).unwrap();
        s.begin_drain();
        assert!(!s.check(5, 10).unwrap());
        s.release(1).unwrap();
        assert!(s.is_draining());
        s.release(2).unwrap();
        assert!(!s.is_draining());
        assert!(s.check(5, 10).unwrap());
        assert_eq!(s.entry_at(1), Some(&ScoreboardEntry::default()));
    }

    #[test]
    fn test_out_of_range_register() {
        let s = sb(BypassPolicy::Full);
        assert!(matches!(s.check(8, 0), Err(SimError::RegisterOutOfRange { reg: 8, size: 8 })));
    }
}
