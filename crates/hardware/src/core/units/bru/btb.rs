//! Branch Target Buffer (BTB).
//!
//! A small associative cache of `pc -> target` mappings consulted by Fetch. It is:
//! 1. **Hash-indexed:** Entries are keyed directly by the branch pc.
//! 2. **Capacity-bounded:** Inserting into a full buffer evicts the entry with the oldest
//!    `last_access` cycle.
//! 3. **Confidence-counted:** Each entry carries a saturating counter that is bumped on a
//!    correct taken prediction and decremented on a wrong one; an entry whose counter drops
//!    to zero is removed.

use std::collections::HashMap;

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BtbEntry {
    /// Predicted target address.
    pub target: u32,
    /// Cycle of the last lookup hit or update.
    pub last_access: u64,
    /// Saturating hit/confidence counter.
    pub confidence: u8,
}

/// Branch Target Buffer structure.
#[derive(Clone, Debug)]
pub struct Btb {
    entries: HashMap<u32, BtbEntry>,
    capacity: usize,
    confidence_max: u8,
}

impl Btb {
    /// Creates an empty BTB.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of entries.
    /// * `confidence_max` - Saturation value of the confidence counter.
    pub fn new(capacity: usize, confidence_max: u8) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity: capacity.max(1),
            confidence_max: confidence_max.max(1),
        }
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a target for `pc`, refreshing the entry's access time on a hit.
    pub fn lookup(&mut self, pc: u32, cycle: u64) -> Option<u32> {
        let e = self.entries.get_mut(&pc)?;
        e.last_access = cycle;
        Some(e.target)
    }

    /// Entry for `pc`, without touching its access time.
    pub fn entry(&self, pc: u32) -> Option<&BtbEntry> {
        self.entries.get(&pc)
    }

    /// Records that the branch at `pc` was taken to `target`.
    ///
    /// An existing entry with the same target gains confidence; a changed target
    /// restarts the counter. A new entry into a full buffer evicts the least recently
    /// accessed one.
    pub fn update(&mut self, pc: u32, target: u32, cycle: u64) {
        if let Some(e) = self.entries.get_mut(&pc) {
            if e.target == target {
                e.confidence = e.confidence.saturating_add(1).min(self.confidence_max);
            } else {
                e.target = target;
                e.confidence = 1;
            }
            e.last_access = cycle;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let _ = self.entries.insert(
            pc,
            BtbEntry {
                target,
                last_access: cycle,
                confidence: 1,
            },
        );
    }

    /// Records a wrong prediction for `pc`.
    pub fn penalize(&mut self, pc: u32) {
        if let Some(e) = self.entries.get_mut(&pc) {
            e.confidence = e.confidence.saturating_sub(1);
            if e.confidence == 0 {
                let _ = self.entries.remove(&pc);
            }
        }
    }

    /// Pc of the entry the next insertion into a full buffer would evict.
    pub fn lru_victim(&self) -> Option<u32> {
        self.entries
            .iter()
            .min_by_key(|(pc, e)| (e.last_access, **pc))
            .map(|(pc, _)| *pc)
    }

    fn evict_lru(&mut self) {
        if let Some(pc) = self.lru_victim() {
            let _ = self.entries.remove(&pc);
        }
    }
}
