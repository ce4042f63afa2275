//! Per-thread speculative instruction ring.
//!
//! Holds, oldest first, the handles of a thread's tokens that have been fetched but have
//! not reached the Memory stage. Everything in the ring can still be squashed by a
//! mispredict or a thread switch; tokens leave the ring when they enter Mem.

use std::collections::VecDeque;

use super::arena::InstrId;
use crate::common::error::SimError;

/// Bounded FIFO of speculative token handles.
#[derive(Debug, Clone)]
pub struct SpeculativeRing {
    entries: VecDeque<InstrId>,
    capacity: usize,
    thread: usize,
}

impl SpeculativeRing {
    /// Creates an empty ring for `thread`.
    pub fn new(capacity: usize, thread: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            thread,
        }
    }

    /// Tracked handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum tracked handles.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends the youngest handle.
    pub fn push_back(&mut self, id: InstrId) -> Result<(), SimError> {
        if self.entries.len() >= self.capacity {
            return Err(SimError::SpeculativeRingFull {
                thread: self.thread,
                capacity: self.capacity,
            });
        }
        self.entries.push_back(id);
        Ok(())
    }

    /// Oldest handle.
    pub fn front(&self) -> Option<InstrId> {
        self.entries.front().copied()
    }

    /// Removes the oldest handle.
    pub fn pop_front(&mut self) -> Option<InstrId> {
        self.entries.pop_front()
    }

    /// Removes `id` wherever it is.
    pub fn remove(&mut self, id: InstrId) -> bool {
        match self.entries.iter().position(|e| *e == id) {
            Some(pos) => self.entries.remove(pos).is_some(),
            None => false,
        }
    }

    /// Handles oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::arena::InstrArena;
    use crate::core::pipeline::instr::InstrToken;
    use crate::isa::{Instruction, Opcode};

    #[test]
    fn test_bounded_fifo() {
        let mut arena = InstrArena::new(8);
        let ids: Vec<InstrId> = (0..3)
            .map(|n| {
                arena
                    .alloc(InstrToken::new(n, 0, 0, 0, Instruction::new(Opcode::Nop)))
                    .unwrap()
            })
            .collect();
        let mut ring = SpeculativeRing::new(2, 1);
        ring.push_back(ids[0]).unwrap();
        ring.push_back(ids[1]).unwrap();
        assert!(matches!(
            ring.push_back(ids[2]),
            Err(SimError::SpeculativeRingFull { thread: 1, capacity: 2 })
        ));
        assert!(ring.remove(ids[1]));
        assert_eq!(ring.pop_front(), Some(ids[0]));
        assert!(ring.is_empty());
    }
}
