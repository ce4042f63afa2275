//! Instruction Arena.
//!
//! Fixed-capacity slot storage for in-flight instruction tokens. Latches, speculative
//! rings and the non-blocking memory list refer to tokens by [`InstrId`], a slot index plus
//! a generation that is bumped every time the slot is freed, so a handle that outlived its
//! token is detected instead of silently aliasing a newer one.

use super::instr::InstrToken;
use crate::common::error::SimError;

/// Stable handle to an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId {
    index: u32,
    generation: u32,
}

impl InstrId {
    /// Slot index.
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    token: Option<InstrToken>,
}

/// Slot array with a free list.
#[derive(Debug, Clone)]
pub struct InstrArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl InstrArena {
    /// Creates an arena of `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity],
            free: (0..capacity as u32).rev().collect(),
        }
    }

    /// Total slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live tokens.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no token is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `token` in a free slot.
    pub fn alloc(&mut self, token: InstrToken) -> Result<InstrId, SimError> {
        let index = self.free.pop().ok_or(SimError::InstrArenaExhausted {
            capacity: self.slots.len(),
        })?;
        let slot = &mut self.slots[index as usize];
        slot.token = Some(token);
        Ok(InstrId {
            index,
            generation: slot.generation,
        })
    }

    fn stale(id: InstrId) -> SimError {
        SimError::StaleInstrHandle {
            index: id.index,
            generation: id.generation,
        }
    }

    /// Token behind `id`.
    pub fn get(&self, id: InstrId) -> Result<&InstrToken, SimError> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.token.as_ref())
            .ok_or(Self::stale(id))
    }

    /// Mutable token behind `id`.
    pub fn get_mut(&mut self, id: InstrId) -> Result<&mut InstrToken, SimError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.token.as_mut())
            .ok_or(Self::stale(id))
    }

    /// Whether `id` still refers to a live token.
    pub fn contains(&self, id: InstrId) -> bool {
        self.get(id).is_ok()
    }

    /// Removes and returns the token behind `id`, invalidating every copy of the handle.
    pub fn free(&mut self, id: InstrId) -> Result<InstrToken, SimError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .ok_or(Self::stale(id))?;
        let token = slot.token.take().ok_or(Self::stale(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(token)
    }

    /// Live tokens with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (InstrId, &InstrToken)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.token.as_ref().map(|t| {
                (
                    InstrId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    t,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{Instruction, Opcode};

    fn token(n: u64) -> InstrToken {
        InstrToken::new(n, 0, 0, 0, Instruction::new(Opcode::Nop))
    }

    #[test]
    fn test_freed_handles_go_stale() {
        let mut arena = InstrArena::new(1);
        let a = arena.alloc(token(1)).unwrap();
        assert_eq!(arena.free(a).unwrap().number, 1);
        let b = arena.alloc(token(2)).unwrap();
        assert_eq!(a.index(), b.index());
        assert!(matches!(arena.get(a), Err(SimError::StaleInstrHandle { .. })));
        assert_eq!(arena.get(b).unwrap().number, 2);
        assert!(arena.free(a).is_err());
    }

    #[test]
    fn test_exhaustion() {
        let mut arena = InstrArena::new(2);
        let _ = arena.alloc(token(1)).unwrap();
        let _ = arena.alloc(token(2)).unwrap();
        assert!(matches!(
            arena.alloc(token(3)),
            Err(SimError::InstrArenaExhausted { capacity: 2 })
        ));
        assert_eq!(arena.len(), 2);
    }
}
