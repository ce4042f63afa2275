//! Flat Functional Memory.
//!
//! Sparse word-addressed backing store shared by the reference cache models. Unwritten words
//! read as zero.

use std::collections::HashMap;

/// Sparse 32-bit word memory.
#[derive(Debug, Clone, Default)]
pub struct FlatMemory {
    words: HashMap<u32, u32>,
}

impl FlatMemory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the word containing `addr`.
    pub fn read(&self, addr: u32) -> u32 {
        self.words.get(&(addr & !3)).copied().unwrap_or(0)
    }

    /// Writes the word containing `addr`.
    pub fn write(&mut self, addr: u32, value: u32) {
        if value == 0 {
            let _ = self.words.remove(&(addr & !3));
        } else {
            let _ = self.words.insert(addr & !3, value);
        }
    }

    /// Number of non-zero words stored.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether every word is zero.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
