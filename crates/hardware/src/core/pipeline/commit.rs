//! Retirement order policy.
//!
//! WriteBack reports every retirement to a [`CommitTracker`]. Under the in-order policy a
//! thread must retire its instructions in fetch order and any violation aborts the run.
//! The non-blocking memory path lets parked memory operations rejoin the pipeline at
//! WriteBack out of program order; under that policy out-of-order retirements are counted
//! instead of rejected.

use crate::common::error::SimError;
use crate::core::pipeline::instr::InstrNumber;

/// How retirement order is enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Instruction numbers of one thread retire strictly increasing.
    InOrder,
    /// Memory operations may retire after younger instructions.
    OutOfOrderMemory,
}

impl CommitPolicy {
    /// Policy implied by the memory mode.
    pub fn for_memory_mode(non_blocking: bool) -> Self {
        if non_blocking {
            CommitPolicy::OutOfOrderMemory
        } else {
            CommitPolicy::InOrder
        }
    }
}

/// Last retired instruction number per thread.
#[derive(Clone, Debug)]
pub struct CommitTracker {
    policy: CommitPolicy,
    last: Vec<Option<InstrNumber>>,
}

impl CommitTracker {
    /// Tracker for `threads` hardware threads.
    pub fn new(policy: CommitPolicy, threads: usize) -> Self {
        Self {
            policy,
            last: vec![None; threads],
        }
    }

    /// Active policy.
    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Records the retirement of `number` on `thread`.
    ///
    /// # Returns
    ///
    /// `true` when the retirement overtook an older one (only possible under
    /// `OutOfOrderMemory`).
    pub fn on_retire(&mut self, thread: usize, number: InstrNumber) -> Result<bool, SimError> {
        let Some(last) = self.last.get_mut(thread) else {
            return Ok(false);
        };
        match *last {
            Some(prev) if number <= prev => match self.policy {
                CommitPolicy::InOrder => Err(SimError::RetireOrder {
                    thread,
                    prev,
                    got: number,
                }),
                CommitPolicy::OutOfOrderMemory => Ok(true),
            },
            _ => {
                *last = Some(number);
                Ok(false)
            }
        }
    }
}
