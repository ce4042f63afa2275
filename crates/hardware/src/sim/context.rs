//! Simulation Context.
//!
//! Everything the cores share during a run, passed explicitly to every stage instead of
//! living in globals:
//! 1. **Time:** The global cycle and the instruction number counter.
//! 2. **Program:** The image every core fetches from.
//! 3. **Collaborators:** Cache model, task system and syscall handler.
//! 4. **Bookkeeping:** Statistics and load-link reservations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::core::pipeline::instr::InstrNumber;
use crate::isa::Program;
use crate::soc::{CacheModel, SyscallHandler};
use crate::stats::SimStats;
use crate::tq::TaskSystem;

/// Shared state of one simulation run.
pub struct SimContext {
    /// Read-only configuration.
    pub config: Config,
    /// Current global cycle.
    pub cycle: u64,
    /// Number given to the next fetched instruction.
    pub instr_counter: InstrNumber,
    /// Program image.
    pub program: Arc<Program>,
    /// Memory hierarchy.
    pub cache: Box<dyn CacheModel>,
    /// Hardware task queue.
    pub tq: TaskSystem,
    /// Host side of `syscall`.
    pub syscalls: Box<dyn SyscallHandler>,
    /// Counters.
    pub stats: SimStats,
    /// Load-link reservations keyed by `(core, thread)`.
    pub reservations: HashMap<(usize, usize), u32>,
}

impl SimContext {
    /// Creates a context at cycle zero.
    pub fn new(
        config: Config,
        program: Arc<Program>,
        cache: Box<dyn CacheModel>,
        syscalls: Box<dyn SyscallHandler>,
    ) -> Self {
        let tq = TaskSystem::new(&config);
        Self {
            config,
            cycle: 0,
            instr_counter: 0,
            program,
            cache,
            tq,
            syscalls,
            stats: SimStats::default(),
            reservations: HashMap::new(),
        }
    }
}

impl fmt::Debug for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimContext")
            .field("cycle", &self.cycle)
            .field("instr_counter", &self.instr_counter)
            .field("tq", &self.tq)
            .field("reservations", &self.reservations)
            .finish_non_exhaustive()
    }
}
