//! Simulator: owns every core and the shared simulation context side by side.
//!
//! Cores never reach each other directly; everything they share (cache model, task
//! queue, statistics) lives in the [`SimContext`] passed into each `per_cycle`. One global
//! cycle runs every core in index order, then the task system's two-phase update, then the
//! cache model's own clock.

use std::sync::Arc;

use tracing::{debug, info};

use super::context::SimContext;
use crate::common::error::SimError;
use crate::config::{Config, MemoryModel};
use crate::core::Core;
use crate::isa::Program;
use crate::soc::{CacheModel, HostSyscalls, IdealCache, LatencyCache, SyscallHandler};
use crate::stats::{SimStats, Stat};

/// Outcome of [`Simulator::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Global cycles simulated.
    pub cycles: u64,
    /// Instructions retired across all cores.
    pub retired: u64,
    /// Whether every thread halted before the cycle limit.
    pub halted: bool,
    /// Retired instructions per cycle.
    pub ipc: f64,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// Every core of the chip.
    pub cores: Vec<Core>,
    /// Shared state threaded through every stage.
    pub ctx: SimContext,
}

impl Simulator {
    /// Builds a simulator for `program` with the cache model named by the configuration.
    ///
    /// # Errors
    ///
    /// `SimError::Config` if the configuration does not validate.
    pub fn new(config: Config, program: Program) -> Result<Self, SimError> {
        let cache: Box<dyn CacheModel> = match config.memory.model {
            MemoryModel::Ideal => Box::new(IdealCache::new()),
            MemoryModel::Latency => Box::new(LatencyCache::new(&config.memory, config.system.num_cores)),
        };
        Self::with_cache_model(config, program, cache)
    }

    /// Builds a simulator around a caller-supplied cache model.
    ///
    /// # Errors
    ///
    /// `SimError::Config` if the configuration does not validate.
    pub fn with_cache_model(config: Config, program: Program, mut cache: Box<dyn CacheModel>) -> Result<Self, SimError> {
        config.validate()?;
        for &(addr, word) in &program.data {
            cache.functional_write(addr, word);
        }
        let cores = (0..config.system.num_cores)
            .map(|id| Core::new(&config, id, program.entry))
            .collect();
        let ctx = SimContext::new(config, Arc::new(program), cache, Box::new(HostSyscalls::new()));
        Ok(Self { cores, ctx })
    }

    /// Replaces the syscall handler.
    #[must_use]
    pub fn with_syscalls(mut self, syscalls: Box<dyn SyscallHandler>) -> Self {
        self.ctx.syscalls = syscalls;
        self
    }

    /// Current global cycle.
    pub fn cycle(&self) -> u64 {
        self.ctx.cycle
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &SimStats {
        &self.ctx.stats
    }

    /// Console output produced by the program.
    pub fn output(&self) -> &str {
        self.ctx.syscalls.output()
    }

    /// Whether every thread of every core has halted.
    pub fn is_halted(&self) -> bool {
        self.cores.iter().all(Core::is_halted)
    }

    /// Advances the whole chip by one clock cycle.
    ///
    /// # Errors
    ///
    /// The first fatal condition raised by any core.
    pub fn tick(&mut self) -> Result<(), SimError> {
        for core in &mut self.cores {
            core.per_cycle(&mut self.ctx)?;
        }
        self.ctx.tq.per_cycle();
        self.ctx.tq.clock();
        self.ctx.cache.per_cycle(self.ctx.cycle);
        self.ctx.stats.inc(Stat::Cycles);
        self.ctx.cycle += 1;
        Ok(())
    }

    /// Runs until every thread halts or the cycle limit is reached.
    ///
    /// # Errors
    ///
    /// The first fatal condition raised by any core. Statistics stay readable afterwards.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        let limit = self.ctx.config.general.max_cycles;
        info!(cores = self.cores.len(), limit, "simulation start");
        let result = self.run_loop(limit);
        self.sync_task_stats();
        result?;
        let summary = self.summary();
        info!(cycles = summary.cycles, retired = summary.retired, ipc = summary.ipc, "simulation end");
        Ok(summary)
    }

    fn run_loop(&mut self, limit: u64) -> Result<(), SimError> {
        while !self.is_halted() {
            if self.ctx.cycle >= limit {
                debug!(cycle = self.ctx.cycle, "cycle limit reached");
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.ctx.cycle,
            retired: self.cores.iter().map(Core::retired).sum(),
            halted: self.is_halted(),
            ipc: self.ctx.stats.ipc(),
        }
    }

    /// Copies the task system's counters into the statistics.
    pub fn sync_task_stats(&mut self) {
        let tq = self.ctx.tq.counters();
        let affinity = self.ctx.tq.affinity_counters();
        let stats = &mut self.ctx.stats;
        stats.set(Stat::TqEnqueued, tq.enqueued);
        stats.set(Stat::TqDequeued, tq.dequeued);
        stats.set(Stat::TqOverflows, tq.overflows);
        stats.set(Stat::TqBlocked, tq.blocked);
        stats.set(Stat::TqSyncs, tq.syncs);
        stats.set(Stat::TqAffinityHits, affinity.with_affinity);
        stats.set(Stat::TqAffinityMisses, affinity.without_affinity);
    }

    /// Renders the state of every core.
    pub fn dump_state(&self) -> String {
        self.cores.iter().map(Core::dump_state).collect()
    }
}
