//! Hardware Thread Context.
//!
//! Everything a core keeps per hardware thread. Control state is a set of independent
//! flags rather than one enum: a thread can be serializing and switched out at the same
//! time, and halting is terminal until the end of the run.

use crate::common::constants::{
    SPR_CLUSTER_ID, SPR_CORE_ID, SPR_NUM_CORES, SPR_THREAD_ID, SPR_THREADS_PER_CORE, VECTOR_LANES,
};
use crate::common::reg::{RegisterFile, SprFile};
use crate::config::Config;
use crate::core::pipeline::instr::InstrNumber;
use crate::core::pipeline::scoreboard::ScoreBoard;
use crate::core::pipeline::signals::FetchSignals;
use crate::core::pipeline::speculative::SpeculativeRing;
use crate::core::units::bru::Btb;

/// Per-thread architectural and pipeline-control state.
#[derive(Debug, Clone)]
pub struct ThreadContext {
    /// Hardware thread index within the core.
    pub id: usize,
    /// Next sequential fetch address.
    pub pc: u32,
    /// Scalar and vector registers.
    pub regs: RegisterFile,
    /// Special-purpose registers.
    pub sprs: SprFile,
    /// Hazard tracker over every scalar register and vector lane.
    pub scoreboard: ScoreBoard,
    /// Fetched tokens that have not reached Mem.
    pub ring: SpeculativeRing,
    /// Redirect requested by Execute.
    pub signals: FetchSignals,
    /// Branch target buffer.
    pub btb: Btb,
    /// Retired `hlt` or an exit syscall.
    pub halted: bool,
    /// Outstanding load, if any.
    pub load_pending: Option<InstrNumber>,
    /// Retired `sync`, waiting for the other threads.
    pub sync_req: bool,
    /// A serializing instruction is in flight; fetch is paused.
    pub serializing: bool,
    /// Descheduled after a data cache miss.
    pub switched_out: bool,
    /// `mtsr` / `tqdeq` instructions executed but not retired.
    pub pending_spr_writes: u32,
    /// Cycles left before the thread is declared deadlocked.
    pub watchdog: u64,
    /// Instructions retired.
    pub retired: u64,
    /// Polling the task queue.
    pub waiting_on_tq: bool,
    /// Retired something this cycle.
    pub retired_this_cycle: bool,
}

impl ThreadContext {
    /// Creates thread `id` of `core`, starting at `entry`.
    pub fn new(config: &Config, core: usize, id: usize, entry: u32) -> Self {
        let regs = RegisterFile::new(
            config.registers.scalar_regs,
            config.registers.vector_regs,
            core,
            id,
        );
        let slots = config.registers.scalar_regs + config.registers.vector_regs * VECTOR_LANES;
        let pipeline = &config.pipeline;
        let mut sprs = SprFile::default();
        sprs.write(SPR_CORE_ID, core as u32);
        sprs.write(SPR_THREAD_ID, id as u32);
        sprs.write(SPR_CLUSTER_ID, config.cluster_of(core) as u32);
        sprs.write(SPR_NUM_CORES, config.system.num_cores as u32);
        sprs.write(SPR_THREADS_PER_CORE, config.system.threads_per_core as u32);
        Self {
            id,
            pc: entry,
            regs,
            sprs,
            scoreboard: ScoreBoard::new(
                slots,
                config.registers.skip_zero_register,
                pipeline.multi_cycle_alu,
                pipeline.bypass,
            ),
            ring: SpeculativeRing::new(3 * pipeline.issue_width, id),
            signals: FetchSignals::default(),
            btb: Btb::new(pipeline.btb_size, pipeline.btb_confidence_max),
            halted: false,
            load_pending: None,
            sync_req: false,
            serializing: false,
            switched_out: false,
            pending_spr_writes: 0,
            watchdog: config.general.watchdog_cycles,
            retired: 0,
            waiting_on_tq: false,
            retired_this_cycle: false,
        }
    }

    /// Whether Fetch may pick this thread.
    pub fn can_fetch(&self) -> bool {
        !self.halted && !self.serializing && !self.switched_out && !self.sync_req
    }

    /// Address Fetch would use next.
    pub fn fetch_pc(&self) -> u32 {
        if self.signals.fixup_needed {
            self.signals.fixup_pc
        } else {
            self.pc
        }
    }

    /// Whether the watchdog should count this cycle against the thread.
    pub fn watched(&self) -> bool {
        !self.halted && !self.sync_req && !self.waiting_on_tq && !self.retired_this_cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_sprs_are_preset() {
        let mut config = Config::default();
        config.system.num_cores = 4;
        config.system.threads_per_core = 2;
        config.system.cores_per_cluster = 2;
        let t = ThreadContext::new(&config, 3, 1, 0x40);
        assert_eq!(t.sprs.read(SPR_CORE_ID), 3);
        assert_eq!(t.sprs.read(SPR_THREAD_ID), 1);
        assert_eq!(t.sprs.read(SPR_CLUSTER_ID), 1);
        assert_eq!(t.sprs.read(SPR_NUM_CORES), 4);
        assert_eq!(t.fetch_pc(), 0x40);
        assert_eq!(t.scoreboard.len(), 32 + 16 * 4);
    }

    #[test]
    fn test_fixup_overrides_sequential_pc() {
        let mut t = ThreadContext::new(&Config::default(), 0, 0, 0);
        t.pc = 0x10;
        t.signals.redirect(0x2000);
        assert_eq!(t.fetch_pc(), 0x2000);
        t.signals.clear();
        assert_eq!(t.fetch_pc(), 0x10);
    }
}
