//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the Rigel simulator. It provides:
//! 1. **Named Counters:** A closed set of `Stat` counters incremented by the pipeline stages,
//!    the task queue and the cache models.
//! 2. **Stall Histogram:** Cycles attributed to each memory `StallReason`.
//! 3. **Memory Histogram:** Data accesses bucketed by cache line.
//! 4. **Reporting:** Sectioned text output and a JSON document for tooling.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::soc::cache_model::StallReason;

macro_rules! stats {
    ($($(#[$meta:meta])* $variant:ident => ($name:literal, $section:literal),)*) => {
        /// Identifier of a statistics counter.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Stat {
            $($(#[$meta])* $variant,)*
        }

        impl Stat {
            /// Every counter in declaration order.
            pub const ALL: &'static [Stat] = &[$(Stat::$variant,)*];

            /// Number of counters.
            pub const COUNT: usize = Self::ALL.len();

            /// Dotted report name of the counter.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Stat::$variant => $name,)*
                }
            }

            /// Report section the counter is printed under.
            pub const fn section(self) -> &'static str {
                match self {
                    $(Stat::$variant => $section,)*
                }
            }
        }
    };
}

stats! {
    /// Global cycles simulated.
    Cycles => ("sim.cycles", "summary"),
    /// Instructions retired across all cores.
    InstrRetired => ("sim.insts", "summary"),
    /// Instructions fetched, including ones later squashed.
    InstrFetched => ("fetch.insts", "core"),
    /// Fresh fetch groups discarded because Decode held.
    FetchDiscarded => ("fetch.discarded", "core"),
    /// Fetch groups cut to one instruction by an unaligned target.
    UnalignedFetch => ("fetch.unaligned_bubble", "core"),
    /// Cycles the instruction cache stalled fetch.
    FetchIcacheStall => ("fetch.icache_stall", "core"),
    /// Tokens squashed on a wrong path.
    InstrFlushed => ("pipe.flushed", "core"),
    /// Retirements that overtook an older instruction of the same thread.
    OutOfOrderRetire => ("pipe.out_of_order_retire", "core"),
    /// Memory operations parked on the non-blocking side list.
    NonBlockingParked => ("pipe.nonblocking_parked", "core"),
    /// Switch-on-miss thread switches.
    ThreadSwitches => ("pipe.thread_switches", "core"),
    /// Threads halted.
    ThreadsHalted => ("pipe.threads_halted", "core"),
    /// Completed `sync` rendezvous.
    SyncRendezvous => ("pipe.sync_rendezvous", "core"),
    /// Scoreboard drains started after a mispredict.
    ScoreboardDrains => ("pipe.scoreboard_drains", "core"),
    /// Retired integer ALU, compare and multiply instructions.
    RetiredAlu => ("mix.alu", "mix"),
    /// Retired scalar floating-point instructions.
    RetiredFp => ("mix.fp", "mix"),
    /// Retired vector instructions.
    RetiredVector => ("mix.vector", "mix"),
    /// Retired branches and jumps.
    RetiredBranch => ("mix.branch", "mix"),
    /// Retired local loads.
    RetiredLoad => ("mix.load", "mix"),
    /// Retired local stores.
    RetiredStore => ("mix.store", "mix"),
    /// Retired global loads and stores.
    RetiredGlobal => ("mix.global", "mix"),
    /// Retired atomics.
    RetiredAtomic => ("mix.atomic", "mix"),
    /// Retired task queue operations.
    RetiredTaskQueue => ("mix.task_queue", "mix"),
    /// Retired system calls.
    RetiredSyscall => ("mix.syscall", "mix"),
    /// Retired instructions of any other class.
    RetiredOther => ("mix.other", "mix"),
    /// Branches resolved in Execute.
    BranchResolved => ("branch.resolved", "branch"),
    /// Branches whose resolved target differed from the fetch prediction.
    BranchMispredict => ("branch.mispredicted", "branch"),
    /// BTB lookups that returned a target.
    BtbHit => ("branch.btb_hit", "branch"),
    /// BTB lookups that missed.
    BtbMiss => ("branch.btb_miss", "branch"),
    /// Lane stalls waiting on a source operand.
    StallRegDependency => ("stall.reg_dependency", "stall"),
    /// Lane stalls because a destination was locked by an older load.
    StallWaw => ("stall.waw_lock", "stall"),
    /// Lane stalls held behind an older stalled lane.
    StallLaneOrder => ("stall.lane_order", "stall"),
    /// Lane stalls with the scoreboard draining.
    StallDrain => ("stall.drain", "stall"),
    /// ALU structural conflicts.
    StallFuAlu => ("stall.fu_alu", "stall"),
    /// FPU structural conflicts.
    StallFuFpu => ("stall.fu_fpu", "stall"),
    /// Shifter structural conflicts.
    StallFuShifter => ("stall.fu_shifter", "stall"),
    /// Branch unit structural conflicts.
    StallFuBranch => ("stall.fu_branch", "stall"),
    /// Memory port structural conflicts.
    StallFuMem => ("stall.fu_mem", "stall"),
    /// Lane stalls on multi-lane vector work.
    StallVector => ("stall.vector", "stall"),
    /// Lane stalls waiting for FP completion.
    StallFpLatency => ("stall.fp_latency", "stall"),
    /// Lane stalls on a second outstanding load of the same thread.
    StallLoadPending => ("stall.load_pending", "stall"),
    /// Lane stalls waiting on the cache model.
    StallMemory => ("stall.memory", "stall"),
    /// Lane stalls waiting on the task queue.
    StallTaskQueue => ("stall.task_queue", "stall"),
    /// Lane stalls for the system-call cycle.
    StallSyscall => ("stall.syscall", "stall"),
    /// Lane stalls of `mfsr` behind an in-flight `mtsr`.
    StallSpr => ("stall.spr", "stall"),
    /// Data reads issued to the cache model.
    MemReads => ("mem.reads", "memory"),
    /// Data writes issued to the cache model.
    MemWrites => ("mem.writes", "memory"),
    /// Global operations and atomics issued.
    MemGlobal => ("mem.global", "memory"),
    /// Accesses satisfied by L1.
    L1Hits => ("mem.l1_hits", "memory"),
    /// Accesses satisfied by the cluster cache.
    L2Hits => ("mem.l2_hits", "memory"),
    /// Accesses satisfied by off-chip memory.
    L3Hits => ("mem.l3_hits", "memory"),
    /// Tasks accepted by the queue.
    TqEnqueued => ("tq.enqueued", "tq"),
    /// Tasks handed out by the queue.
    TqDequeued => ("tq.dequeued", "tq"),
    /// Enqueue requests rejected for lack of space.
    TqOverflows => ("tq.overflows", "tq"),
    /// Dequeues that found the queue empty.
    TqBlocked => ("tq.blocked", "tq"),
    /// Barrier rendezvous detected.
    TqSyncs => ("tq.syncs", "tq"),
    /// Dequeues chosen by affinity.
    TqAffinityHits => ("tq.affinity_hits", "tq"),
    /// Dequeues that fell back to round-robin.
    TqAffinityMisses => ("tq.affinity_misses", "tq"),
    /// `event` instructions retired.
    Events => ("debug.events", "debug"),
    /// `brk` instructions retired.
    Breakpoints => ("debug.breakpoints", "debug"),
}

/// Simulation statistics structure tracking all performance metrics.
#[derive(Clone, Debug)]
pub struct SimStats {
    counters: Vec<u64>,
    mem_stall: [u64; StallReason::COUNT],
    mem_histogram: BTreeMap<u32, u64>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            counters: vec![0; Stat::COUNT],
            mem_stall: [0; StallReason::COUNT],
            mem_histogram: BTreeMap::new(),
        }
    }
}

/// Serializable snapshot of all statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Counter values keyed by dotted name.
    pub counters: BTreeMap<&'static str, u64>,
    /// Stall cycles keyed by stall reason.
    pub mem_stall: BTreeMap<&'static str, u64>,
    /// Data accesses keyed by line address.
    pub mem_histogram: BTreeMap<u32, u64>,
    /// Retired instructions per cycle.
    pub ipc: f64,
}

impl SimStats {
    /// Increments a counter by one.
    #[inline]
    pub fn inc(&mut self, stat: Stat) {
        self.add(stat, 1);
    }

    /// Adds `n` to a counter.
    #[inline]
    pub fn add(&mut self, stat: Stat, n: u64) {
        if let Some(c) = self.counters.get_mut(stat as usize) {
            *c += n;
        }
    }

    /// Overwrites a counter.
    pub fn set(&mut self, stat: Stat, n: u64) {
        if let Some(c) = self.counters.get_mut(stat as usize) {
            *c = n;
        }
    }

    /// Reads a counter.
    pub fn get(&self, stat: Stat) -> u64 {
        self.counters.get(stat as usize).copied().unwrap_or(0)
    }

    /// Attributes one stall cycle of a memory operation to `reason`.
    pub fn inc_mem_stall(&mut self, reason: StallReason) {
        self.mem_stall[reason.index()] += 1;
    }

    /// Stall cycles attributed to `reason`.
    pub fn mem_stall(&self, reason: StallReason) -> u64 {
        self.mem_stall[reason.index()]
    }

    /// Records one data access to the line containing `addr`.
    ///
    /// `line_bytes` is the configured power-of-two line size; a size beyond the address
    /// space puts every access in line 0.
    pub fn inc_mem_histogram(&mut self, addr: u32, line_bytes: usize) {
        let mask = u32::try_from(line_bytes.max(1)).map_or(0, |bytes| !(bytes - 1));
        let line = addr & mask;
        *self.mem_histogram.entry(line).or_insert(0) += 1;
    }

    /// Data accesses per line.
    pub fn mem_histogram(&self) -> &BTreeMap<u32, u64> {
        &self.mem_histogram
    }

    /// Retired instructions per cycle.
    pub fn ipc(&self) -> f64 {
        let cycles = self.get(Stat::Cycles).max(1);
        self.get(Stat::InstrRetired) as f64 / cycles as f64
    }

    /// Builds a serializable snapshot.
    pub fn report(&self) -> StatsReport {
        StatsReport {
            counters: Stat::ALL.iter().map(|s| (s.name(), self.get(*s))).collect(),
            mem_stall: StallReason::ALL
                .iter()
                .filter(|r| r.is_stall())
                .map(|r| (r.name(), self.mem_stall(*r)))
                .collect(),
            mem_histogram: self.mem_histogram.clone(),
            ipc: self.ipc(),
        }
    }

    /// Renders the report as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    /// Renders the selected report sections. An empty selection renders everything.
    ///
    /// Sections: `summary`, `core`, `mix`, `branch`, `stall`, `memory`, `tq`, `debug`.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();
        let _ = writeln!(out, "\n==========================================================");
        let _ = writeln!(out, "RIGEL SIMULATION STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("summary") {
            let _ = writeln!(out, "sim.ipc                        {:.4}", self.ipc());
        }
        let mut current = "";
        for stat in Stat::ALL.iter().filter(|s| want(s.section())) {
            if stat.section() != current {
                current = stat.section();
                let _ = writeln!(out, "----------------------------------------------------------");
            }
            let _ = writeln!(out, "{:<30} {}", stat.name(), self.get(*stat));
        }
        if want("memory") {
            let _ = writeln!(out, "----------------------------------------------------------");
            for reason in StallReason::ALL.iter().filter(|r| r.is_stall()) {
                let _ = writeln!(out, "mem.stall.{:<20} {}", reason.name(), self.mem_stall(*reason));
            }
        }
        let _ = writeln!(out, "==========================================================");
        out
    }

    /// Prints the selected report sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints every section to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
