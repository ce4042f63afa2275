//! Latency Cache Model.
//!
//! A timing model with enough structure to exercise every pipeline stall path:
//! 1. **L1:** One set-associative LRU tag array per core.
//! 2. **L2:** One shared LRU tag array standing in for the cluster caches.
//! 3. **MSHRs:** A bounded per-core table of outstanding misses keyed by line. A miss reports
//!    `L1DPending` while the request travels to L2, `L2DAccess` while L2 (or memory behind it)
//!    services it, and hits once the fill lands at the end of the ready cycle.
//! 4. **Globals:** Uncached operations complete after a fixed latency; data accesses to a line
//!    with a global operation in flight report `StuckBehindGlobal`.
//!
//! All data lives in a `FlatMemory`; the tags only decide timing.

use std::collections::HashMap;

use super::cache_model::{AccessOutcome, AccessRequest, CacheModel, HitLevels, MessageTag, StallReason};
use super::flat::FlatMemory;
use crate::config::MemoryConfig;
use crate::core::pipeline::instr::InstrNumber;

#[derive(Debug, Clone, Copy)]
struct Way {
    line: u32,
    last_use: u64,
}

/// LRU set-associative tag array.
#[derive(Debug, Clone)]
struct TagArray {
    sets: Vec<Vec<Way>>,
    ways: usize,
}

impl TagArray {
    fn new(sets: usize, ways: usize) -> Self {
        Self {
            sets: vec![Vec::with_capacity(ways); sets.max(1)],
            ways: ways.max(1),
        }
    }

    fn set_of(&self, line: u32) -> usize {
        line as usize % self.sets.len()
    }

    /// Looks `line` up, refreshing its LRU stamp on a hit.
    fn probe(&mut self, line: u32, cycle: u64) -> bool {
        let idx = self.set_of(line);
        match self.sets[idx].iter_mut().find(|w| w.line == line) {
            Some(way) => {
                way.last_use = cycle;
                true
            }
            None => false,
        }
    }

    fn contains(&self, line: u32) -> bool {
        self.sets[self.set_of(line)].iter().any(|w| w.line == line)
    }

    fn fill(&mut self, line: u32, cycle: u64) {
        let ways = self.ways;
        let idx = self.set_of(line);
        let set = &mut self.sets[idx];
        if let Some(way) = set.iter_mut().find(|w| w.line == line) {
            way.last_use = cycle;
            return;
        }
        if set.len() >= ways {
            if let Some(victim) = set
                .iter()
                .enumerate()
                .min_by_key(|(_, w)| w.last_use)
                .map(|(i, _)| i)
            {
                let _ = set.swap_remove(victim);
            }
        }
        set.push(Way { line, last_use: cycle });
    }

    fn invalidate(&mut self, line: u32) {
        let idx = self.set_of(line);
        self.sets[idx].retain(|w| w.line != line);
    }
}

#[derive(Debug, Clone, Copy)]
struct Mshr {
    line: u32,
    l2_start: u64,
    ready: u64,
    levels: HitLevels,
}

#[derive(Debug, Clone, Copy)]
struct GlobalOp {
    instr: InstrNumber,
    core: usize,
    line: u32,
    ready: u64,
    invalidates: bool,
}

/// Set-associative, MSHR-limited timing model.
#[derive(Debug, Clone)]
pub struct LatencyCache {
    memory: FlatMemory,
    l1: Vec<TagArray>,
    l2: TagArray,
    mshrs: Vec<Vec<Mshr>>,
    globals: Vec<GlobalOp>,
    recent_fills: HashMap<(usize, u32), HitLevels>,
    line_shift: u32,
    mshr_limit: usize,
    l1_latency: u64,
    l2_latency: u64,
    memory_latency: u64,
    global_latency: u64,
}

impl LatencyCache {
    /// Builds the model for `cores` cores.
    pub fn new(cfg: &MemoryConfig, cores: usize) -> Self {
        Self {
            memory: FlatMemory::new(),
            l1: (0..cores).map(|_| TagArray::new(cfg.l1_sets, cfg.l1_ways)).collect(),
            l2: TagArray::new(cfg.l1_sets * 16, cfg.l1_ways * 4),
            mshrs: vec![Vec::new(); cores],
            globals: Vec::new(),
            recent_fills: HashMap::new(),
            line_shift: cfg.line_bytes.max(4).trailing_zeros(),
            mshr_limit: cfg.mshrs.max(1),
            l1_latency: cfg.l1_latency,
            l2_latency: cfg.l2_latency,
            memory_latency: cfg.memory_latency,
            global_latency: cfg.global_latency,
        }
    }

    fn line_of(&self, addr: u32) -> u32 {
        addr >> self.line_shift
    }

    /// Outstanding misses of `core`.
    pub fn outstanding_misses(&self, core: usize) -> usize {
        self.mshrs.get(core).map_or(0, Vec::len)
    }

    fn blocked_by_global(&self, req: &AccessRequest, line: u32) -> bool {
        self.globals
            .iter()
            .any(|g| g.line == line && g.instr != req.instr)
    }

    /// Shared miss path of reads, writes and prefetches.
    fn data_access(&mut self, req: &AccessRequest, line: u32) -> Result<HitLevels, StallReason> {
        if self.blocked_by_global(req, line) {
            return Err(StallReason::StuckBehindGlobal);
        }
        let Some(l1) = self.l1.get_mut(req.core) else {
            return Err(StallReason::L1DPending);
        };
        if l1.probe(line, req.cycle) {
            let levels = self.recent_fills.remove(&(req.core, line)).unwrap_or(HitLevels {
                l1: true,
                l2: false,
                l3: false,
            });
            return Ok(levels);
        }
        let mshrs = &mut self.mshrs[req.core];
        if let Some(m) = mshrs.iter().find(|m| m.line == line) {
            return Err(if req.cycle < m.l2_start {
                StallReason::L1DPending
            } else {
                StallReason::L2DAccess
            });
        }
        if mshrs.len() >= self.mshr_limit {
            return Err(StallReason::L1DMSHR);
        }
        let l2_hit = self.l2.probe(line, req.cycle);
        let l2_start = req.cycle + self.l1_latency;
        let ready = l2_start + self.l2_latency + if l2_hit { 0 } else { self.memory_latency };
        mshrs.push(Mshr {
            line,
            l2_start,
            ready,
            levels: HitLevels {
                l1: false,
                l2: l2_hit,
                l3: !l2_hit,
            },
        });
        Err(StallReason::L1DPending)
    }

    fn global_op(&mut self, req: &AccessRequest, invalidates: bool) -> StallReason {
        let line = self.line_of(req.addr);
        if let Some(pos) = self.globals.iter().position(|g| g.instr == req.instr && g.core == req.core) {
            if req.cycle < self.globals[pos].ready {
                return StallReason::L2DAccess;
            }
            let op = self.globals.remove(pos);
            if op.invalidates {
                for l1 in &mut self.l1 {
                    l1.invalidate(op.line);
                }
            }
            return StallReason::NoStall;
        }
        if self.globals.iter().any(|g| g.line == line) {
            return StallReason::StuckBehindGlobal;
        }
        self.globals.push(GlobalOp {
            instr: req.instr,
            core: req.core,
            line,
            ready: req.cycle + self.global_latency,
            invalidates,
        });
        StallReason::L2DAccess
    }
}

impl CacheModel for LatencyCache {
    fn read_access(&mut self, req: &AccessRequest) -> AccessOutcome {
        let line = self.line_of(req.addr);
        match self.data_access(req, line) {
            Ok(hits) => AccessOutcome::done(self.memory.read(req.addr), hits),
            Err(stall) => AccessOutcome::stalled(stall),
        }
    }

    fn write_access(&mut self, req: &AccessRequest, value: u32) -> AccessOutcome {
        let line = self.line_of(req.addr);
        match self.data_access(req, line) {
            Ok(hits) => {
                self.memory.write(req.addr, value);
                AccessOutcome::done(value, hits)
            }
            Err(stall) => AccessOutcome::stalled(stall),
        }
    }

    fn global_memory_access(&mut self, req: &AccessRequest, tag: MessageTag) -> StallReason {
        self.global_op(req, !matches!(tag, MessageTag::GlobalLoad))
    }

    fn prefetch_line(&mut self, req: &AccessRequest) -> StallReason {
        let line = self.line_of(req.addr);
        match self.data_access(req, line) {
            Ok(_) | Err(StallReason::L1DPending | StallReason::L2DAccess) => StallReason::NoStall,
            Err(other) => other,
        }
    }

    fn invalidate_line(&mut self, req: &AccessRequest) -> StallReason {
        let line = self.line_of(req.addr);
        if let Some(l1) = self.l1.get_mut(req.core) {
            l1.invalidate(line);
        }
        StallReason::NoStall
    }

    fn writeback_line(&mut self, req: &AccessRequest) -> StallReason {
        let line = self.line_of(req.addr);
        if self.mshrs.get(req.core).is_some_and(|m| m.iter().any(|m| m.line == line)) {
            return StallReason::L1DPending;
        }
        self.l2.fill(line, req.cycle);
        StallReason::NoStall
    }

    fn memory_barrier(&mut self, core: usize, _cycle: u64) -> StallReason {
        if self.outstanding_misses(core) > 0 || self.globals.iter().any(|g| g.core == core) {
            StallReason::L2DPending
        } else {
            StallReason::NoStall
        }
    }

    fn broadcast(&mut self, req: &AccessRequest, _value: u32) -> StallReason {
        self.global_op(req, true)
    }

    fn functional_read(&self, addr: u32) -> u32 {
        self.memory.read(addr)
    }

    fn functional_write(&mut self, addr: u32, value: u32) {
        self.memory.write(addr, value);
    }

    fn per_cycle(&mut self, cycle: u64) {
        for (core, mshrs) in self.mshrs.iter_mut().enumerate() {
            let l1 = &mut self.l1[core];
            let l2 = &mut self.l2;
            let fills = &mut self.recent_fills;
            mshrs.retain(|m| {
                if m.ready > cycle {
                    return true;
                }
                l2.fill(m.line, cycle);
                l1.fill(m.line, cycle);
                let _ = fills.insert((core, m.line), m.levels);
                false
            });
        }
    }
}
