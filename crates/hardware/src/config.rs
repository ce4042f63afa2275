//! Configuration system for the Rigel simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline machine constants (core counts, latencies, queue sizes).
//! 2. **Structures:** Hierarchical config for general, system, pipeline, latency, register,
//!    task-queue and memory settings.
//! 3. **Enums:** Bypass, thread-switch, task-scheduling and memory-model selections.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or use `Config::default()`.
//! Every field is optional; omitted fields take the documented default.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden
/// in the JSON configuration.
mod defaults {
    /// Hard stop for a run, in global cycles.
    pub const MAX_CYCLES: u64 = 10_000_000;

    /// Cycles a live thread may go without retiring before the run is declared deadlocked.
    pub const WATCHDOG_CYCLES: u64 = 100_000;

    /// Number of retired instructions kept per core for post-mortem dumps.
    pub const RETIRE_TRACE_DEPTH: usize = 32;

    /// Number of cores in the system.
    pub const NUM_CORES: usize = 1;

    /// Hardware threads per core.
    pub const THREADS_PER_CORE: usize = 1;

    /// Cores sharing one cluster cache.
    pub const CORES_PER_CLUSTER: usize = 8;

    /// Instructions fetched and issued per cycle.
    pub const ISSUE_WIDTH: usize = 2;

    /// Branch Target Buffer capacity per thread.
    pub const BTB_SIZE: usize = 64;

    /// Saturation point of the BTB confidence counter.
    pub const BTB_CONFIDENCE_MAX: u8 = 3;

    /// Vector lanes processed by the ALU per cycle.
    pub const VECTOR_LANES_PER_CYCLE: usize = 4;

    /// Instruction tokens that may be live in one core at once.
    pub const INSTR_ARENA_SIZE: usize = 256;

    /// Single-cycle integer ALU latency.
    pub const LAT_ALU: u64 = 1;

    /// Shifter latency.
    pub const LAT_SHIFT: u64 = 1;

    /// Integer multiplier latency.
    pub const LAT_MUL: u64 = 3;

    /// Pipelined FPU latency (add, sub, mul, fma, conversions).
    pub const LAT_FPU: u64 = 4;

    /// Long FPU latency (reciprocal and reciprocal square root).
    pub const LAT_FPU_LONG: u64 = 8;

    /// Branch unit latency.
    pub const LAT_BRANCH: u64 = 1;

    /// Scalar registers per thread.
    pub const SCALAR_REGS: usize = 32;

    /// Vector registers per thread.
    pub const VECTOR_REGS: usize = 16;

    /// Task queue capacity.
    pub const TQ_MAX_SIZE: usize = 1024;

    /// Cycles to complete a single enqueue.
    pub const TQ_LAT_ENQUEUE_ONE: u64 = 4;

    /// Cycles to complete a loop enqueue.
    pub const TQ_LAT_ENQUEUE_LOOP: u64 = 8;

    /// Cycles to complete a dequeue.
    pub const TQ_LAT_DEQUEUE: u64 = 4;

    /// Cycles between barrier detection and release of the blocked cores.
    pub const TQ_LAT_BLOCKED_SYNC: u64 = 10;

    /// Cycles to complete an end-of-work signal.
    pub const TQ_LAT_END: u64 = 4;

    /// History window of the affinity schedulers.
    pub const TQ_AFFINITY_WINDOW: usize = 16;

    /// L1 data cache hit latency.
    pub const L1_LATENCY: u64 = 1;

    /// Cluster (L2) cache latency.
    pub const L2_LATENCY: u64 = 8;

    /// Off-chip memory latency on an L2 miss.
    pub const MEMORY_LATENCY: u64 = 60;

    /// L1 data cache sets.
    pub const L1_SETS: usize = 64;

    /// L1 data cache ways.
    pub const L1_WAYS: usize = 2;

    /// Cache line size in bytes.
    pub const LINE_BYTES: usize = 32;

    /// Miss status holding registers per core.
    pub const MSHRS: usize = 4;

    /// Latency of global (uncached) memory operations and atomics.
    pub const GLOBAL_LATENCY: u64 = 40;
}

/// Register forwarding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BypassPolicy {
    /// Results are forwarded from the scoreboard as soon as they are ready.
    #[default]
    Full,
    /// Consumers wait for the producer to retire.
    Disabled,
}

/// Fetch arbitration between the hardware threads of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ThreadSwitchPolicy {
    /// Rotate fetch among runnable threads every cycle.
    #[default]
    RoundRobin,
    /// Keep fetching one thread until it misses in the data cache.
    SwitchOnMiss,
}

/// Task queue scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TaskPolicy {
    /// Oldest task first.
    #[default]
    Fifo,
    /// Newest task first.
    Lifo,
    /// Interval-overlap affinity against the previous epoch's per-cluster history.
    IntervalAffinity,
    /// Recency-stack affinity over a LIFO store.
    StackAffinity,
}

/// Cache model backing the memory hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryModel {
    /// Every access completes without stalling.
    Ideal,
    /// Set-associative L1 per core, shared L2 and MSHR-limited misses.
    #[default]
    Latency,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use rigel_core::config::{BypassPolicy, Config, TaskPolicy};
///
/// let config = Config::from_json(r#"{
///     "system": { "num_cores": 4, "threads_per_core": 2 },
///     "pipeline": { "bypass": "Disabled" },
///     "task_queue": { "policy": "IntervalAffinity" }
/// }"#).unwrap();
/// assert_eq!(config.system.num_cores, 4);
/// assert_eq!(config.pipeline.bypass, BypassPolicy::Disabled);
/// assert_eq!(config.task_queue.policy, TaskPolicy::IntervalAffinity);
/// assert_eq!(config.pipeline.issue_width, 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run limits and tracing
    pub general: GeneralConfig,
    /// Machine shape
    pub system: SystemConfig,
    /// Pipeline behaviour switches
    pub pipeline: PipelineConfig,
    /// Functional unit latencies
    pub latency: LatencyConfig,
    /// Register file sizes
    pub registers: RegisterConfig,
    /// Task queue sizing, latencies and policy
    pub task_queue: TaskQueueConfig,
    /// Cache model selection and timing
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
            if value < min {
                return Err(ConfigError::invalid(field, format!("must be at least {min}, got {value}")));
            }
            Ok(())
        }

        at_least("system.num_cores", self.system.num_cores, 1)?;
        at_least("system.threads_per_core", self.system.threads_per_core, 1)?;
        at_least("system.cores_per_cluster", self.system.cores_per_cluster, 1)?;
        if !(1..=crate::common::constants::MAX_ISSUE_WIDTH).contains(&self.pipeline.issue_width) {
            return Err(ConfigError::invalid(
                "pipeline.issue_width",
                format!("must be 1 or 2, got {}", self.pipeline.issue_width),
            ));
        }
        at_least("pipeline.btb_size", self.pipeline.btb_size, 1)?;
        at_least("pipeline.btb_confidence_max", usize::from(self.pipeline.btb_confidence_max), 1)?;
        if !(1..=crate::common::constants::VECTOR_LANES).contains(&self.pipeline.vector_lanes_per_cycle) {
            return Err(ConfigError::invalid(
                "pipeline.vector_lanes_per_cycle",
                format!("must be between 1 and 4, got {}", self.pipeline.vector_lanes_per_cycle),
            ));
        }
        at_least("pipeline.instr_arena_size", self.pipeline.instr_arena_size, 16)?;
        let fu = &self.pipeline.functional_units;
        at_least("pipeline.functional_units.alu", fu.alu, 1)?;
        at_least("pipeline.functional_units.fpu", fu.fpu, 1)?;
        at_least("pipeline.functional_units.shifter", fu.shifter, 1)?;
        at_least("pipeline.functional_units.branch", fu.branch, 1)?;
        at_least("pipeline.functional_units.mem", fu.mem, 1)?;
        if !(2..=crate::common::constants::ARCH_SCALAR_REGS).contains(&self.registers.scalar_regs) {
            return Err(ConfigError::invalid(
                "registers.scalar_regs",
                format!("must be between 2 and 32, got {}", self.registers.scalar_regs),
            ));
        }
        if self.registers.vector_regs > crate::common::constants::ARCH_VECTOR_REGS {
            return Err(ConfigError::invalid(
                "registers.vector_regs",
                format!("must be at most 16, got {}", self.registers.vector_regs),
            ));
        }
        at_least("task_queue.max_size", self.task_queue.max_size, 1)?;
        at_least("task_queue.affinity_window", self.task_queue.affinity_window, 1)?;
        at_least("memory.l1_sets", self.memory.l1_sets, 1)?;
        at_least("memory.l1_ways", self.memory.l1_ways, 1)?;
        at_least("memory.mshrs", self.memory.mshrs, 1)?;
        if !self.memory.line_bytes.is_power_of_two() || self.memory.line_bytes < 4 {
            return Err(ConfigError::invalid(
                "memory.line_bytes",
                format!("must be a power of two of at least 4, got {}", self.memory.line_bytes),
            ));
        }
        if self.general.watchdog_cycles == 0 {
            return Err(ConfigError::invalid("general.watchdog_cycles", "must be non-zero"));
        }
        Ok(())
    }

    /// Total hardware threads across the machine.
    pub fn total_threads(&self) -> usize {
        self.system.num_cores * self.system.threads_per_core
    }

    /// Cluster index of `core`.
    pub fn cluster_of(&self, core: usize) -> usize {
        core / self.system.cores_per_cluster.max(1)
    }
}

/// Run limits and tracing options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Stop the run after this many cycles even if threads remain live
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Cycles without a retirement before a live thread is reported deadlocked
    #[serde(default = "GeneralConfig::default_watchdog_cycles")]
    pub watchdog_cycles: u64,

    /// Retirements remembered per core for `dump_state`
    #[serde(default = "GeneralConfig::default_retire_trace_depth")]
    pub retire_trace_depth: usize,
}

impl GeneralConfig {
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }

    fn default_watchdog_cycles() -> u64 {
        defaults::WATCHDOG_CYCLES
    }

    fn default_retire_trace_depth() -> usize {
        defaults::RETIRE_TRACE_DEPTH
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
            watchdog_cycles: defaults::WATCHDOG_CYCLES,
            retire_trace_depth: defaults::RETIRE_TRACE_DEPTH,
        }
    }
}

/// Machine shape: core, thread and cluster counts.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Cores in the system
    #[serde(default = "SystemConfig::default_num_cores")]
    pub num_cores: usize,

    /// Hardware threads per core
    #[serde(default = "SystemConfig::default_threads_per_core")]
    pub threads_per_core: usize,

    /// Cores per cluster (affinity schedulers track history per cluster)
    #[serde(default = "SystemConfig::default_cores_per_cluster")]
    pub cores_per_cluster: usize,
}

impl SystemConfig {
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_threads_per_core() -> usize {
        defaults::THREADS_PER_CORE
    }

    fn default_cores_per_cluster() -> usize {
        defaults::CORES_PER_CLUSTER
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            threads_per_core: defaults::THREADS_PER_CORE,
            cores_per_cluster: defaults::CORES_PER_CLUSTER,
        }
    }
}

/// Functional unit counts shared by all lanes of a core each cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionalUnits {
    /// Integer ALUs (also used by compares, multiplies and vector integer ops)
    #[serde(default = "FunctionalUnits::default_two")]
    pub alu: usize,

    /// Floating-point units
    #[serde(default = "FunctionalUnits::default_one")]
    pub fpu: usize,

    /// Shifters
    #[serde(default = "FunctionalUnits::default_one")]
    pub shifter: usize,

    /// Branch units
    #[serde(default = "FunctionalUnits::default_one")]
    pub branch: usize,

    /// Memory ports
    #[serde(default = "FunctionalUnits::default_one")]
    pub mem: usize,
}

impl FunctionalUnits {
    fn default_one() -> usize {
        1
    }

    fn default_two() -> usize {
        2
    }
}

impl Default for FunctionalUnits {
    fn default() -> Self {
        Self {
            alu: 2,
            fpu: 1,
            shifter: 1,
            branch: 1,
            mem: 1,
        }
    }
}

/// Pipeline behaviour switches.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Instructions fetched and issued per cycle (1 or 2)
    #[serde(default = "PipelineConfig::default_issue_width")]
    pub issue_width: usize,

    /// Scoreboard forwarding policy
    #[serde(default)]
    pub bypass: BypassPolicy,

    /// Model multi-cycle ALU and FPU latencies
    #[serde(default = "PipelineConfig::default_true")]
    pub multi_cycle_alu: bool,

    /// Park missing memory operations off the main latch path
    #[serde(default)]
    pub non_blocking_memory: bool,

    /// Fetch thread arbitration
    #[serde(default)]
    pub thread_switch: ThreadSwitchPolicy,

    /// Drain the scoreboard after every branch mispredict
    #[serde(default)]
    pub drain_on_mispredict: bool,

    /// BTB entries per thread
    #[serde(default = "PipelineConfig::default_btb_size")]
    pub btb_size: usize,

    /// BTB confidence saturation value
    #[serde(default = "PipelineConfig::default_btb_confidence_max")]
    pub btb_confidence_max: u8,

    /// Vector lanes the ALU completes per cycle
    #[serde(default = "PipelineConfig::default_vector_lanes_per_cycle")]
    pub vector_lanes_per_cycle: usize,

    /// Instruction tokens live at once per core
    #[serde(default = "PipelineConfig::default_instr_arena_size")]
    pub instr_arena_size: usize,

    /// Functional unit counts
    #[serde(default)]
    pub functional_units: FunctionalUnits,
}

impl PipelineConfig {
    fn default_issue_width() -> usize {
        defaults::ISSUE_WIDTH
    }

    fn default_true() -> bool {
        true
    }

    fn default_btb_size() -> usize {
        defaults::BTB_SIZE
    }

    fn default_btb_confidence_max() -> u8 {
        defaults::BTB_CONFIDENCE_MAX
    }

    fn default_vector_lanes_per_cycle() -> usize {
        defaults::VECTOR_LANES_PER_CYCLE
    }

    fn default_instr_arena_size() -> usize {
        defaults::INSTR_ARENA_SIZE
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            issue_width: defaults::ISSUE_WIDTH,
            bypass: BypassPolicy::Full,
            multi_cycle_alu: true,
            non_blocking_memory: false,
            thread_switch: ThreadSwitchPolicy::RoundRobin,
            drain_on_mispredict: false,
            btb_size: defaults::BTB_SIZE,
            btb_confidence_max: defaults::BTB_CONFIDENCE_MAX,
            vector_lanes_per_cycle: defaults::VECTOR_LANES_PER_CYCLE,
            instr_arena_size: defaults::INSTR_ARENA_SIZE,
            functional_units: FunctionalUnits::default(),
        }
    }
}

/// Functional unit latencies in cycles.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    /// Integer ALU, compare and vector integer ops
    #[serde(default = "LatencyConfig::default_alu")]
    pub alu: u64,

    /// Shifts
    #[serde(default = "LatencyConfig::default_shift")]
    pub shift: u64,

    /// Integer multiply
    #[serde(default = "LatencyConfig::default_mul")]
    pub mul: u64,

    /// Pipelined floating-point ops
    #[serde(default = "LatencyConfig::default_fpu")]
    pub fpu: u64,

    /// Reciprocal and reciprocal square root
    #[serde(default = "LatencyConfig::default_fpu_long")]
    pub fpu_long: u64,

    /// Branches and jumps
    #[serde(default = "LatencyConfig::default_branch")]
    pub branch: u64,
}

impl LatencyConfig {
    fn default_alu() -> u64 {
        defaults::LAT_ALU
    }

    fn default_shift() -> u64 {
        defaults::LAT_SHIFT
    }

    fn default_mul() -> u64 {
        defaults::LAT_MUL
    }

    fn default_fpu() -> u64 {
        defaults::LAT_FPU
    }

    fn default_fpu_long() -> u64 {
        defaults::LAT_FPU_LONG
    }

    fn default_branch() -> u64 {
        defaults::LAT_BRANCH
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            alu: defaults::LAT_ALU,
            shift: defaults::LAT_SHIFT,
            mul: defaults::LAT_MUL,
            fpu: defaults::LAT_FPU,
            fpu_long: defaults::LAT_FPU_LONG,
            branch: defaults::LAT_BRANCH,
        }
    }
}

/// Register file sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    /// Scalar registers per thread
    #[serde(default = "RegisterConfig::default_scalar_regs")]
    pub scalar_regs: usize,

    /// Vector registers per thread
    #[serde(default = "RegisterConfig::default_vector_regs")]
    pub vector_regs: usize,

    /// Treat `r0` as always available in the scoreboard
    #[serde(default = "RegisterConfig::default_skip_zero_register")]
    pub skip_zero_register: bool,
}

impl RegisterConfig {
    fn default_scalar_regs() -> usize {
        defaults::SCALAR_REGS
    }

    fn default_vector_regs() -> usize {
        defaults::VECTOR_REGS
    }

    fn default_skip_zero_register() -> bool {
        true
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            scalar_regs: defaults::SCALAR_REGS,
            vector_regs: defaults::VECTOR_REGS,
            skip_zero_register: true,
        }
    }
}

/// Task queue sizing, latencies and scheduling policy.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskQueueConfig {
    /// Maximum queued tasks
    #[serde(default = "TaskQueueConfig::default_max_size")]
    pub max_size: usize,

    /// Latency of a single enqueue
    #[serde(default = "TaskQueueConfig::default_latency_enqueue_one")]
    pub latency_enqueue_one: u64,

    /// Latency of a loop enqueue
    #[serde(default = "TaskQueueConfig::default_latency_enqueue_loop")]
    pub latency_enqueue_loop: u64,

    /// Latency of a dequeue
    #[serde(default = "TaskQueueConfig::default_latency_dequeue")]
    pub latency_dequeue: u64,

    /// Delay between barrier detection and release
    #[serde(default = "TaskQueueConfig::default_latency_blocked_sync")]
    pub latency_blocked_sync: u64,

    /// Latency of an end-of-work signal
    #[serde(default = "TaskQueueConfig::default_latency_end")]
    pub latency_end: u64,

    /// Task selection policy
    #[serde(default)]
    pub policy: TaskPolicy,

    /// History window of the affinity schedulers
    #[serde(default = "TaskQueueConfig::default_affinity_window")]
    pub affinity_window: usize,
}

impl TaskQueueConfig {
    fn default_max_size() -> usize {
        defaults::TQ_MAX_SIZE
    }

    fn default_latency_enqueue_one() -> u64 {
        defaults::TQ_LAT_ENQUEUE_ONE
    }

    fn default_latency_enqueue_loop() -> u64 {
        defaults::TQ_LAT_ENQUEUE_LOOP
    }

    fn default_latency_dequeue() -> u64 {
        defaults::TQ_LAT_DEQUEUE
    }

    fn default_latency_blocked_sync() -> u64 {
        defaults::TQ_LAT_BLOCKED_SYNC
    }

    fn default_latency_end() -> u64 {
        defaults::TQ_LAT_END
    }

    fn default_affinity_window() -> usize {
        defaults::TQ_AFFINITY_WINDOW
    }
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_size: defaults::TQ_MAX_SIZE,
            latency_enqueue_one: defaults::TQ_LAT_ENQUEUE_ONE,
            latency_enqueue_loop: defaults::TQ_LAT_ENQUEUE_LOOP,
            latency_dequeue: defaults::TQ_LAT_DEQUEUE,
            latency_blocked_sync: defaults::TQ_LAT_BLOCKED_SYNC,
            latency_end: defaults::TQ_LAT_END,
            policy: TaskPolicy::Fifo,
            affinity_window: defaults::TQ_AFFINITY_WINDOW,
        }
    }
}

/// Cache model selection and timing.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Which cache model backs the machine
    #[serde(default)]
    pub model: MemoryModel,

    /// L1 data hit latency
    #[serde(default = "MemoryConfig::default_l1_latency")]
    pub l1_latency: u64,

    /// Cluster cache latency
    #[serde(default = "MemoryConfig::default_l2_latency")]
    pub l2_latency: u64,

    /// Off-chip latency added on a cluster cache miss
    #[serde(default = "MemoryConfig::default_memory_latency")]
    pub memory_latency: u64,

    /// L1 sets
    #[serde(default = "MemoryConfig::default_l1_sets")]
    pub l1_sets: usize,

    /// L1 ways
    #[serde(default = "MemoryConfig::default_l1_ways")]
    pub l1_ways: usize,

    /// Line size in bytes
    #[serde(default = "MemoryConfig::default_line_bytes")]
    pub line_bytes: usize,

    /// Outstanding misses per core
    #[serde(default = "MemoryConfig::default_mshrs")]
    pub mshrs: usize,

    /// Latency of global operations and atomics
    #[serde(default = "MemoryConfig::default_global_latency")]
    pub global_latency: u64,
}

impl MemoryConfig {
    fn default_l1_latency() -> u64 {
        defaults::L1_LATENCY
    }

    fn default_l2_latency() -> u64 {
        defaults::L2_LATENCY
    }

    fn default_memory_latency() -> u64 {
        defaults::MEMORY_LATENCY
    }

    fn default_l1_sets() -> usize {
        defaults::L1_SETS
    }

    fn default_l1_ways() -> usize {
        defaults::L1_WAYS
    }

    fn default_line_bytes() -> usize {
        defaults::LINE_BYTES
    }

    fn default_mshrs() -> usize {
        defaults::MSHRS
    }

    fn default_global_latency() -> u64 {
        defaults::GLOBAL_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            model: MemoryModel::Latency,
            l1_latency: defaults::L1_LATENCY,
            l2_latency: defaults::L2_LATENCY,
            memory_latency: defaults::MEMORY_LATENCY,
            l1_sets: defaults::L1_SETS,
            l1_ways: defaults::L1_WAYS,
            line_bytes: defaults::LINE_BYTES,
            mshrs: defaults::MSHRS,
            global_latency: defaults::GLOBAL_LATENCY,
        }
    }
}
