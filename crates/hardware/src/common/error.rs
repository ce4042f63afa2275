//! Simulator Error Taxonomy.
//!
//! Every condition the pipeline treats as fatal surfaces here as a typed error. It provides:
//! 1. **Simulation Errors:** Broken pipeline invariants (scoreboard misuse, retirement order,
//!    arena exhaustion) and architectural faults (undefined instruction, misalignment).
//! 2. **Configuration Errors:** Malformed or inconsistent JSON configuration.
//! 3. **Assembly Errors:** Diagnostics produced by the text assembler.
//!
//! Fatal errors propagate with `?` out of the stage that detected them, through
//! `Core::per_cycle` and `Simulator::tick`, to the driver, which dumps state and exits.

use thiserror::Error;

/// Errors that abort a simulation.
///
/// None of these are recoverable from inside the pipeline: they indicate either a
/// modelling bug (a broken invariant) or an architectural fault in the guest program.
#[derive(Debug, Error)]
pub enum SimError {
    /// A scoreboard release was issued for a register whose use count is already zero.
    #[error("scoreboard: release of register {reg} with zero use count")]
    NegativeUseCount {
        /// Register index.
        reg: usize,
    },

    /// A scoreboard lock was requested on a register that is already locked.
    #[error("scoreboard: register {reg} is already locked")]
    DoubleLock {
        /// Register index.
        reg: usize,
    },

    /// A scoreboard unlock was requested on a register that is not locked.
    #[error("scoreboard: unlock of register {reg} which is not locked")]
    UnlockWhileUnlocked {
        /// Register index.
        reg: usize,
    },

    /// A register index exceeded the size of its register file or scoreboard.
    #[error("register index {reg} out of range (file holds {size})")]
    RegisterOutOfRange {
        /// Offending register index.
        reg: usize,
        /// Number of registers in the file.
        size: usize,
    },

    /// An undefined instruction reached WriteBack on the correct path.
    #[error("undefined instruction retired at pc {pc:#010x} (core {core}, thread {thread})")]
    UndefinedInstruction {
        /// Core that retired the instruction.
        core: usize,
        /// Hardware thread within the core.
        thread: usize,
        /// Program counter of the instruction.
        pc: u32,
    },

    /// A memory operation computed an address that is not word aligned.
    #[error("misaligned access to {addr:#010x} by instruction at pc {pc:#010x}")]
    MisalignedAddress {
        /// Program counter of the offending instruction.
        pc: u32,
        /// Effective address.
        addr: u32,
    },

    /// The task queue could not accept every task of an enqueue request.
    #[error("task queue overflow on core {core}: {requested} task(s) requested, {free} slot(s) free")]
    TaskQueueOverflow {
        /// Core that issued the enqueue.
        core: usize,
        /// Number of tasks the request would have added.
        requested: usize,
        /// Free slots at the time of the request.
        free: usize,
    },

    /// A thread went too long without retiring an instruction.
    #[error("watchdog expired on core {core} thread {thread} at cycle {cycle} (fetch pc {pc:#010x})")]
    Deadlock {
        /// Core owning the thread.
        core: usize,
        /// Stuck hardware thread.
        thread: usize,
        /// Next fetch address of the thread.
        pc: u32,
        /// Global cycle at which the watchdog expired.
        cycle: u64,
    },

    /// No free slot was left in a core's instruction arena.
    #[error("instruction arena exhausted ({capacity} slots in use)")]
    InstrArenaExhausted {
        /// Arena capacity.
        capacity: usize,
    },

    /// An instruction handle referred to a slot that has since been freed or reused.
    #[error("stale instruction handle (slot {index}, generation {generation})")]
    StaleInstrHandle {
        /// Slot index carried by the handle.
        index: u32,
        /// Generation carried by the handle.
        generation: u32,
    },

    /// A thread tried to track more in-flight speculative instructions than its ring holds.
    #[error("speculative ring of thread {thread} is full ({capacity} entries)")]
    SpeculativeRingFull {
        /// Hardware thread.
        thread: usize,
        /// Ring capacity.
        capacity: usize,
    },

    /// An instruction retired before an older instruction of the same thread.
    #[error("thread {thread} retired instruction #{got} after #{prev}")]
    RetireOrder {
        /// Hardware thread.
        thread: usize,
        /// Number of the previously retired instruction.
        prev: u64,
        /// Number of the instruction retiring now.
        got: u64,
    },

    /// The configuration was rejected while building the simulator.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON text could not be parsed into a configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the simulator cannot model.
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the field, e.g. `pipeline.issue_width`.
        field: &'static str,
        /// Human readable explanation.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for building an [`ConfigError::Invalid`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Assembly diagnostic pointing at a 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct AsmError {
    /// Source line number, starting at 1.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl AsmError {
    /// Creates a diagnostic for `line`.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
