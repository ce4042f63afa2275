//! Memory System and Host Interfaces.
//!
//! Everything the cores talk to outside the pipeline. It provides:
//! 1. **Cache Model Interface:** The polled `CacheModel` trait and its stall vocabulary.
//! 2. **Reference Models:** `IdealCache` and `LatencyCache` over a shared `FlatMemory`.
//! 3. **System Calls:** The `SyscallHandler` hook and the default `HostSyscalls`.

/// Polled cache model trait, requests and stall reasons.
pub mod cache_model;

/// Sparse functional memory.
pub mod flat;

/// Zero-stall cache model.
pub mod ideal;

/// Set-associative MSHR-limited cache model.
pub mod latency;

/// System call hook.
pub mod syscall;

pub use cache_model::{AccessOutcome, AccessRequest, CacheModel, HitLevels, MessageTag, StallReason};
pub use flat::FlatMemory;
pub use ideal::IdealCache;
pub use latency::LatencyCache;
pub use syscall::{HostSyscalls, SyscallHandler, SyscallRequest};
