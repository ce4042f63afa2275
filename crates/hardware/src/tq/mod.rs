//! Hardware Task Queue.
//!
//! The dataflow scheduler shared by every core. It provides:
//! 1. **Descriptors:** Four-field task descriptors and request return codes.
//! 2. **Core State:** The two-phase per-core state machine.
//! 3. **Store:** The bounded FIFO/LIFO task store.
//! 4. **Schedulers:** Ordered and affinity-aware task selection.
//! 5. **Task System:** Request handling, barrier detection and clocking.

/// Per-core two-phase state machine.
pub mod core_state;

/// Task descriptors and return codes.
pub mod descriptor;

/// Task selection policies.
pub mod scheduler;

/// Bounded task store.
pub mod store;

/// Machine-wide task system.
pub mod system;

pub use core_state::{TqCoreState, TqCoreStateType};
pub use descriptor::{TaskDescriptor, TqRetType};
pub use scheduler::{AffinityCounters, TaskScheduler};
pub use store::{StoreOrder, TaskStore};
pub use system::{TaskSystem, TqCounters};
