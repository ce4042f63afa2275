//! Task descriptors and task queue return codes.

use std::fmt;

/// One unit of work: four opaque 32-bit fields.
///
/// Equality and ordering are field-wise so descriptors can key the multisets used by the
/// affinity schedulers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskDescriptor {
    /// Entry point of the task body.
    pub ip: u32,
    /// Pointer to the task's shared data.
    pub data: u32,
    /// First index of the iteration range.
    pub begin: u32,
    /// One past the last index of the iteration range.
    pub end: u32,
}

impl TaskDescriptor {
    /// Creates a descriptor.
    pub const fn new(ip: u32, data: u32, begin: u32, end: u32) -> Self {
        Self { ip, data, begin, end }
    }

    /// Length of the overlap between the two iteration ranges.
    pub fn overlap(&self, other: &TaskDescriptor) -> u32 {
        let lo = self.begin.max(other.begin);
        let hi = self.end.min(other.end);
        hi.saturating_sub(lo)
    }

    /// Whether the two ranges touch end-to-begin.
    pub fn adjoins(&self, other: &TaskDescriptor) -> bool {
        self.end == other.begin || other.end == self.begin
    }
}

impl fmt::Display for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ip {:#x} data {:#x} {}..{}]",
            self.ip, self.data, self.begin, self.end
        )
    }
}

/// Result of a task queue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TqRetType {
    /// Request complete.
    Success,
    /// Request accepted, not complete yet; poll again next cycle.
    Retry,
    /// The queue cannot take the tasks; nothing was enqueued.
    Overflow,
    /// The queue is empty; poll again.
    Block,
    /// A barrier completed while this core was blocked.
    Sync,
    /// Work has ended while this core was blocked.
    End,
}

impl TqRetType {
    /// Value written to the TQ status SPR by `tqdeq`.
    pub const fn status_code(self) -> u32 {
        match self {
            TqRetType::Success => 0,
            TqRetType::Retry => 1,
            TqRetType::Overflow => 2,
            TqRetType::Block => 3,
            TqRetType::Sync => 4,
            TqRetType::End => 5,
        }
    }
}
