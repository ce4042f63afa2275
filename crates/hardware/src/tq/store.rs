//! Bounded task store.

use std::collections::VecDeque;

use super::descriptor::TaskDescriptor;

/// Which end of the store the default policy takes tasks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOrder {
    /// Oldest first.
    #[default]
    Fifo,
    /// Newest first.
    Lifo,
}

/// Bounded queue of pending tasks, oldest at index 0.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: VecDeque<TaskDescriptor>,
    max_size: usize,
    order: StoreOrder,
}

impl TaskStore {
    /// Creates an empty store holding at most `max_size` tasks.
    pub fn new(max_size: usize, order: StoreOrder) -> Self {
        Self {
            tasks: VecDeque::with_capacity(max_size.min(4096)),
            max_size,
            order,
        }
    }

    /// Queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Free slots.
    pub fn free(&self) -> usize {
        self.max_size.saturating_sub(self.tasks.len())
    }

    /// Whether the store is at capacity.
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Default take order.
    pub fn order(&self) -> StoreOrder {
        self.order
    }

    /// Appends every task or none of them.
    ///
    /// # Returns
    ///
    /// `false`, leaving the store untouched, when the tasks do not all fit.
    pub fn push_all(&mut self, tasks: &[TaskDescriptor]) -> bool {
        if tasks.len() > self.free() {
            return false;
        }
        self.tasks.extend(tasks.iter().copied());
        true
    }

    /// Index the default policy would take next.
    pub fn default_index(&self) -> Option<usize> {
        match (self.order, self.tasks.len()) {
            (_, 0) => None,
            (StoreOrder::Fifo, _) => Some(0),
            (StoreOrder::Lifo, n) => Some(n - 1),
        }
    }

    /// Removes and returns the task at `idx`.
    pub fn remove(&mut self, idx: usize) -> Option<TaskDescriptor> {
        self.tasks.remove(idx)
    }

    /// Task at `idx`.
    pub fn get(&self, idx: usize) -> Option<&TaskDescriptor> {
        self.tasks.get(idx)
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.iter()
    }
}
