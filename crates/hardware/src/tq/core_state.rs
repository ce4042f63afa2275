//! Per-Core Task Queue State Machine.
//!
//! Each core's view of the task queue is a two-phase finite-state record:
//! 1. **Update:** `update(state, latency)` records a requested next state and its latency.
//! 2. **Clock:** `clock()` commits the request and counts down `PENDING_*` states.
//! 3. **Ready:** A pending operation completes once `check_ready()` (countdown <= 1) holds.
//!
//! `BLOCKING`, `UNBLOCK` and `END_UNBLOCK` are fixed points: they hold until the task system
//! requests a change.

/// States of a core's task queue interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TqCoreStateType {
    /// Idle; may issue a request.
    #[default]
    Active,
    /// Dequeued from an empty queue; waiting for work, a barrier or the end.
    Blocking,
    /// Barrier complete; the next dequeue returns `Sync`.
    Unblock,
    /// End-of-work signal in flight.
    PendingEnd,
    /// Work has ended; every dequeue returns `End`.
    EndUnblock,
    /// Dequeue in flight.
    PendingDequeue,
    /// Single enqueue in flight.
    PendingEnqueueOne,
    /// Loop enqueue in flight.
    PendingEnqueueLoop,
    /// Barrier detected; release in flight.
    PendingUnblock,
    /// No requested change.
    Invalid,
}

impl TqCoreStateType {
    /// Whether the state counts down a latency.
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            TqCoreStateType::PendingEnd
                | TqCoreStateType::PendingDequeue
                | TqCoreStateType::PendingEnqueueOne
                | TqCoreStateType::PendingEnqueueLoop
                | TqCoreStateType::PendingUnblock
        )
    }
}

/// Two-phase task queue state of one core.
#[derive(Debug, Clone, Default)]
pub struct TqCoreState {
    curr: TqCoreStateType,
    next: Option<(TqCoreStateType, u64)>,
    countdown: u64,
}

impl TqCoreState {
    /// Creates a core in `Active`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state.
    pub fn state(&self) -> TqCoreStateType {
        self.curr
    }

    /// Requested next state, or `Invalid` when no change is pending.
    pub fn next_state(&self) -> TqCoreStateType {
        self.next.map_or(TqCoreStateType::Invalid, |(s, _)| s)
    }

    /// Whether a change has been requested this cycle.
    pub fn has_request(&self) -> bool {
        self.next.is_some()
    }

    /// Remaining latency of the committed state.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Requests a transition to `state` with `latency` cycles of countdown.
    ///
    /// Requesting `Invalid` cancels the pending request.
    pub fn update(&mut self, state: TqCoreStateType, latency: u64) {
        self.next = (state != TqCoreStateType::Invalid).then_some((state, latency));
    }

    /// Commits the requested state and advances the countdown of pending states.
    pub fn clock(&mut self) {
        if let Some((state, latency)) = self.next.take() {
            self.curr = state;
            self.countdown = latency;
        }
        if self.curr.is_pending() && self.countdown > 0 {
            self.countdown -= 1;
        }
    }

    /// Whether the pending operation has waited out its latency.
    pub fn check_ready(&self) -> bool {
        self.countdown <= 1
    }
}
