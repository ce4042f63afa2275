//! Inter-stage control signals.

/// Redirect state Execute hands back to Fetch for one thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchSignals {
    /// Address Fetch must restart from.
    pub fixup_pc: u32,
    /// A redirect is pending and overrides the thread's sequential pc.
    pub fixup_needed: bool,
}

impl FetchSignals {
    /// Schedules a redirect to `pc`.
    pub fn redirect(&mut self, pc: u32) {
        self.fixup_pc = pc;
        self.fixup_needed = true;
    }

    /// Drops a consumed redirect.
    pub fn clear(&mut self) {
        self.fixup_needed = false;
    }
}
