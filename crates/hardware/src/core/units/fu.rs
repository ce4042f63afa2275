//! Functional unit availability.
//!
//! Each core has a fixed number of every arbitrated unit per cycle. The counters are
//! core-wide: hardware threads time-share issue slots, not units.

use crate::config::FunctionalUnits;
use crate::isa::FuClass;

/// Per-cycle functional unit counters of one core.
#[derive(Debug, Clone)]
pub struct FunctionalUnitPool {
    limits: [usize; FuClass::ARBITRATED.len()],
    used: [usize; FuClass::ARBITRATED.len()],
}

impl FunctionalUnitPool {
    /// Creates a pool with the configured unit counts.
    pub fn new(units: &FunctionalUnits) -> Self {
        Self {
            limits: [units.alu, units.fpu, units.shifter, units.branch, units.mem],
            used: [0; FuClass::ARBITRATED.len()],
        }
    }

    fn slot(class: FuClass) -> Option<usize> {
        FuClass::ARBITRATED.iter().position(|c| *c == class)
    }

    /// Releases every unit for a new cycle.
    pub fn reset(&mut self) {
        self.used = [0; FuClass::ARBITRATED.len()];
    }

    /// Claims one unit of `class` for this cycle.
    ///
    /// # Returns
    ///
    /// `false` when every unit of the class is already busy. `FuClass::None` always succeeds.
    pub fn try_claim(&mut self, class: FuClass) -> bool {
        let Some(i) = Self::slot(class) else {
            return true;
        };
        if self.used[i] >= self.limits[i] {
            return false;
        }
        self.used[i] += 1;
        true
    }

    /// Units of `class` claimed so far this cycle.
    pub fn in_use(&self, class: FuClass) -> usize {
        Self::slot(class).map_or(0, |i| self.used[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_saturate_until_reset() {
        let mut pool = FunctionalUnitPool::new(&FunctionalUnits {
            mem: 1,
            ..FunctionalUnits::default()
        });
        assert!(pool.try_claim(FuClass::Mem));
        assert!(!pool.try_claim(FuClass::Mem));
        assert!(pool.try_claim(FuClass::None));
        pool.reset();
        assert!(pool.try_claim(FuClass::Mem));
        assert_eq!(pool.in_use(FuClass::Mem), 1);
    }
}
