//! # Scoreboard Tests
//!
//! Use counts return to zero, locked registers are never readable, and the bypass
//! policy decides when a producer's value may be consumed.

use proptest::prelude::*;
use rigel_core::common::error::SimError;
use rigel_core::config::BypassPolicy;
use rigel_core::core::pipeline::ScoreBoard;
use rstest::rstest;

fn sb(policy: BypassPolicy) -> ScoreBoard {
    ScoreBoard::new(32, true, true, policy)
}

#[test]
fn test_register_zero_is_never_tracked() {
    let mut s = sb(BypassPolicy::Full);
    s.acquire_locked(0).unwrap();
    assert!(!s.is_locked(0));
    assert!(s.check(0, 0).unwrap());
    s.release(0).unwrap();
    assert!(s.is_idle());
}

#[test]
fn test_value_readable_after_latency() {
    let mut s = sb(BypassPolicy::Full);
    s.acquire(3, 77, 10, 4).unwrap();
    assert!(!s.check(3, 13).unwrap());
    assert!(s.check(3, 14).unwrap());
    assert!(s.bypassed(3));
    assert_eq!(s.forward(3), 77);
}

#[test]
fn test_disabled_bypass_waits_for_release() {
    let mut s = sb(BypassPolicy::Disabled);
    s.acquire(3, 77, 10, 1).unwrap();
    assert!(!s.check(3, 100).unwrap());
    s.release(3).unwrap();
    assert!(s.check(3, 100).unwrap());
}

#[rstest]
#[case(BypassPolicy::Full, true)]
#[case(BypassPolicy::Disabled, false)]
fn test_upgrade_unlocks_only_with_bypass(#[case] policy: BypassPolicy, #[case] unlocked: bool) {
    let mut s = sb(policy);
    s.acquire_locked(5).unwrap();
    assert!(!s.check(5, 0).unwrap());
    assert_eq!(s.upgrade(5, 9, 3).unwrap(), unlocked);
    assert_eq!(s.is_locked(5), !unlocked);
}

#[test]
fn test_misuse_is_fatal() {
    let mut s = sb(BypassPolicy::Full);
    assert!(matches!(s.release(4), Err(SimError::NegativeUseCount { reg: 4 })));
    s.lock(4).unwrap();
    assert!(matches!(s.lock(4), Err(SimError::DoubleLock { reg: 4 })));
    s.unlock(4).unwrap();
    assert!(matches!(s.unlock(4), Err(SimError::UnlockWhileUnlocked { reg: 4 })));
    assert!(matches!(s.check(40, 0), Err(SimError::RegisterOutOfRange { reg: 40, size: 32 })));
}

#[test]
fn test_unlock_tolerated_without_bypass() {
    let mut s = sb(BypassPolicy::Disabled);
    assert!(s.unlock(4).is_ok());
}

#[test]
fn test_drain_blocks_until_idle() {
    let mut s = sb(BypassPolicy::Full);
    s.acquire(2, 1, 0, 1).unwrap();
    s.begin_drain();
    assert!(s.is_draining());
    assert!(!s.check(7, 100).unwrap());
    s.release(2).unwrap();
    assert!(!s.is_draining());
    assert!(s.check(7, 100).unwrap());
}

proptest! {
    #[test]
    fn test_balanced_claims_return_to_idle(regs in proptest::collection::vec(1usize..32, 1..64)) {
        let mut s = sb(BypassPolicy::Full);
        for (i, &r) in regs.iter().enumerate() {
            s.acquire(r, i as u32, i as u64, 1).unwrap();
        }
        for &r in regs.iter().rev() {
            s.release(r).unwrap();
        }
        prop_assert!(s.is_idle());
        for r in 0..32 {
            prop_assert_eq!(s.entry_at(r).map(|e| e.use_count), Some(0));
        }
    }

    #[test]
    fn test_locked_register_is_never_readable(reg in 1usize..32, now in 0u64..1000, extra in 0usize..4) {
        let mut s = sb(BypassPolicy::Full);
        for _ in 0..extra {
            s.acquire(reg, 1, 0, 0).unwrap();
        }
        s.acquire_locked(reg).unwrap();
        prop_assert!(!s.check(reg, now).unwrap());
    }
}
