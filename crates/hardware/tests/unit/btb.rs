//! # Branch Target Buffer Tests

use proptest::prelude::*;
use rigel_core::core::units::bru::Btb;

#[test]
fn test_full_buffer_evicts_least_recent() {
    let mut btb = Btb::new(3, 3);
    btb.update(0x10, 0x100, 1);
    btb.update(0x20, 0x200, 2);
    btb.update(0x30, 0x300, 3);
    assert_eq!(btb.lookup(0x10, 4), Some(0x100));
    assert_eq!(btb.lru_victim(), Some(0x20));
    btb.update(0x40, 0x400, 5);
    assert_eq!(btb.len(), 3);
    assert_eq!(btb.entry(0x20), None);
    assert!(btb.entry(0x10).is_some());
}

#[test]
fn test_confidence_saturates_and_decays() {
    let mut btb = Btb::new(4, 2);
    btb.update(0x10, 0x100, 1);
    btb.update(0x10, 0x100, 2);
    btb.update(0x10, 0x100, 3);
    assert_eq!(btb.entry(0x10).map(|e| e.confidence), Some(2));
    btb.penalize(0x10);
    assert!(btb.entry(0x10).is_some());
    btb.penalize(0x10);
    assert!(btb.is_empty());
}

#[test]
fn test_new_target_resets_confidence() {
    let mut btb = Btb::new(4, 3);
    btb.update(0x10, 0x100, 1);
    btb.update(0x10, 0x100, 2);
    btb.update(0x10, 0x180, 3);
    let e = btb.entry(0x10).unwrap();
    assert_eq!((e.target, e.confidence), (0x180, 1));
}

proptest! {
    #[test]
    fn test_capacity_never_exceeded(capacity in 1usize..8, pcs in proptest::collection::vec(0u32..64, 1..100)) {
        let mut btb = Btb::new(capacity, 3);
        for (cycle, pc) in pcs.iter().enumerate() {
            btb.update(pc * 4, pc * 4 + 0x100, cycle as u64);
            prop_assert!(btb.len() <= capacity);
            prop_assert_eq!(btb.lookup(pc * 4, cycle as u64), Some(pc * 4 + 0x100));
        }
    }
}
