use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mockall::mock;
use rigel_core::soc::{AccessOutcome, AccessRequest, CacheModel, HitLevels, MessageTag, StallReason};

mock! {
    pub Cache {}

    impl CacheModel for Cache {
        fn read_access(&mut self, req: &AccessRequest) -> AccessOutcome;
        fn write_access(&mut self, req: &AccessRequest, value: u32) -> AccessOutcome;
        fn global_memory_access(&mut self, req: &AccessRequest, tag: MessageTag) -> StallReason;
        fn prefetch_line(&mut self, req: &AccessRequest) -> StallReason;
        fn invalidate_line(&mut self, req: &AccessRequest) -> StallReason;
        fn writeback_line(&mut self, req: &AccessRequest) -> StallReason;
        fn memory_barrier(&mut self, core: usize, cycle: u64) -> StallReason;
        fn broadcast(&mut self, req: &AccessRequest, value: u32) -> StallReason;
        fn functional_read(&self, addr: u32) -> u32;
        fn functional_write(&mut self, addr: u32, value: u32);
    }
}

/// A cache whose reads answer with `stalls` in order, then complete with `value` from L2.
///
/// Returns the mock and a counter of read polls seen so far.
pub fn scripted_reads(stalls: Vec<StallReason>, value: u32) -> (MockCache, Arc<AtomicUsize>) {
    let polls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&polls);
    let mut cache = MockCache::new();
    cache.expect_read_access().returning(move |_| {
        let n = seen.fetch_add(1, Ordering::SeqCst);
        match stalls.get(n) {
            Some(&stall) => AccessOutcome::stalled(stall),
            None => AccessOutcome::done(
                value,
                HitLevels {
                    l2: true,
                    ..HitLevels::default()
                },
            ),
        }
    });
    cache.expect_functional_write().returning(|_, _| ());
    (cache, polls)
}
