//! # Pipeline Scenario Tests
//!
//! Small programs driven through the full seven-stage pipeline. Each test checks the
//! architectural result together with the pipeline behaviour that produced it:
//!   1. Forwarding between back-to-back dependent instructions
//!   2. Misprediction recovery: wrong-path squash, fix-up fetch, BTB training
//!   3. Long-latency loads: register locks held until the value is published
//!   4. In-order retirement, and its waiver for parked non-blocking memory operations
//!   5. Lane ordering within a stage
//!   6. Multithreaded and multicore fetch
//!   7. Structural hazards: functional units, vector lane groups, SPR ordering

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use rigel_core::config::{BypassPolicy, Config, ThreadSwitchPolicy};
use rigel_core::soc::StallReason;
use rigel_core::stats::Stat;
use rstest::rstest;

use crate::common::harness::TestContext;
use crate::common::mocks::cache::scripted_reads;

const TICK_LIMIT: usize = 500;

fn retired_pcs(ctx: &TestContext) -> Vec<u32> {
    ctx.sim.cores[0].retire_trace.iter().map(|r| r.pc).collect()
}

#[test]
fn test_dependent_adds_forward_and_retire_in_order() {
    let mut ctx = TestContext::new("addi r1, r0, 5\naddi r2, r1, 3\nhlt\n");
    ctx.run();

    assert_eq!(ctx.reg(1), 5);
    assert_eq!(ctx.reg(2), 8);
    assert_eq!(retired_pcs(&ctx), vec![0, 4, 8]);
    let numbers: Vec<u64> = ctx.sim.cores[0].retire_trace.iter().map(|r| r.number).collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));

    let sb = &ctx.thread(0, 0).scoreboard;
    assert!(sb.is_idle());
    assert_eq!(sb.entry_at(1).map(|e| e.use_count), Some(0));
    assert_eq!(sb.entry_at(2).map(|e| e.use_count), Some(0));
    assert_eq!(ctx.stat(Stat::InstrRetired), 3);
    assert_eq!(ctx.stat(Stat::RetiredAlu), 2);
    assert_eq!(ctx.sim.cores[0].in_flight(), 0);
}

#[test]
fn test_disabled_bypass_is_slower_but_equivalent() {
    let source = "addi r1, r0, 5\naddi r2, r1, 3\naddi r3, r2, 1\nhlt\n";
    let mut full = TestContext::new(source);
    full.run();

    let mut config = Config::default();
    config.pipeline.bypass = BypassPolicy::Disabled;
    let mut disabled = TestContext::with_config(source, config);
    disabled.run();

    assert_eq!(full.reg(3), 9);
    assert_eq!(disabled.reg(3), 9);
    assert!(disabled.sim.cycle() > full.sim.cycle());
    assert!(disabled.stat(Stat::StallRegDependency) > full.stat(Stat::StallRegDependency));
}

#[test]
fn test_mispredicted_branch_squashes_wrong_path() {
    let mut ctx = TestContext::new(
        "        addi r1, r0, 1\n\
                 bnez r1, target\n\
                 addi r2, r0, 99\n\
                 addi r3, r0, 99\n\
         target: addi r4, r0, 7\n\
                 hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(3), 0);
    assert_eq!(ctx.reg(4), 7);
    assert_eq!(ctx.stat(Stat::BranchMispredict), 1);
    assert!(ctx.stat(Stat::InstrFlushed) >= 2);
    assert_eq!(retired_pcs(&ctx), vec![0, 4, 16, 20]);

    let t = ctx.thread(0, 0);
    assert_eq!(t.btb.entry(4).map(|e| e.target), Some(16));
    assert!(!t.signals.fixup_needed);
    assert!(t.scoreboard.is_idle());
}

#[test]
fn test_trained_loop_branch_stops_mispredicting() {
    let mut ctx = TestContext::new(
        "      addi r1, r0, 20\n\
         loop: subi r1, r1, 1\n\
               addi r2, r2, 2\n\
               bnez r1, loop\n\
               hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(1), 0);
    assert_eq!(ctx.reg(2), 40);
    assert_eq!(ctx.stat(Stat::BranchResolved), 20);
    // The first taken iteration trains the BTB and the final fall-through costs one more.
    assert!(ctx.stat(Stat::BranchMispredict) <= 3);
    assert!(ctx.stat(Stat::BtbHit) > 0);
}

#[test]
fn test_drain_on_mispredict() {
    let mut config = Config::default();
    config.pipeline.drain_on_mispredict = true;
    let mut ctx = TestContext::with_config(
        "        addi r1, r0, 1\n\
                 bnez r1, target\n\
                 addi r2, r0, 99\n\
         target: addi r4, r1, 7\n\
                 hlt\n",
        config,
    );
    ctx.run();

    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(4), 8);
    assert_eq!(ctx.stat(Stat::ScoreboardDrains), 1);
    assert!(!ctx.thread(0, 0).scoreboard.is_draining());
}

#[test]
fn test_load_miss_locks_destination_until_published() {
    let (cache, polls) = scripted_reads(vec![StallReason::L1DPending, StallReason::L2DAccess], 41);
    let mut ctx = TestContext::with_cache(
        "ldw r1, r0, 0x100\naddi r2, r1, 1\nhlt\n",
        Config::default(),
        Box::new(cache),
    );

    let mut saw_lock = false;
    for _ in 0..TICK_LIMIT {
        if ctx.sim.is_halted() {
            break;
        }
        ctx.tick();
        let locked = ctx.thread(0, 0).scoreboard.is_locked(1);
        match polls.load(Ordering::SeqCst) {
            1 | 2 => {
                assert!(locked, "r1 must stay locked while the load is outstanding");
                saw_lock = true;
            }
            n if n >= 3 => assert!(!locked, "r1 must unlock once the value is published"),
            _ => {}
        }
    }

    assert!(ctx.sim.is_halted());
    assert!(saw_lock);
    assert_eq!(polls.load(Ordering::SeqCst), 3);
    assert_eq!(ctx.reg(1), 41);
    assert_eq!(ctx.reg(2), 42);
    let stats = ctx.sim.stats();
    assert_eq!(stats.mem_stall(StallReason::L1DPending), 1);
    assert_eq!(stats.mem_stall(StallReason::L2DAccess), 1);
    assert_eq!(stats.get(Stat::L2Hits), 1);
    assert_eq!(stats.get(Stat::RetiredLoad), 1);
    assert!(stats.get(Stat::StallMemory) >= 1);
    assert!(stats.get(Stat::StallRegDependency) >= 1);
    assert_eq!(stats.get(Stat::OutOfOrderRetire), 0);
}

#[test]
fn test_disabled_bypass_load_holds_lock_until_writeback() {
    let (cache, polls) = scripted_reads(vec![StallReason::L1DPending], 41);
    let mut config = Config::default();
    config.pipeline.bypass = BypassPolicy::Disabled;
    let mut ctx = TestContext::with_cache("ldw r1, r0, 0x100\naddi r2, r1, 1\nhlt\n", config, Box::new(cache));

    let mut locked_after_answer = false;
    for _ in 0..TICK_LIMIT {
        if ctx.sim.is_halted() {
            break;
        }
        ctx.tick();
        if polls.load(Ordering::SeqCst) == 2 && ctx.thread(0, 0).scoreboard.is_locked(1) {
            locked_after_answer = true;
        }
    }

    assert!(ctx.sim.is_halted());
    assert!(locked_after_answer, "r1 stays locked until WriteBack without bypass");
    assert!(!ctx.thread(0, 0).scoreboard.is_locked(1));
    assert_eq!(ctx.reg(2), 42);
}

const PARK_PROGRAM: &str = "ldw r1, r0, 0x100\naddi r3, r0, 9\naddi r2, r1, 1\nhlt\n";

fn park_stalls() -> Vec<StallReason> {
    vec![
        StallReason::L1DPending,
        StallReason::L2DAccess,
        StallReason::L2DAccess,
        StallReason::L2DAccess,
    ]
}

#[test]
fn test_non_blocking_load_retires_out_of_order() {
    let (cache, _) = scripted_reads(park_stalls(), 41);
    let mut config = Config::default();
    config.pipeline.non_blocking_memory = true;
    let mut ctx = TestContext::with_cache(PARK_PROGRAM, config, Box::new(cache));
    ctx.run();

    assert_eq!(ctx.reg(1), 41);
    assert_eq!(ctx.reg(2), 42);
    assert_eq!(ctx.reg(3), 9);
    assert_eq!(ctx.stat(Stat::NonBlockingParked), 1);
    assert_eq!(ctx.stat(Stat::OutOfOrderRetire), 1);
    assert_eq!(retired_pcs(&ctx), vec![4, 0, 8, 12]);
    let core = &ctx.sim.cores[0];
    assert!(core.memory_ops.is_empty());
    assert!(core.memory_done.is_empty());
}

#[test]
fn test_blocking_load_retires_in_order() {
    let (cache, _) = scripted_reads(park_stalls(), 41);
    let mut ctx = TestContext::with_cache(PARK_PROGRAM, Config::default(), Box::new(cache));
    ctx.run();

    assert_eq!(ctx.reg(2), 42);
    assert_eq!(ctx.stat(Stat::NonBlockingParked), 0);
    assert_eq!(ctx.stat(Stat::OutOfOrderRetire), 0);
    assert_eq!(retired_pcs(&ctx), vec![0, 4, 8, 12]);
}

#[test]
fn test_stalled_lane_holds_younger_lane() {
    let mut ctx = TestContext::new(
        "addi r5, r0, 3\n\
         nop\n\
         mul r1, r5, r5\n\
         nop\n\
         addi r2, r1, 1\n\
         addi r3, r0, 2\n\
         hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(1), 9);
    assert_eq!(ctx.reg(2), 10);
    assert_eq!(ctx.reg(3), 2);
    assert!(ctx.stat(Stat::StallLaneOrder) >= 1);
    assert_eq!(retired_pcs(&ctx), vec![0, 4, 8, 12, 16, 20, 24]);
}

#[test]
fn test_single_issue_fetches_one_per_cycle() {
    let source = "addi r1, r0, 1\naddi r2, r0, 2\naddi r3, r0, 3\naddi r4, r0, 4\nhlt\n";
    let mut wide = TestContext::new(source);
    wide.run();
    let mut config = Config::default();
    config.pipeline.issue_width = 1;
    let mut narrow = TestContext::with_config(source, config);
    narrow.run();

    assert_eq!(narrow.reg(4), 4);
    assert!(narrow.sim.cycle() > wide.sim.cycle());
    assert_eq!(narrow.stat(Stat::UnalignedFetch), 0);
}

#[test]
fn test_unaligned_group_fetches_single_lane() {
    let mut ctx = TestContext::new(
        "      jmp odd\n\
               nop\n\
               nop\n\
         odd:  addi r1, r0, 1\n\
               hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(1), 1);
    assert!(ctx.stat(Stat::UnalignedFetch) >= 1);
}

#[test]
fn test_hardware_threads_share_the_core() {
    let mut config = Config::default();
    config.system.threads_per_core = 2;
    let mut ctx = TestContext::with_config("mfsr r1, 1\naddi r2, r1, 10\nhlt\n", config);
    ctx.run();

    assert_eq!(ctx.reg_of(0, 0, 2), 10);
    assert_eq!(ctx.reg_of(0, 1, 2), 11);
    assert_eq!(ctx.stat(Stat::ThreadsHalted), 2);
    assert_eq!(ctx.stat(Stat::InstrRetired), 6);
}

#[test]
fn test_cores_run_independently() {
    let mut config = Config::default();
    config.system.num_cores = 3;
    let mut ctx = TestContext::with_config("mfsr r1, 0\naddi r2, r1, 10\nhlt\n", config);
    ctx.run();

    for core in 0..3 {
        assert_eq!(ctx.reg_of(core, 0, 2), 10 + core as u32);
        assert!(ctx.sim.cores[core].is_halted());
    }
}

#[test]
fn test_switch_on_miss_threads_complete() {
    let mut config = Config::default();
    config.system.threads_per_core = 2;
    config.pipeline.thread_switch = ThreadSwitchPolicy::SwitchOnMiss;
    let mut ctx = TestContext::with_config(
        ".word 0x100 5\nldw r1, r0, 0x100\naddi r2, r1, 1\nhlt\n",
        config,
    );
    ctx.run();

    assert_eq!(ctx.reg_of(0, 0, 2), 6);
    assert_eq!(ctx.reg_of(0, 1, 2), 6);
    assert!(ctx.stat(Stat::ThreadSwitches) >= 1);
}

#[test]
fn test_single_alu_serializes_paired_multiplies() {
    let source = "addi r5, r0, 3\n\
                  addi r6, r0, 4\n\
                  nop\n\
                  nop\n\
                  mul r1, r5, r5\n\
                  mul r2, r6, r6\n\
                  hlt\n";
    let mut paired = TestContext::new(source);
    paired.run();

    let mut config = Config::default();
    config.pipeline.functional_units.alu = 1;
    let mut single = TestContext::with_config(source, config);
    single.run();

    assert_eq!((single.reg(1), single.reg(2)), (9, 16));
    assert_eq!((paired.reg(1), paired.reg(2)), (9, 16));
    assert_eq!(paired.stat(Stat::StallFuAlu), 0);
    // Both the addi pair and the mul pair lose their second lane.
    assert!(single.stat(Stat::StallFuAlu) >= 2);
    assert!(single.sim.cycle() > paired.sim.cycle());
    assert_eq!(retired_pcs(&single), vec![0, 4, 8, 12, 16, 20, 24]);
}

#[rstest]
#[case(1, 6)]
#[case(2, 2)]
#[case(4, 0)]
fn test_vector_op_holds_execute_per_lane_group(#[case] lanes_per_cycle: usize, #[case] stalls: u64) {
    let mut config = Config::default();
    config.pipeline.vector_lanes_per_cycle = lanes_per_cycle;
    let mut ctx = TestContext::with_config(
        "addi r1, r0, 3\nvsplat v1, r1\nvadd v2, v1, v1\nhlt\n",
        config,
    );
    ctx.run();

    let regs = &ctx.thread(0, 0).regs;
    assert_eq!(regs.read_vector(1).unwrap(), [3; 4]);
    assert_eq!(regs.read_vector(2).unwrap(), [6; 4]);
    assert_eq!(ctx.stat(Stat::StallVector), stalls);
}

#[test]
fn test_vector_load_resumes_at_first_unfinished_lane() {
    let (cache, polls) = scripted_reads(vec![StallReason::L1DPending, StallReason::L1DPending], 7);
    let mut ctx = TestContext::with_cache("vldw v3, r0, 0x100\nhlt\n", Config::default(), Box::new(cache));
    ctx.run();

    assert_eq!(ctx.thread(0, 0).regs.read_vector(3).unwrap(), [7; 4]);
    // Two stalled polls of lane 0, then one read per lane.
    assert_eq!(polls.load(Ordering::SeqCst), 6);
    assert_eq!(ctx.sim.stats().mem_stall(StallReason::L1DPending), 2);
    assert_eq!(ctx.stat(Stat::MemReads), 4);
    assert!(ctx.thread(0, 0).scoreboard.is_idle());
}

#[test]
fn test_mfsr_waits_for_older_mtsr() {
    let mut ctx = TestContext::new(
        "addi r1, r0, 77\n\
         mtsr r1, 8\n\
         mfsr r2, 8\n\
         hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(2), 77);
    assert_eq!(ctx.thread(0, 0).sprs.read(8), 77);
    assert!(ctx.stat(Stat::StallSpr) >= 1);
    assert_eq!(ctx.thread(0, 0).pending_spr_writes, 0);
    assert_eq!(retired_pcs(&ctx), vec![0, 4, 8, 12]);
}
