//! # Whole-Program Tests
//!
//! Complete programs exercising memory, system calls, the task queue, thread
//! synchronization and the fatal error paths.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rigel_core::config::Config;
use rigel_core::isa::assemble;
use rigel_core::soc::{StallReason, SyscallHandler, SyscallRequest};
use rigel_core::stats::Stat;
use rigel_core::{SimError, Simulator};

use crate::common::harness::TestContext;
use crate::common::mocks::cache::scripted_reads;

#[test]
fn test_loop_sum_through_memory() {
    let mut ctx = TestContext::new(
        "        addi r1, r0, 10\n\
                 addi r2, r0, 0\n\
         loop:   add r2, r2, r1\n\
                 subi r1, r1, 1\n\
                 bnez r1, loop\n\
                 stw r2, r0, 0x200\n\
                 ldw r3, r0, 0x200\n\
                 addi r1, r0, 1\n\
                 syscall\n\
                 printreg r3\n\
                 hlt\n",
    );
    ctx.run();

    assert_eq!(ctx.reg(3), 55);
    assert_eq!(ctx.sim.output(), "55r3 = 0x37\n");
    assert_eq!(ctx.stat(Stat::RetiredStore), 1);
    assert_eq!(ctx.stat(Stat::RetiredLoad), 1);
    assert_eq!(ctx.stat(Stat::RetiredSyscall), 1);
}

#[test]
fn test_data_words_are_preloaded() {
    let mut ctx = TestContext::new(
        ".word 0x300 7 8\n\
         ldw r1, r0, 0x300\n\
         ldw r2, r0, 0x304\n\
         add r3, r1, r2\n\
         hlt\n",
    );
    ctx.run();
    assert_eq!(ctx.reg(3), 15);
}

#[test]
fn test_print_char_and_hex() {
    let mut ctx = TestContext::new(
        "addi r1, r0, 2\n\
         addi r2, r0, 65\n\
         syscall\n\
         addi r1, r0, 3\n\
         addi r2, r0, 255\n\
         syscall\n\
         hlt\n",
    );
    ctx.run();
    assert_eq!(ctx.sim.output(), "A0xff");
}

#[test]
fn test_exit_thread_syscall_halts() {
    let mut ctx = TestContext::new("addi r1, r0, 5\nsyscall\naddi r2, r0, 1\nhlt\n");
    ctx.run();
    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.stat(Stat::ThreadsHalted), 1);
}

#[derive(Debug)]
struct Recorder {
    calls: Arc<Mutex<Vec<(u32, [u32; 3])>>>,
}

impl SyscallHandler for Recorder {
    fn do_system_call(&mut self, req: &mut SyscallRequest) {
        self.calls.lock().unwrap().push((req.number, req.args));
        req.result = 0x99;
    }
}

#[test]
fn test_custom_syscall_handler() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler = Recorder {
        calls: Arc::clone(&calls),
    };
    let program = assemble(
        "addi r1, r0, 40\n\
         addi r2, r0, 1\n\
         addi r3, r0, 2\n\
         addi r4, r0, 3\n\
         syscall\n\
         addi r5, r1, 1\n\
         hlt\n",
    )
    .unwrap();
    let mut sim = Simulator::new(Config::default(), program)
        .unwrap()
        .with_syscalls(Box::new(handler));
    assert!(sim.run().unwrap().halted);

    assert_eq!(*calls.lock().unwrap(), vec![(40, [1, 2, 3])]);
    assert_eq!(sim.cores[0].threads[0].regs.read(5).unwrap(), 0x9a);
}

#[test]
fn test_task_queue_round_trip_and_barrier() {
    let mut ctx = TestContext::new(
        "addi r1, r0, 0x40\n\
         addi r2, r0, 0x80\n\
         addi r3, r0, 2\n\
         addi r4, r0, 5\n\
         tqenq r1, r2, r3, r4\n\
         tqdeq r5\n\
         tqdeq r9\n\
         mfsr r13, 6\n\
         hlt\n",
    );
    ctx.run();

    assert_eq!((ctx.reg(5), ctx.reg(6), ctx.reg(7), ctx.reg(8)), (0x40, 0x80, 2, 5));
    assert_eq!((ctx.reg(9), ctx.reg(10), ctx.reg(11), ctx.reg(12)), (0, 0, 0, 0));
    assert_eq!(ctx.reg(13), 4);
    assert_eq!(ctx.stat(Stat::TqEnqueued), 1);
    assert_eq!(ctx.stat(Stat::TqDequeued), 1);
    assert_eq!(ctx.stat(Stat::TqSyncs), 1);
    assert_eq!(ctx.stat(Stat::RetiredTaskQueue), 3);
}

#[test]
fn test_task_queue_overflow_is_fatal() {
    let mut config = Config::default();
    config.task_queue.max_size = 2;
    let program = assemble(
        "addi r1, r0, 0x40\n\
         addi r3, r0, 3\n\
         addi r4, r0, 1\n\
         tqloop r1, r2, r3, r4\n\
         hlt\n",
    )
    .unwrap();
    let mut sim = Simulator::new(config, program).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimError::TaskQueueOverflow {
            core: 0,
            requested: 3,
            free: 2
        }
    ));
    assert_eq!(sim.stats().get(Stat::TqOverflows), 1);
}

#[test]
fn test_sync_rendezvous_between_threads() {
    let mut config = Config::default();
    config.system.threads_per_core = 2;
    let mut ctx = TestContext::with_config("mfsr r2, 1\nsync\naddi r1, r2, 1\nhlt\n", config);
    ctx.run();

    assert_eq!(ctx.reg_of(0, 0, 1), 1);
    assert_eq!(ctx.reg_of(0, 1, 1), 2);
    assert_eq!(ctx.stat(Stat::SyncRendezvous), 1);
}

#[test]
fn test_undefined_instruction_is_fatal() {
    let program = assemble("addi r1, r0, 1\n").unwrap();
    let mut sim = Simulator::new(Config::default(), program).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimError::UndefinedInstruction {
            core: 0,
            thread: 0,
            pc: 4
        }
    ));
    assert_eq!(sim.stats().get(Stat::InstrRetired), 1);
    assert!(sim.dump_state().contains("core 0"));
}

#[test]
fn test_watchdog_reports_deadlock() {
    let (cache, _) = scripted_reads(vec![StallReason::L1DPending; 10_000], 0);
    let mut config = Config::default();
    config.general.watchdog_cycles = 50;
    let program = assemble("ldw r1, r0, 0x100\nhlt\n").unwrap();
    let mut sim = Simulator::with_cache_model(config, program, Box::new(cache)).unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::Deadlock { core: 0, thread: 0, .. }));
    assert!(sim.cycle() < 200);
}

#[test]
fn test_blocked_dequeue_does_not_starve_sibling_watchdog() {
    let mut config = Config::default();
    config.system.num_cores = 2;
    config.system.threads_per_core = 2;
    config.general.watchdog_cycles = 300;
    // Core 0 blocks on the empty queue until core 1 finishes a long spin and ends the work.
    let mut ctx = TestContext::with_config(
        "        mfsr r1, 0\n\
                 bnez r1, worker\n\
                 tqdeq r5\n\
                 hlt\n\
         worker: addi r2, r0, 400\n\
         spin:   subi r2, r2, 1\n\
                 bnez r2, spin\n\
                 tqend\n\
                 hlt\n",
        config,
    );
    ctx.run();

    assert!(ctx.sim.cycle() > 400);
    for thread in 0..2 {
        assert_eq!(ctx.thread(0, thread).sprs.read(6), 5);
        assert_eq!(ctx.reg_of(0, thread, 5), 0);
        assert_eq!(ctx.reg_of(1, thread, 2), 0);
    }
    assert_eq!(ctx.stat(Stat::ThreadsHalted), 4);
    assert_eq!(ctx.stat(Stat::TqSyncs), 0);
}

#[test]
fn test_watchdog_blames_thread_owning_the_memory_wait() {
    let (cache, _) = scripted_reads(vec![StallReason::L1DPending; 10_000], 0);
    let mut config = Config::default();
    config.system.threads_per_core = 2;
    config.general.watchdog_cycles = 50;
    let program = assemble("ldw r1, r0, 0x100\nhlt\n").unwrap();
    let mut sim = Simulator::with_cache_model(config, program, Box::new(cache)).unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::Deadlock { core: 0, thread: 0, .. }));
    assert!(sim.cycle() < 200);
}

#[test]
fn test_cycle_limit_stops_without_error() {
    let mut config = Config::default();
    config.general.max_cycles = 100;
    let program = assemble("loop: jmp loop\n").unwrap();
    let mut sim = Simulator::new(config, program).unwrap();

    let summary = sim.run().unwrap();
    assert!(!summary.halted);
    assert_eq!(summary.cycles, 100);
    assert!(summary.retired > 0);
}
