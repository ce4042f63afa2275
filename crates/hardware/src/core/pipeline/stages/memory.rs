//! Memory Access (MEM) Stage.
//!
//! This module implements the fourth stage of the pipeline. It performs the following:
//! 1. **Access Issue:** Sends loads, stores, global operations, atomics and broadcasts to
//!    the cache model. A hit completes here; a miss travels on to CCacheAccess, which keeps
//!    polling.
//! 2. **Load Ordering:** At most one load per thread may be outstanding. A miss can
//!    deschedule the thread under the switch-on-miss policy.
//! 3. **Line Operations:** Prefetch, invalidate, write-back and memory barriers are polled
//!    here until the cache model accepts them.
//! 4. **Vector Accesses:** One word per lane, resumed lane by lane across stalls.
//! 5. **Task Queue:** Enqueue, loop enqueue, dequeue and end requests poll the task system.
//! 6. **System Calls:** Occupy the stage for one extra cycle, then call the handler.
//!
//! [`poll_access`] is shared with CCacheAccess and the non-blocking side list. It is safe to
//! call every cycle: the cache model is polled with the same request until it answers.

use tracing::{debug, trace};

use crate::common::constants::VECTOR_LANES;
use crate::common::error::SimError;
use crate::config::ThreadSwitchPolicy;
use crate::core::cpu::Core;
use crate::core::pipeline::arena::InstrId;
use crate::core::pipeline::latches::PipeStage;
use crate::core::pipeline::traits::{PipelineStage, StallCause, StepResult};
use crate::core::units::lsu::Lsu;
use crate::core::units::lsu::atomic::atomic_alu;
use crate::isa::{OpClass, Opcode};
use crate::sim::SimContext;
use crate::soc::{AccessRequest, HitLevels, MessageTag, StallReason, SyscallRequest};
use crate::stats::Stat;
use crate::tq::{TaskDescriptor, TqRetType};

/// Memory stage.
#[derive(Debug)]
pub struct Memory;

impl PipelineStage for Memory {
    const STAGE: PipeStage = PipeStage::Mem;

    fn update(core: &mut Core, ctx: &mut SimContext, lane: usize) -> Result<StepResult, SimError> {
        let Some(id) = core.latches.get(PipeStage::Mem, lane) else {
            return Ok(StepResult::Bubble);
        };
        let token = core.arena.get(id)?;
        if token.flags.done_mem_access {
            return Ok(StepResult::Completed(id));
        }
        trace!(core = core.id, lane, "MEM {token}");
        match token.class() {
            OpClass::Load => load(core, ctx, id),
            OpClass::Store | OpClass::GlobalLoad | OpClass::GlobalStore | OpClass::Atomic | OpClass::Broadcast => {
                store_or_global(core, ctx, id)
            }
            OpClass::Prefetch | OpClass::CacheLine | OpClass::Barrier => line_op(core, ctx, id),
            OpClass::VectorMem => vector_access(core, ctx, id),
            OpClass::TaskQueue => task_queue(core, ctx, id),
            OpClass::Syscall => syscall(core, ctx, id),
            _ => {
                core.arena.get_mut(id)?.flags.done_mem_access = true;
                Ok(StepResult::Completed(id))
            }
        }
    }
}

fn request(core: &Core, ctx: &SimContext, id: InstrId, addr: u32) -> Result<AccessRequest, SimError> {
    let token = core.arena.get(id)?;
    Ok(AccessRequest {
        instr: token.number,
        core: core.id,
        cluster: core.cluster,
        thread: token.thread,
        addr,
        cycle: ctx.cycle,
    })
}

fn count_hits(ctx: &mut SimContext, hits: HitLevels) {
    if hits.l1 {
        ctx.stats.inc(Stat::L1Hits);
    }
    if hits.l2 {
        ctx.stats.inc(Stat::L2Hits);
    }
    if hits.l3 {
        ctx.stats.inc(Stat::L3Hits);
    }
}

/// Drops every link reservation on `addr`.
fn clear_reservations(ctx: &mut SimContext, addr: u32) {
    ctx.reservations.retain(|_, a| *a != addr);
}

/// Publishes the destination values of `id` on the bypass network.
///
/// Locks taken at Execute are dropped when the bypass policy allows it; otherwise they are
/// left for WriteBack.
pub(crate) fn publish_results(core: &mut Core, id: InstrId, now: u64) -> Result<(), SimError> {
    let token = core.arena.get_mut(id)?;
    let thread = &mut core.threads[token.thread];
    let scalar = thread.regs.scalar_len();
    let sb = &mut thread.scoreboard;
    let mut locked = false;
    for dst in token.dst_slots() {
        let slot = dst.reg.slot(scalar);
        if !sb.upgrade(slot, dst.value, now)? {
            locked |= sb.is_locked(slot);
        }
    }
    token.flags.has_reg_lock = locked;
    Ok(())
}

/// Polls the cache model for the access of `id` and applies its effect once complete.
///
/// # Returns
///
/// The cache model's answer. On `NoStall` the destination values are published and the
/// token is marked complete; otherwise the stall is charged to the token.
pub fn poll_access(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StallReason, SimError> {
    let token = core.arena.get(id)?;
    let (op, class, addr, thread, number) = (token.op(), token.class(), token.addr, token.thread, token.number);
    let (data, compare) = (token.src(1), token.src(2));
    let req = request(core, ctx, id, addr)?;

    let (stall, value, hits) = match class {
        OpClass::Load => {
            let o = ctx.cache.read_access(&req);
            (o.stall, o.value, o.hits)
        }
        OpClass::Store => {
            let o = ctx.cache.write_access(&req, data);
            (o.stall, o.value, o.hits)
        }
        OpClass::GlobalLoad => (ctx.cache.global_memory_access(&req, MessageTag::GlobalLoad), 0, HitLevels::default()),
        OpClass::GlobalStore => (ctx.cache.global_memory_access(&req, MessageTag::GlobalStore), 0, HitLevels::default()),
        OpClass::Atomic => (ctx.cache.global_memory_access(&req, MessageTag::Atomic), 0, HitLevels::default()),
        OpClass::Broadcast => (ctx.cache.broadcast(&req, data), 0, HitLevels::default()),
        _ => (StallReason::NoStall, 0, HitLevels::default()),
    };

    if stall.is_stall() {
        let token = core.arena.get_mut(id)?;
        token.mem_stall_cycles += 1;
        token.flags.mem_outstanding = true;
        ctx.stats.inc_mem_stall(stall);
        return Ok(stall);
    }

    count_hits(ctx, hits);
    let result = match class {
        OpClass::Load => {
            if op == Opcode::Ldl {
                let _ = ctx.reservations.insert((core.id, thread), addr);
            }
            Some(value)
        }
        OpClass::Store => {
            clear_reservations(ctx, addr);
            None
        }
        OpClass::GlobalLoad => Some(ctx.cache.functional_read(addr)),
        OpClass::GlobalStore | OpClass::Broadcast => {
            ctx.cache.functional_write(addr, data);
            clear_reservations(ctx, addr);
            None
        }
        OpClass::Atomic => {
            let old = ctx.cache.functional_read(addr);
            if let Some(new) = atomic_alu(op, old, data, compare) {
                ctx.cache.functional_write(addr, new);
                clear_reservations(ctx, addr);
            }
            Some(old)
        }
        _ => None,
    };

    let token = core.arena.get_mut(id)?;
    if let Some(v) = result {
        token.set_dst_values(&[v]);
    }
    token.flags.done_cc_access = true;
    token.flags.mem_outstanding = false;
    trace!(core = core.id, addr, stall_cycles = token.mem_stall_cycles, "access done {token}");
    publish_results(core, id, ctx.cycle)?;

    let t = &mut core.threads[thread];
    if t.load_pending == Some(number) {
        t.load_pending = None;
        t.switched_out = false;
    }
    Ok(StallReason::NoStall)
}

fn load(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get(id)?;
    let (thread, number, addr) = (token.thread, token.number, token.addr);
    if core.threads[thread].load_pending.is_some_and(|n| n != number) {
        return Ok(StepResult::Stalled(StallCause::LoadPending));
    }
    ctx.stats.inc(Stat::MemReads);
    ctx.stats.inc_mem_histogram(addr, ctx.config.memory.line_bytes);

    let stall = poll_access(core, ctx, id)?;
    core.arena.get_mut(id)?.flags.done_mem_access = true;
    if stall.is_stall() {
        core.threads[thread].load_pending = Some(number);
        let switch = ctx.config.pipeline.thread_switch == ThreadSwitchPolicy::SwitchOnMiss;
        if switch && core.threads.len() > 1 {
            core.switch_out(ctx, thread)?;
        }
    }
    Ok(StepResult::Completed(id))
}

fn store_or_global(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get(id)?;
    let (op, class, thread, addr) = (token.op(), token.class(), token.thread, token.addr);
    match class {
        OpClass::Store => ctx.stats.inc(Stat::MemWrites),
        _ => ctx.stats.inc(Stat::MemGlobal),
    }
    ctx.stats.inc_mem_histogram(addr, ctx.config.memory.line_bytes);

    if op == Opcode::Stc {
        let linked = ctx.reservations.get(&(core.id, thread)) == Some(&addr);
        let token = core.arena.get_mut(id)?;
        token.set_dst_values(&[u32::from(linked)]);
        if !linked {
            debug!(core = core.id, thread, addr, "store-conditional failed");
            token.flags.done_mem_access = true;
            token.flags.done_cc_access = true;
            publish_results(core, id, ctx.cycle)?;
            return Ok(StepResult::Completed(id));
        }
        let _ = ctx.reservations.remove(&(core.id, thread));
    }

    let _ = poll_access(core, ctx, id)?;
    core.arena.get_mut(id)?.flags.done_mem_access = true;
    Ok(StepResult::Completed(id))
}

fn line_op(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get(id)?;
    let op = token.op();
    let req = request(core, ctx, id, token.addr)?;
    let stall = match op {
        Opcode::Pldw => ctx.cache.prefetch_line(&req),
        Opcode::LineInv => ctx.cache.invalidate_line(&req),
        Opcode::LineWb => ctx.cache.writeback_line(&req),
        _ => ctx.cache.memory_barrier(core.id, ctx.cycle),
    };
    let token = core.arena.get_mut(id)?;
    if stall.is_stall() {
        token.mem_stall_cycles += 1;
        ctx.stats.inc_mem_stall(stall);
        return Ok(StepResult::Stalled(StallCause::Memory(stall)));
    }
    token.flags.done_mem_access = true;
    token.flags.done_cc_access = true;
    Ok(StepResult::Completed(id))
}

fn vector_access(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get(id)?;
    let (op, base, start) = (token.op(), token.addr, usize::from(token.vec_lanes_done));
    for lane in start..VECTOR_LANES {
        let addr = Lsu::lane_address(base, lane);
        let req = request(core, ctx, id, addr)?;
        let outcome = if op == Opcode::Vldw {
            ctx.cache.read_access(&req)
        } else {
            let data = core.arena.get(id)?.src(1 + lane);
            ctx.cache.write_access(&req, data)
        };
        let token = core.arena.get_mut(id)?;
        if outcome.stall.is_stall() {
            token.mem_stall_cycles += 1;
            ctx.stats.inc_mem_stall(outcome.stall);
            return Ok(StepResult::Stalled(StallCause::Memory(outcome.stall)));
        }
        count_hits(ctx, outcome.hits);
        ctx.stats.inc_mem_histogram(addr, ctx.config.memory.line_bytes);
        if op == Opcode::Vldw {
            ctx.stats.inc(Stat::MemReads);
            if let Some(dst) = token.dsts.get_mut(lane).and_then(Option::as_mut) {
                dst.value = outcome.value;
            }
        } else {
            ctx.stats.inc(Stat::MemWrites);
            clear_reservations(ctx, addr);
        }
        token.vec_lanes_done += 1;
    }
    let token = core.arena.get_mut(id)?;
    token.flags.done_mem_access = true;
    token.flags.done_cc_access = true;
    publish_results(core, id, ctx.cycle)?;
    Ok(StepResult::Completed(id))
}

fn task_queue(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get(id)?;
    let (op, thread) = (token.op(), token.thread);
    let (a, b, c, d) = (token.src(0), token.src(1), token.src(2), token.src(3));

    let (ret, values, requested) = match op {
        Opcode::TqEnq => (ctx.tq.enqueue(core.id, TaskDescriptor::new(a, b, c, d)), None, 1),
        Opcode::TqLoop => {
            let template = TaskDescriptor::new(a, b, 0, 0);
            let tasks = c.div_ceil(d.max(1)) as usize;
            (ctx.tq.enqueue_loop(core.id, template, c, d), None, tasks)
        }
        Opcode::TqDeq => match ctx.tq.dequeue(core.id) {
            (TqRetType::Success, Some(task)) => (TqRetType::Success, Some([task.ip, task.data, task.begin, task.end]), 0),
            (ret @ (TqRetType::Sync | TqRetType::End), _) => (ret, Some([0; 4]), 0),
            (ret, _) => (ret, None, 0),
        },
        _ => (ctx.tq.end(core.id), None, 0),
    };

    match ret {
        TqRetType::Overflow => {
            return Err(SimError::TaskQueueOverflow {
                core: core.id,
                requested,
                free: ctx.tq.free_slots(),
            });
        }
        TqRetType::Retry | TqRetType::Block => {
            core.threads[thread].waiting_on_tq = true;
            return Ok(StepResult::Stalled(StallCause::TaskQueue));
        }
        TqRetType::Success | TqRetType::Sync | TqRetType::End => {}
    }

    core.threads[thread].waiting_on_tq = false;
    let token = core.arena.get_mut(id)?;
    token.tq_status = Some(ret);
    token.flags.done_mem_access = true;
    token.flags.done_cc_access = true;
    if op == Opcode::TqDeq {
        if let Some(v) = values {
            token.set_dst_values(&v);
        }
        publish_results(core, id, ctx.cycle)?;
    }
    debug!(core = core.id, thread, ?op, ?ret, "task queue request complete");
    Ok(StepResult::Completed(id))
}

fn syscall(core: &mut Core, ctx: &mut SimContext, id: InstrId) -> Result<StepResult, SimError> {
    let token = core.arena.get_mut(id)?;
    if token.syscall_wait > 0 {
        token.syscall_wait -= 1;
        return Ok(StepResult::Stalled(StallCause::Syscall));
    }
    let mut req = SyscallRequest {
        core: core.id,
        thread: token.thread,
        number: token.src(0),
        args: [token.src(1), token.src(2), token.src(3)],
        cycle: ctx.cycle,
        ..SyscallRequest::default()
    };
    ctx.syscalls.do_system_call(&mut req);
    token.set_dst_values(&[req.result]);
    token.exit_thread = req.exit_thread;
    token.flags.done_mem_access = true;
    token.flags.done_cc_access = true;
    publish_results(core, id, ctx.cycle)?;
    Ok(StepResult::Completed(id))
}
