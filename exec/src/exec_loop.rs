use sh4jit_backend::HostCodeGen;
use sh4jit_core::tb::{EXIT_CLASS_MASK, EXIT_EXCEPTION, EXIT_SLEEP};
use sh4jit_core::TbExit;
use tracing::trace;

use crate::{ExecEnv, ExecError, GuestCpu};

/// Reason the execution loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A block left with an `exit_tb` code the loop does not interpret.
    Exit(u32),
    /// The guest took an exception; the CPU is already at its vector.
    Exception(u32),
    /// The guest executed SLEEP; the PC points after it.
    Sleep,
    /// The block budget given to [`cpu_exec_bounded`] ran out.
    BudgetExhausted,
}

fn classify(code: u32) -> ExitReason {
    match code & EXIT_CLASS_MASK {
        EXIT_SLEEP => ExitReason::Sleep,
        EXIT_EXCEPTION => ExitReason::Exception(code & !EXIT_CLASS_MASK),
        _ => ExitReason::Exit(code),
    }
}

/// Main CPU execution loop.
///
/// Repeatedly looks up or translates blocks and executes them until a
/// block exits with a code.
pub fn cpu_exec_loop<B, C>(env: &mut ExecEnv<B>, cpu: &mut C) -> Result<ExitReason, ExecError>
where
    B: HostCodeGen,
    C: GuestCpu,
{
    cpu_exec_bounded(env, cpu, u64::MAX)
}

/// Like [`cpu_exec_loop`] but stops after `max_tbs` blocks.
pub fn cpu_exec_bounded<B, C>(env: &mut ExecEnv<B>, cpu: &mut C, max_tbs: u64) -> Result<ExitReason, ExecError>
where
    B: HostCodeGen,
    C: GuestCpu,
{
    let mut next_tb_hint: Option<usize> = None;

    for _ in 0..max_tbs {
        let tb_idx = match next_tb_hint.take() {
            Some(idx) => idx,
            None => {
                let (pc, flags) = (cpu.pc(), cpu.flags());
                env.lookup_or_compile(cpu, pc, flags)?.tb
            }
        };

        let (host_offset, src_seq) = {
            let tb = env.tb_store.get(tb_idx);
            (tb.host_offset, tb.seq)
        };
        let exit = env.backend.execute(&env.code_buf, host_offset, cpu)?;
        env.stats.blocks_executed += 1;

        // The block may have written to its own code or poked CCR.
        let pending = cpu.take_invalidations();
        let invalidated = !pending.is_empty();
        for inv in pending {
            env.apply(inv);
        }

        match exit {
            TbExit::Exit(code) => return Ok(classify(code)),
            _ if invalidated || !env.config.chain_blocks => {}
            TbExit::Chain(slot) => {
                let (pc, flags) = (cpu.pc(), cpu.flags());
                if let Some(dst) = env.tb_store.get(tb_idx).jmp_dest[slot] {
                    if env.tb_store.is_valid_target(dst, pc, flags) {
                        env.stats.chained += 1;
                        next_tb_hint = Some(dst);
                        continue;
                    }
                }
                let dst = env.lookup_or_compile(cpu, pc, flags)?.tb;
                // A flush during the lookup may have recycled tb_idx.
                if src_is_live(env, tb_idx, src_seq) {
                    trace!(src = tb_idx, slot, dst, "chain");
                    env.tb_store.add_jump(tb_idx, slot, dst);
                }
                next_tb_hint = Some(dst);
            }
            TbExit::Lookup => {
                // Single-entry cache of the last dynamic successor.
                let (pc, flags) = (cpu.pc(), cpu.flags());
                if let Some(dst) = env.tb_store.get(tb_idx).exit_target {
                    if env.tb_store.is_valid_target(dst, pc, flags) {
                        next_tb_hint = Some(dst);
                        continue;
                    }
                }
                let dst = env.lookup_or_compile(cpu, pc, flags)?.tb;
                if src_is_live(env, tb_idx, src_seq) {
                    env.tb_store.get_mut(tb_idx).exit_target = Some(dst);
                }
                next_tb_hint = Some(dst);
            }
        }
    }

    Ok(ExitReason::BudgetExhausted)
}

fn src_is_live<B: HostCodeGen>(env: &ExecEnv<B>, idx: usize, seq: u64) -> bool {
    idx < env.tb_store.len() && {
        let tb = env.tb_store.get(idx);
        tb.seq == seq && tb.is_resident()
    }
}
