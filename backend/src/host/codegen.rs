use sh4jit_core::{Cond, Context, GuestEnv, Op, Opcode, TbExit};
use tracing::trace;

use super::emitter::Emitter;
use super::exec::run_block;
use crate::code_buffer::CodeBuffer;
use crate::error::BackendError;
use crate::optimize::{alu_op, unary_op};
use crate::regalloc::FrameLayout;
use crate::HostCodeGen;

/// Backend for the portable host target.
///
/// Lowers optimized IR into the byte stream described in
/// [`emitter`](super::emitter) and runs it with the interpreter in
/// [`exec`](super::exec).
#[derive(Debug, Default)]
pub struct PortableCodeGen {
    /// Blocks lowered since creation.
    pub blocks_lowered: u64,
}

impl PortableCodeGen {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cond_of(v: sh4jit_core::Value) -> Cond {
    Cond::from_u32(v.0).unwrap_or(Cond::Never)
}

fn lower_op(e: &mut Emitter, frame: &FrameLayout, op: &Op) {
    let s = |i: usize| frame.slot(op.args[i]);
    let carg = |i: usize| op.args[i].0;

    if let Some(aop) = alu_op(op.opc) {
        e.alu(aop, s(0), s(1), s(2));
        return;
    }
    if let Some(uop) = unary_op(op.opc) {
        e.unary(uop, s(0), s(1));
        return;
    }

    match op.opc {
        Opcode::ReadReg => e.rdreg(s(0), carg(1) as u16),
        Opcode::WriteReg => e.wrreg(carg(1) as u16, s(0)),
        Opcode::SetCond => e.setc(cond_of(op.args[3]), s(0), s(1), s(2)),
        Opcode::MovCond => e.movc(cond_of(op.args[5]), s(0), [s(1), s(2)], [s(3), s(4)]),
        Opcode::Load => e.ld(carg(2) as u8, s(0), s(1)),
        Opcode::Store => e.st(carg(2) as u8, s(0), s(1)),
        Opcode::Call => e.call(carg(4), s(0), [s(1), s(2), s(3)]),
        Opcode::Br => e.jmp(carg(0), false),
        Opcode::BrCond => e.jcc(cond_of(op.args[2]), s(0), s(1), carg(3), false),
        Opcode::SetLabel => e.bind(carg(0)),
        Opcode::GotoTb => e.goto_tb(0, carg(0)),
        Opcode::BrCondTb => {
            // jcc taken; goto_tb 1 fallthrough; taken: goto_tb 0 target
            let taken = e.new_label();
            e.jcc(cond_of(op.args[2]), s(0), s(1), taken, true);
            e.goto_tb(1, carg(4));
            e.bind(taken);
            e.goto_tb(0, carg(3));
        }
        Opcode::GotoPtr => e.goto_ptr(s(0)),
        Opcode::ExitTb => e.exit(carg(0)),
        _ => {}
    }
}

impl HostCodeGen for PortableCodeGen {
    fn lower(&mut self, ctx: &Context, frame: &FrameLayout) -> Result<Vec<u8>, BackendError> {
        let mut e = Emitter::new();
        // IR label ids map one-to-one onto the first emitter labels.
        for _ in ctx.labels() {
            e.new_label();
        }

        let nslots = u16::try_from(frame.nslots).map_err(|_| BackendError::FrameOverflow(frame.nslots))?;
        e.enter(nslots);
        for &(slot, val) in &frame.consts {
            e.movi(slot, val);
        }
        for op in ctx.ops() {
            lower_op(&mut e, frame, op);
        }

        let code = e.finish()?;
        self.blocks_lowered += 1;
        trace!(pc = format_args!("{:#010x}", ctx.pc_first), bytes = code.len(), slots = nslots, "lowered");
        Ok(code)
    }

    fn execute(&self, buf: &CodeBuffer, entry: usize, env: &mut dyn GuestEnv) -> Result<TbExit, BackendError> {
        run_block(buf.as_slice(), entry, env)
    }
}
