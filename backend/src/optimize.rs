// IR optimizer: single forward pass of constant folding, alias
// propagation and algebraic simplification, then a backward dead-code
// sweep. Runs before liveness analysis.
//
// The IR is SSA, so a folded or simplified op is turned into a nop and
// every later use of its result is rewritten to the replacement value.

use sh4jit_core::op::OpIdx;
use sh4jit_core::{Cond, Context, Opcode, Value};

use crate::host::emitter::{AluOp, UnaryOp};

/// Per-block optimizer state.
struct Optimizer {
    /// Replacement for a value whose defining op was removed.
    alias: Vec<Option<Value>>,
}

impl Optimizer {
    fn resolve(&self, v: Value) -> Value {
        let mut cur = v;
        while let Some(Some(next)) = self.alias.get(cur.index()) {
            cur = *next;
        }
        cur
    }

    fn set_alias(&mut self, dst: Value, src: Value) {
        let i = dst.index();
        if i >= self.alias.len() {
            self.alias.resize(i + 1, None);
        }
        self.alias[i] = Some(src);
    }
}

pub(crate) fn alu_op(opc: Opcode) -> Option<AluOp> {
    Some(match opc {
        Opcode::Add => AluOp::Add,
        Opcode::Sub => AluOp::Sub,
        Opcode::Mul => AluOp::Mul,
        Opcode::MulSH => AluOp::MulSH,
        Opcode::MulUH => AluOp::MulUH,
        Opcode::And => AluOp::And,
        Opcode::Or => AluOp::Or,
        Opcode::Xor => AluOp::Xor,
        Opcode::Shl => AluOp::Shl,
        Opcode::Shr => AluOp::Shr,
        Opcode::Sar => AluOp::Sar,
        Opcode::RotL => AluOp::RotL,
        Opcode::RotR => AluOp::RotR,
        _ => return None,
    })
}

pub(crate) fn unary_op(opc: Opcode) -> Option<UnaryOp> {
    Some(match opc {
        Opcode::Neg => UnaryOp::Neg,
        Opcode::Not => UnaryOp::Not,
        Opcode::ExtS8 => UnaryOp::ExtS8,
        Opcode::ExtS16 => UnaryOp::ExtS16,
        Opcode::ExtU8 => UnaryOp::ExtU8,
        Opcode::ExtU16 => UnaryOp::ExtU16,
        Opcode::Bswap16 => UnaryOp::Bswap16,
        _ => return None,
    })
}

/// Decode a carg-encoded Cond value.
fn cond_from_carg(v: Value) -> Cond {
    Cond::from_u32(v.0).unwrap_or(Cond::Never)
}

/// Main optimizer entry point.
pub fn optimize(ctx: &mut Context) {
    let mut opt = Optimizer {
        alias: vec![None; ctx.nb_values() as usize],
    };

    for oi in 0..ctx.num_ops() {
        let op_idx = OpIdx(oi as u32);
        let opc = ctx.op(op_idx).opc;
        if matches!(opc, Opcode::Nop | Opcode::InsnStart) {
            continue;
        }

        // Rewrite inputs through the alias map.
        for a in ctx.op_mut(op_idx).iargs_mut() {
            *a = opt.resolve(*a);
        }
        let args = ctx.op(op_idx).args;

        match opc {
            _ if alu_op(opc).is_some() => fold_binary(ctx, &mut opt, op_idx, opc, args),
            _ if unary_op(opc).is_some() => fold_unary(ctx, &mut opt, op_idx, opc, args),
            Opcode::SetCond => fold_setcond(ctx, &mut opt, op_idx, args),
            Opcode::MovCond => fold_movcond(ctx, &mut opt, op_idx, args),
            Opcode::BrCond => fold_brcond(ctx, op_idx, args),
            _ => {}
        }
    }

    eliminate_dead_code(ctx);
}

/// Replace the op defining `dst` with the constant `val`.
fn replace_with_const(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, dst: Value, val: u32) {
    let c = ctx.new_const(val);
    opt.set_alias(dst, c);
    ctx.op_mut(op_idx).make_nop();
}

/// Replace the op defining `dst` with an existing value.
fn replace_with_value(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, dst: Value, src: Value) {
    opt.set_alias(dst, src);
    ctx.op_mut(op_idx).make_nop();
}

fn fold_unary(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, opc: Opcode, args: [Value; 6]) {
    let (Some(uop), Some(a)) = (unary_op(opc), ctx.const_val(args[1])) else {
        return;
    };
    replace_with_const(ctx, opt, op_idx, args[0], uop.eval(a));
}

fn fold_binary(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, opc: Opcode, args: [Value; 6]) {
    let Some(aop) = alu_op(opc) else {
        return;
    };
    let (dst, a, b) = (args[0], args[1], args[2]);
    let ca = ctx.const_val(a);
    let cb = ctx.const_val(b);

    // Both constant → fold.
    if let (Some(x), Some(y)) = (ca, cb) {
        replace_with_const(ctx, opt, op_idx, dst, aop.eval(x, y));
        return;
    }

    // b is constant
    if let Some(y) = cb {
        match aop {
            // x + 0, x - 0, x | 0, x ^ 0, shifts by 0 → x
            AluOp::Add
            | AluOp::Sub
            | AluOp::Or
            | AluOp::Xor
            | AluOp::Shl
            | AluOp::Shr
            | AluOp::Sar
            | AluOp::RotL
            | AluOp::RotR
                if y == 0 =>
            {
                return replace_with_value(ctx, opt, op_idx, dst, a);
            }
            AluOp::Mul | AluOp::And if y == 0 => {
                return replace_with_const(ctx, opt, op_idx, dst, 0);
            }
            AluOp::Mul if y == 1 => return replace_with_value(ctx, opt, op_idx, dst, a),
            AluOp::And if y == u32::MAX => return replace_with_value(ctx, opt, op_idx, dst, a),
            AluOp::Or if y == u32::MAX => {
                return replace_with_const(ctx, opt, op_idx, dst, u32::MAX);
            }
            _ => {}
        }
    }

    // a is constant
    if let Some(x) = ca {
        match aop {
            AluOp::Add | AluOp::Or | AluOp::Xor if x == 0 => {
                return replace_with_value(ctx, opt, op_idx, dst, b);
            }
            AluOp::Mul | AluOp::And if x == 0 => {
                return replace_with_const(ctx, opt, op_idx, dst, 0);
            }
            _ => {}
        }
    }

    // Same-operand identities.
    if a == b {
        match aop {
            AluOp::And | AluOp::Or => replace_with_value(ctx, opt, op_idx, dst, a),
            AluOp::Xor | AluOp::Sub => replace_with_const(ctx, opt, op_idx, dst, 0),
            _ => {}
        }
    }
}

fn fold_setcond(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, args: [Value; 6]) {
    let cond = cond_from_carg(args[3]);
    if let (Some(a), Some(b)) = (ctx.const_val(args[1]), ctx.const_val(args[2])) {
        replace_with_const(ctx, opt, op_idx, args[0], cond.eval(a, b) as u32);
    }
}

fn fold_movcond(ctx: &mut Context, opt: &mut Optimizer, op_idx: OpIdx, args: [Value; 6]) {
    let cond = cond_from_carg(args[5]);
    if args[3] == args[4] {
        return replace_with_value(ctx, opt, op_idx, args[0], args[3]);
    }
    if let (Some(a), Some(b)) = (ctx.const_val(args[1]), ctx.const_val(args[2])) {
        let pick = if cond.eval(a, b) { args[3] } else { args[4] };
        replace_with_value(ctx, opt, op_idx, args[0], pick);
    }
}

/// Fold BrCond when both inputs are constant.
fn fold_brcond(ctx: &mut Context, op_idx: OpIdx, args: [Value; 6]) {
    let (Some(a), Some(b)) = (ctx.const_val(args[0]), ctx.const_val(args[1])) else {
        return;
    };
    let cond = cond_from_carg(args[2]);
    let label = args[3];
    let op = ctx.op_mut(op_idx);
    if cond.eval(a, b) {
        // Always taken → unconditional branch.
        op.opc = Opcode::Br;
        op.args[0] = label;
        op.nargs = 1;
    } else {
        op.make_nop();
    }
}

/// Remove pure ops whose result is never used.
fn eliminate_dead_code(ctx: &mut Context) {
    let mut used = vec![false; ctx.nb_values() as usize];
    for oi in (0..ctx.num_ops()).rev() {
        let op = &mut ctx.ops_mut()[oi];
        if op.opc.is_pure() && !used[op.args[0].index()] {
            op.make_nop();
            continue;
        }
        for a in op.iargs() {
            used[a.index()] = true;
        }
    }
}
