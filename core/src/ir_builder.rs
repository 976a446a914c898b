use crate::context::Context;
use crate::op::Op;
use crate::opcode::Opcode;
use crate::types::{Cond, MemOp};
use crate::value::Value;

// Constant args are encoded as Value(raw_value).
fn carg(val: u32) -> Value {
    Value(val)
}

/// Maximum number of arguments a runtime helper receives.
pub const MAX_CALL_ARGS: usize = 3;

/// Call flag: the helper touches no guest register, so the builder keeps
/// its register cache across the call.
pub const CALL_NO_REG_ACCESS: u32 = 1 << 0;

impl Context {
    // -- Internal helpers --

    fn emit_binary(&mut self, opc: Opcode, a: Value, b: Value) -> Value {
        let dst = self.new_value();
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, opc, &[dst, a, b]));
        dst
    }

    fn emit_unary(&mut self, opc: Opcode, src: Value) -> Value {
        let dst = self.new_value();
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, opc, &[dst, src]));
        dst
    }

    // -- Constants --

    pub fn gen_movi(&mut self, val: u32) -> Value {
        self.new_const(val)
    }

    // -- Guest registers --

    /// Read a guest register.
    ///
    /// Returns the cached value when the register was read or written
    /// earlier in the block and nothing has invalidated the cache since.
    pub fn read_reg(&mut self, reg: u32) -> Value {
        if let Some(v) = self.reg_cache[reg as usize] {
            return v;
        }
        let dst = self.new_value();
        self.value_mut(dst).reg_hint = Some(reg);
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::ReadReg, &[dst, carg(reg)]));
        self.reg_cache[reg as usize] = Some(dst);
        dst
    }

    /// Write a guest register. Later reads in the block see `val`.
    pub fn write_reg(&mut self, reg: u32, val: Value) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::WriteReg, &[val, carg(reg)]));
        self.reg_cache[reg as usize] = Some(val);
    }

    /// Drop every cached register value, e.g. after a write that changes
    /// which physical registers the guest names refer to.
    pub fn forget_guest_regs(&mut self) {
        self.reg_cache.iter_mut().for_each(|r| *r = None);
    }

    pub fn forget_guest_reg(&mut self, reg: u32) {
        self.reg_cache[reg as usize] = None;
    }

    // -- Binary ALU (1 oarg, 2 iargs) --

    pub fn gen_add(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Add, a, b)
    }

    pub fn gen_addi(&mut self, a: Value, imm: u32) -> Value {
        if imm == 0 {
            return a;
        }
        let b = self.new_const(imm);
        self.emit_binary(Opcode::Add, a, b)
    }

    pub fn gen_sub(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Sub, a, b)
    }

    pub fn gen_mul(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Mul, a, b)
    }

    pub fn gen_mulsh(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::MulSH, a, b)
    }

    pub fn gen_muluh(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::MulUH, a, b)
    }

    pub fn gen_and(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::And, a, b)
    }

    pub fn gen_andi(&mut self, a: Value, imm: u32) -> Value {
        let b = self.new_const(imm);
        self.emit_binary(Opcode::And, a, b)
    }

    pub fn gen_or(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Or, a, b)
    }

    pub fn gen_ori(&mut self, a: Value, imm: u32) -> Value {
        let b = self.new_const(imm);
        self.emit_binary(Opcode::Or, a, b)
    }

    pub fn gen_xor(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Xor, a, b)
    }

    pub fn gen_xori(&mut self, a: Value, imm: u32) -> Value {
        let b = self.new_const(imm);
        self.emit_binary(Opcode::Xor, a, b)
    }

    pub fn gen_shl(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Shl, a, b)
    }

    pub fn gen_shli(&mut self, a: Value, n: u32) -> Value {
        let b = self.new_const(n);
        self.emit_binary(Opcode::Shl, a, b)
    }

    pub fn gen_shr(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Shr, a, b)
    }

    pub fn gen_shri(&mut self, a: Value, n: u32) -> Value {
        let b = self.new_const(n);
        self.emit_binary(Opcode::Shr, a, b)
    }

    pub fn gen_sar(&mut self, a: Value, b: Value) -> Value {
        self.emit_binary(Opcode::Sar, a, b)
    }

    pub fn gen_sari(&mut self, a: Value, n: u32) -> Value {
        let b = self.new_const(n);
        self.emit_binary(Opcode::Sar, a, b)
    }

    pub fn gen_rotli(&mut self, a: Value, n: u32) -> Value {
        let b = self.new_const(n);
        self.emit_binary(Opcode::RotL, a, b)
    }

    pub fn gen_rotri(&mut self, a: Value, n: u32) -> Value {
        let b = self.new_const(n);
        self.emit_binary(Opcode::RotR, a, b)
    }

    // -- Unary --

    pub fn gen_neg(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::Neg, s)
    }

    pub fn gen_not(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::Not, s)
    }

    pub fn gen_ext8s(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::ExtS8, s)
    }

    pub fn gen_ext16s(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::ExtS16, s)
    }

    pub fn gen_ext8u(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::ExtU8, s)
    }

    pub fn gen_ext16u(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::ExtU16, s)
    }

    pub fn gen_bswap16(&mut self, s: Value) -> Value {
        self.emit_unary(Opcode::Bswap16, s)
    }

    // -- Compare --

    /// SetCond: d = (a cond b) ? 1 : 0
    pub fn gen_setcond(&mut self, cond: Cond, a: Value, b: Value) -> Value {
        let dst = self.new_value();
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::SetCond,
            &[dst, a, b, carg(cond as u32)],
        ));
        dst
    }

    pub fn gen_setcondi(&mut self, cond: Cond, a: Value, imm: u32) -> Value {
        let b = self.new_const(imm);
        self.gen_setcond(cond, a, b)
    }

    /// MovCond: d = (c1 cond c2) ? v1 : v2
    pub fn gen_movcond(
        &mut self,
        cond: Cond,
        c1: Value,
        c2: Value,
        v1: Value,
        v2: Value,
    ) -> Value {
        let dst = self.new_value();
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::MovCond,
            &[dst, c1, c2, v1, v2, carg(cond as u32)],
        ));
        dst
    }

    // -- Guest memory access --

    pub fn gen_load(&mut self, memop: MemOp, addr: Value) -> Value {
        let dst = self.new_value();
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::Load,
            &[dst, addr, carg(memop.bits() as u32)],
        ));
        dst
    }

    pub fn gen_store(&mut self, memop: MemOp, addr: Value, val: Value) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::Store,
            &[addr, val, carg(memop.bits() as u32)],
        ));
    }

    // -- Calls --

    /// Call helper: dst = helper(args[0..3])
    /// Call: 1 oarg, 3 iargs, 2 cargs (helper id, call flags)
    ///
    /// Unless `CALL_NO_REG_ACCESS` is given the register cache is dropped,
    /// since the helper may have changed any guest register.
    pub fn gen_call(&mut self, helper: u32, args: &[Value], flags: u32) -> Value {
        assert!(args.len() <= MAX_CALL_ARGS, "too many helper args");
        let zero = self.new_const(0);
        let dst = self.new_value();
        let mut full = [zero; 1 + MAX_CALL_ARGS + 2];
        full[0] = dst;
        full[1..1 + args.len()].copy_from_slice(args);
        full[1 + MAX_CALL_ARGS] = carg(helper);
        full[2 + MAX_CALL_ARGS] = carg(flags);
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::Call, &full));
        if flags & CALL_NO_REG_ACCESS == 0 {
            self.forget_guest_regs();
        }
        dst
    }

    // -- Block-internal control flow --

    /// Unconditional branch to label.
    /// Br: 0 oargs, 0 iargs, 1 carg (label_id)
    pub fn gen_br(&mut self, label_id: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::Br, &[carg(label_id)]));
    }

    /// Conditional branch.
    /// BrCond: 0 oargs, 2 iargs, 2 cargs (cond, label_id)
    pub fn gen_brcond(&mut self, cond: Cond, a: Value, b: Value, label_id: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::BrCond,
            &[a, b, carg(cond as u32), carg(label_id)],
        ));
    }

    /// Define label position. Paths merge here, so cached register values
    /// from either path are no longer trusted.
    /// SetLabel: 0 oargs, 0 iargs, 1 carg (label_id)
    pub fn gen_set_label(&mut self, label_id: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::SetLabel, &[carg(label_id)]));
        self.label_mut(label_id).present = true;
        self.forget_guest_regs();
    }

    // -- Block exit --

    /// Static successor.
    /// GotoTb: 0 oargs, 0 iargs, 1 carg (target pc)
    pub fn gen_goto_tb(&mut self, target: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::GotoTb, &[carg(target)]));
    }

    /// Conditional pair of static successors.
    /// BrCondTb: 0 oargs, 2 iargs, 3 cargs (cond, taken pc, fallthrough pc)
    pub fn gen_brcond_tb(
        &mut self,
        cond: Cond,
        a: Value,
        b: Value,
        taken: u32,
        not_taken: u32,
    ) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(
            idx,
            Opcode::BrCondTb,
            &[a, b, carg(cond as u32), carg(taken), carg(not_taken)],
        ));
    }

    /// Successor known only at runtime; resolved by a block-cache lookup.
    pub fn gen_goto_ptr(&mut self, target: Value) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::GotoPtr, &[target]));
    }

    /// ExitTb: 0 oargs, 0 iargs, 1 carg (exit code)
    pub fn gen_exit_tb(&mut self, code: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::ExitTb, &[carg(code)]));
    }

    // -- Boundary --

    /// InsnStart: 0 oargs, 0 iargs, 1 carg (guest pc)
    pub fn gen_insn_start(&mut self, pc: u32) {
        let idx = self.next_op_idx();
        self.emit_op(Op::with_args(idx, Opcode::InsnStart, &[carg(pc)]));
    }
}
