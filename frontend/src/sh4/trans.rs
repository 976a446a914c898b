//! SH4 instruction translation: IR generation.
//!
//! One routine per opcode class, collected in [`SH4_TRANSLATORS`]. Common
//! shapes are factored into `gen_*` helpers parameterised by a `BinOp`
//! function pointer.

use super::cpu::*;
use super::decode::{Sh4Flags, Sh4Instr, Sh4Op, NUM_SH4_OPS};
use super::helper::Sh4Helper;
use super::Sh4DisasContext;
use crate::DisasJumpType;
use sh4jit_core::tb::EXIT_EXCEPTION;
use sh4jit_core::tb::EXIT_SLEEP;
use sh4jit_core::{Context, Cond, MemOp, Value, CALL_NO_REG_ACCESS};

/// A translation routine: `(ctx, ir, guest addr, instruction, in delay slot)`.
pub type TranslateFn = fn(&mut Sh4DisasContext<'_>, &mut Context, u32, Sh4Instr, bool);

/// Binary IR operation: `fn(ir, lhs, rhs) -> result`.
type BinOp = fn(&mut Context, Value, Value) -> Value;

/// Unary IR operation.
type UnOp = fn(&mut Context, Value) -> Value;

// ── Helpers ────────────────────────────────────────────────────

fn reg(ir: &mut Context, n: u8) -> Value {
    ir.read_reg(n as u32)
}

fn set_reg(ir: &mut Context, n: u8, v: Value) {
    ir.write_reg(n as u32, v)
}

/// Write T. SR reads merge T in, so a cached SR is stale afterwards.
fn set_t(ir: &mut Context, v: Value) {
    ir.write_reg(REG_T, v);
    ir.forget_guest_reg(REG_SR);
}

/// Write SR with bits that keep the register bank and privilege level.
fn gen_write_sr_flags(ir: &mut Context, sr: Value) {
    ir.write_reg(REG_SR, sr);
    ir.forget_guest_reg(REG_T);
}

/// Write SR with an arbitrary value: the bank may switch, so nothing
/// cached about the register file survives.
fn gen_write_sr(ir: &mut Context, sr: Value) {
    ir.write_reg(REG_SR, sr);
    ir.forget_guest_regs();
}

/// `Rn = op(Rn, Rm)`.
fn gen_rr(ir: &mut Context, i: Sh4Instr, op: BinOp) {
    let a = reg(ir, i.n);
    let b = reg(ir, i.m);
    let d = op(ir, a, b);
    set_reg(ir, i.n, d);
}

/// `Rn = op(Rm)`.
fn gen_unary(ir: &mut Context, i: Sh4Instr, op: UnOp) {
    let a = reg(ir, i.m);
    let d = op(ir, a);
    set_reg(ir, i.n, d);
}

/// `R0 = op(R0, imm)`.
fn gen_r0_imm(ir: &mut Context, imm: u32, op: BinOp) {
    let a = reg(ir, 0);
    let b = ir.new_const(imm);
    let d = op(ir, a, b);
    set_reg(ir, 0, d);
}

/// `T = Rn cond Rm`.
fn gen_cmp(ir: &mut Context, i: Sh4Instr, cond: Cond) {
    let a = reg(ir, i.n);
    let b = reg(ir, i.m);
    let t = ir.gen_setcond(cond, a, b);
    set_t(ir, t);
}

/// `T = bit shifted out; Rn = Rn shifted by one`.
fn gen_shift1(ir: &mut Context, i: Sh4Instr, out_bit: u32, op: BinOp) {
    let a = reg(ir, i.n);
    let t = if out_bit == 0 {
        ir.gen_andi(a, 1)
    } else {
        ir.gen_shri(a, out_bit)
    };
    let one = ir.new_const(1);
    let d = op(ir, a, one);
    set_reg(ir, i.n, d);
    set_t(ir, t);
}

/// `Rn = op(Rn, amount)`.
fn gen_shift_imm(ir: &mut Context, i: Sh4Instr, amount: u32, op: BinOp) {
    let a = reg(ir, i.n);
    let sh = ir.new_const(amount);
    let d = op(ir, a, sh);
    set_reg(ir, i.n, d);
}

/// Store `val` to `base + disp`.
fn gen_store_at(ir: &mut Context, memop: MemOp, base: Value, disp: u32, val: Value) {
    let addr = ir.gen_addi(base, disp);
    ir.gen_store(memop, addr, val);
}

/// Load from `base + disp`.
fn gen_load_at(ir: &mut Context, memop: MemOp, base: Value, disp: u32) -> Value {
    let addr = ir.gen_addi(base, disp);
    ir.gen_load(memop, addr)
}

/// `@-Rn = val`.
fn gen_push(ir: &mut Context, n: u8, memop: MemOp, val: Value) {
    let rn = reg(ir, n);
    let addr = ir.gen_addi(rn, memop.size_bytes().wrapping_neg());
    ir.gen_store(memop, addr, val);
    set_reg(ir, n, addr);
}

/// Load `@Rn+`; Rn is incremented before the result is returned.
fn gen_pop(ir: &mut Context, n: u8, memop: MemOp) -> Value {
    let rn = reg(ir, n);
    let v = ir.gen_load(memop, rn);
    let next = ir.gen_addi(rn, memop.size_bytes());
    set_reg(ir, n, next);
    v
}

/// Read-modify-write of the byte at `@(R0, GBR)`.
fn gen_gbr_byte_rmw(ir: &mut Context, imm: u8, op: BinOp) {
    let r0 = reg(ir, 0);
    let gbr = ir.read_reg(REG_GBR);
    let addr = ir.gen_add(r0, gbr);
    let v = ir.gen_load(MemOp::ub(), addr);
    let k = ir.new_const(imm as u32);
    let d = op(ir, v, k);
    ir.gen_store(MemOp::ub(), addr, d);
}

/// Enter a guest exception and leave the block.
fn gen_exception(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, pc: u32, expevt: u32) {
    let ev = ir.new_const(expevt);
    let at = ir.new_const(pc);
    ir.gen_call(Sh4Helper::RaiseException as u32, &[ev, at], 0);
    ir.gen_exit_tb(EXIT_EXCEPTION | expevt);
    ctx.base.is_jmp = DisasJumpType::NoReturn;
    ctx.ends_in_branch = false;
}

/// Illegal instruction, or slot-illegal when it sits in a delay slot.
fn gen_illegal(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, delay_slot: bool) {
    if delay_slot {
        gen_exception(ctx, ir, addr.wrapping_sub(2), EXPEVT_SLOT_ILLEGAL);
    } else {
        gen_exception(ctx, ir, addr, EXPEVT_ILLEGAL);
    }
}

/// Mark the current instruction as the block's control transfer.
fn begin_branch(ctx: &mut Sh4DisasContext<'_>) {
    ctx.base.is_jmp = DisasJumpType::NoReturn;
    ctx.ends_in_branch = true;
}

/// Translate one instruction, applying the privilege and delay-slot
/// checks shared by every opcode class.
pub(super) fn dispatch(
    ctx: &mut Sh4DisasContext<'_>,
    ir: &mut Context,
    addr: u32,
    instr: Sh4Instr,
    delay_slot: bool,
) {
    let flags = instr.op.flags();
    if delay_slot && flags.contains(Sh4Flags::SLOT_ILLEGAL) {
        gen_illegal(ctx, ir, addr, true);
        return;
    }
    if flags.contains(Sh4Flags::PRIV) && !ctx.privileged() {
        gen_illegal(ctx, ir, addr, delay_slot);
        return;
    }
    SH4_TRANSLATORS[instr.op as usize](ctx, ir, addr, instr, delay_slot);
}

// ── Invalid ────────────────────────────────────────────────────

fn trans_invalid(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, _i: Sh4Instr, ds: bool) {
    gen_illegal(ctx, ir, addr, ds);
}

// ── Data transfer ──────────────────────────────────────────────

fn trans_mov_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let v = ir.new_const(i.simm8() as u32);
    set_reg(ir, i.n, v);
}

fn trans_movw_pcrel(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let at = ir.new_const(i.pcrel_word(addr));
    let v = ir.gen_load(MemOp::sw(), at);
    set_reg(ir, i.n, v);
}

fn trans_movl_pcrel(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let at = ir.new_const(i.pcrel_long(addr));
    let v = ir.gen_load(MemOp::ul(), at);
    set_reg(ir, i.n, v);
}

fn trans_mov(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let v = reg(ir, i.m);
    set_reg(ir, i.n, v);
}

fn gen_store_rn(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let addr = reg(ir, i.n);
    let v = reg(ir, i.m);
    ir.gen_store(memop, addr, v);
}

fn trans_movb_store(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_rn(ir, i, MemOp::ub());
}

fn trans_movw_store(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_rn(ir, i, MemOp::uw());
}

fn trans_movl_store(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_rn(ir, i, MemOp::ul());
}

fn gen_load_rm(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let addr = reg(ir, i.m);
    let v = ir.gen_load(memop, addr);
    set_reg(ir, i.n, v);
}

fn trans_movb_load(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_rm(ir, i, MemOp::sb());
}

fn trans_movw_load(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_rm(ir, i, MemOp::sw());
}

fn trans_movl_load(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_rm(ir, i, MemOp::ul());
}

fn gen_predec_store(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    // Rm is read before Rn is decremented, so Rm == Rn stores the old value.
    let v = reg(ir, i.m);
    gen_push(ir, i.n, memop, v);
}

fn trans_movb_predec(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_predec_store(ir, i, MemOp::ub());
}

fn trans_movw_predec(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_predec_store(ir, i, MemOp::uw());
}

fn trans_movl_predec(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_predec_store(ir, i, MemOp::ul());
}

fn gen_postinc_load(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let rm = reg(ir, i.m);
    let v = ir.gen_load(memop, rm);
    if i.n != i.m {
        let next = ir.gen_addi(rm, memop.size_bytes());
        set_reg(ir, i.m, next);
    }
    set_reg(ir, i.n, v);
}

fn trans_movb_postinc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_postinc_load(ir, i, MemOp::sb());
}

fn trans_movw_postinc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_postinc_load(ir, i, MemOp::sw());
}

fn trans_movl_postinc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_postinc_load(ir, i, MemOp::ul());
}

fn trans_movb_store_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.m);
    let v = reg(ir, 0);
    gen_store_at(ir, MemOp::ub(), base, i.disp4 as u32, v);
}

fn trans_movw_store_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.m);
    let v = reg(ir, 0);
    gen_store_at(ir, MemOp::uw(), base, i.disp4 as u32 * 2, v);
}

fn trans_movl_store_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.n);
    let v = reg(ir, i.m);
    gen_store_at(ir, MemOp::ul(), base, i.disp4 as u32 * 4, v);
}

fn trans_movb_load_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.m);
    let v = gen_load_at(ir, MemOp::sb(), base, i.disp4 as u32);
    set_reg(ir, 0, v);
}

fn trans_movw_load_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.m);
    let v = gen_load_at(ir, MemOp::sw(), base, i.disp4 as u32 * 2);
    set_reg(ir, 0, v);
}

fn trans_movl_load_disp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let base = reg(ir, i.m);
    let v = gen_load_at(ir, MemOp::ul(), base, i.disp4 as u32 * 4);
    set_reg(ir, i.n, v);
}

fn gen_store_idx(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let r0 = reg(ir, 0);
    let rn = reg(ir, i.n);
    let addr = ir.gen_add(r0, rn);
    let v = reg(ir, i.m);
    ir.gen_store(memop, addr, v);
}

fn trans_movb_store_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_idx(ir, i, MemOp::ub());
}

fn trans_movw_store_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_idx(ir, i, MemOp::uw());
}

fn trans_movl_store_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_idx(ir, i, MemOp::ul());
}

fn gen_load_idx(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let r0 = reg(ir, 0);
    let rm = reg(ir, i.m);
    let addr = ir.gen_add(r0, rm);
    let v = ir.gen_load(memop, addr);
    set_reg(ir, i.n, v);
}

fn trans_movb_load_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_idx(ir, i, MemOp::sb());
}

fn trans_movw_load_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_idx(ir, i, MemOp::sw());
}

fn trans_movl_load_idx(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_idx(ir, i, MemOp::ul());
}

fn gen_store_gbr(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let gbr = ir.read_reg(REG_GBR);
    let v = reg(ir, 0);
    gen_store_at(ir, memop, gbr, i.imm8 as u32 * memop.size_bytes(), v);
}

fn trans_movb_store_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_gbr(ir, i, MemOp::ub());
}

fn trans_movw_store_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_gbr(ir, i, MemOp::uw());
}

fn trans_movl_store_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_store_gbr(ir, i, MemOp::ul());
}

fn gen_load_gbr(ir: &mut Context, i: Sh4Instr, memop: MemOp) {
    let gbr = ir.read_reg(REG_GBR);
    let v = gen_load_at(ir, memop, gbr, i.imm8 as u32 * memop.size_bytes());
    set_reg(ir, 0, v);
}

fn trans_movb_load_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_gbr(ir, i, MemOp::sb());
}

fn trans_movw_load_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_gbr(ir, i, MemOp::sw());
}

fn trans_movl_load_gbr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_load_gbr(ir, i, MemOp::ul());
}

fn trans_mova(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let v = ir.new_const(i.pcrel_long(addr));
    set_reg(ir, 0, v);
}

fn trans_movt(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let t = ir.read_reg(REG_T);
    set_reg(ir, i.n, t);
}

fn trans_movca_l(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let addr = reg(ir, i.n);
    let v = reg(ir, 0);
    ir.gen_store(MemOp::ul(), addr, v);
}

fn trans_swap_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_bswap16);
}

fn trans_swap_w(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rm = reg(ir, i.m);
    let d = ir.gen_rotli(rm, 16);
    set_reg(ir, i.n, d);
}

fn trans_xtrct(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rm = reg(ir, i.m);
    let rn = reg(ir, i.n);
    let hi = ir.gen_shli(rm, 16);
    let lo = ir.gen_shri(rn, 16);
    let d = ir.gen_or(hi, lo);
    set_reg(ir, i.n, d);
}

// ── Arithmetic ─────────────────────────────────────────────────

fn trans_add(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_rr(ir, i, Context::gen_add);
}

fn trans_add_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let d = ir.gen_addi(rn, i.simm8() as u32);
    set_reg(ir, i.n, d);
}

fn trans_addc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let t = ir.read_reg(REG_T);
    let sum = ir.gen_add(rn, rm);
    let c1 = ir.gen_setcond(Cond::Ltu, sum, rn);
    let res = ir.gen_add(sum, t);
    let c2 = ir.gen_setcond(Cond::Ltu, res, sum);
    let carry = ir.gen_or(c1, c2);
    set_reg(ir, i.n, res);
    set_t(ir, carry);
}

fn trans_addv(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let res = ir.gen_add(rn, rm);
    // Overflow when both operands share a sign the result does not.
    let x1 = ir.gen_xor(rn, res);
    let x2 = ir.gen_xor(rm, res);
    let ov = ir.gen_and(x1, x2);
    let t = ir.gen_shri(ov, 31);
    set_reg(ir, i.n, res);
    set_t(ir, t);
}

fn trans_cmp_eq_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let r0 = reg(ir, 0);
    let t = ir.gen_setcondi(Cond::Eq, r0, i.simm8() as u32);
    set_t(ir, t);
}

fn trans_cmp_eq(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::Eq);
}

fn trans_cmp_hs(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::Geu);
}

fn trans_cmp_ge(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::Ge);
}

fn trans_cmp_hi(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::Gtu);
}

fn trans_cmp_gt(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::Gt);
}

fn trans_cmp_pz(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let t = ir.gen_setcondi(Cond::Ge, rn, 0);
    set_t(ir, t);
}

fn trans_cmp_pl(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let t = ir.gen_setcondi(Cond::Gt, rn, 0);
    set_t(ir, t);
}

fn trans_cmp_str(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let x = ir.gen_xor(rn, rm);
    let mut t = ir.gen_setcondi(Cond::TstEq, x, 0xff);
    for mask in [0xff00, 0x00ff_0000, 0xff00_0000] {
        let b = ir.gen_setcondi(Cond::TstEq, x, mask);
        t = ir.gen_or(t, b);
    }
    set_t(ir, t);
}

fn trans_div0s(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let q = ir.gen_shri(rn, 31);
    let m = ir.gen_shri(rm, 31);
    let t = ir.gen_xor(q, m);
    let sr = ir.read_reg(REG_SR);
    let sr = ir.gen_andi(sr, !(SR_Q | SR_M | SR_T));
    let qb = ir.gen_shli(q, 8);
    let mb = ir.gen_shli(m, 9);
    let sr = ir.gen_or(sr, qb);
    let sr = ir.gen_or(sr, mb);
    let sr = ir.gen_or(sr, t);
    gen_write_sr_flags(ir, sr);
}

fn trans_div0u(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    let sr = ir.read_reg(REG_SR);
    let sr = ir.gen_andi(sr, !(SR_Q | SR_M | SR_T));
    gen_write_sr_flags(ir, sr);
}

fn trans_div1(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let d = ir.gen_call(Sh4Helper::Div1 as u32, &[rn, rm], 0);
    set_reg(ir, i.n, d);
}

fn gen_dmul(ir: &mut Context, i: Sh4Instr, high: BinOp) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let hi = high(ir, rn, rm);
    let lo = ir.gen_mul(rn, rm);
    ir.write_reg(REG_MACH, hi);
    ir.write_reg(REG_MACL, lo);
}

fn trans_dmuls_l(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_dmul(ir, i, Context::gen_mulsh);
}

fn trans_dmulu_l(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_dmul(ir, i, Context::gen_muluh);
}

fn trans_dt(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let d = ir.gen_addi(rn, u32::MAX);
    let t = ir.gen_setcondi(Cond::Eq, d, 0);
    set_reg(ir, i.n, d);
    set_t(ir, t);
}

fn trans_exts_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_ext8s);
}

fn trans_exts_w(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_ext16s);
}

fn trans_extu_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_ext8u);
}

fn trans_extu_w(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_ext16u);
}

fn trans_mul_l(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let d = ir.gen_mul(rn, rm);
    ir.write_reg(REG_MACL, d);
}

fn gen_mul_w(ir: &mut Context, i: Sh4Instr, ext: UnOp) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let a = ext(ir, rn);
    let b = ext(ir, rm);
    let d = ir.gen_mul(a, b);
    ir.write_reg(REG_MACL, d);
}

fn trans_muls_w(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mul_w(ir, i, Context::gen_ext16s);
}

fn trans_mulu_w(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mul_w(ir, i, Context::gen_ext16u);
}

fn trans_neg(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_neg);
}

fn trans_negc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rm = reg(ir, i.m);
    let t = ir.read_reg(REG_T);
    let tmp = ir.gen_neg(rm);
    let res = ir.gen_sub(tmp, t);
    let c1 = ir.gen_setcondi(Cond::Ne, tmp, 0);
    let c2 = ir.gen_setcond(Cond::Ltu, tmp, res);
    let borrow = ir.gen_or(c1, c2);
    set_reg(ir, i.n, res);
    set_t(ir, borrow);
}

fn trans_sub(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_rr(ir, i, Context::gen_sub);
}

fn trans_subc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let t = ir.read_reg(REG_T);
    let diff = ir.gen_sub(rn, rm);
    let b1 = ir.gen_setcond(Cond::Ltu, rn, diff);
    let res = ir.gen_sub(diff, t);
    let b2 = ir.gen_setcond(Cond::Ltu, diff, res);
    let borrow = ir.gen_or(b1, b2);
    set_reg(ir, i.n, res);
    set_t(ir, borrow);
}

fn trans_subv(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let res = ir.gen_sub(rn, rm);
    // Overflow when the operands differ in sign and the result takes Rm's.
    let x1 = ir.gen_xor(rn, rm);
    let x2 = ir.gen_xor(rn, res);
    let ov = ir.gen_and(x1, x2);
    let t = ir.gen_shri(ov, 31);
    set_reg(ir, i.n, res);
    set_t(ir, t);
}

// ── Logic ──────────────────────────────────────────────────────

fn trans_and(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_rr(ir, i, Context::gen_and);
}

fn trans_and_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_r0_imm(ir, i.imm8 as u32, Context::gen_and);
}

fn trans_and_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_gbr_byte_rmw(ir, i.imm8, Context::gen_and);
}

fn trans_not(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_unary(ir, i, Context::gen_not);
}

fn trans_or(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_rr(ir, i, Context::gen_or);
}

fn trans_or_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_r0_imm(ir, i.imm8 as u32, Context::gen_or);
}

fn trans_or_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_gbr_byte_rmw(ir, i.imm8, Context::gen_or);
}

fn trans_tas_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let addr = reg(ir, i.n);
    let v = ir.gen_load(MemOp::ub(), addr);
    let t = ir.gen_setcondi(Cond::Eq, v, 0);
    let d = ir.gen_ori(v, 0x80);
    ir.gen_store(MemOp::ub(), addr, d);
    set_t(ir, t);
}

fn trans_tst(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cmp(ir, i, Cond::TstEq);
}

fn trans_tst_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let r0 = reg(ir, 0);
    let t = ir.gen_setcondi(Cond::TstEq, r0, i.imm8 as u32);
    set_t(ir, t);
}

fn trans_tst_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let r0 = reg(ir, 0);
    let gbr = ir.read_reg(REG_GBR);
    let addr = ir.gen_add(r0, gbr);
    let v = ir.gen_load(MemOp::ub(), addr);
    let t = ir.gen_setcondi(Cond::TstEq, v, i.imm8 as u32);
    set_t(ir, t);
}

fn trans_xor(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_rr(ir, i, Context::gen_xor);
}

fn trans_xor_imm(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_r0_imm(ir, i.imm8 as u32, Context::gen_xor);
}

fn trans_xor_b(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_gbr_byte_rmw(ir, i.imm8, Context::gen_xor);
}

// ── Shift/rotate ───────────────────────────────────────────────

fn trans_rotl(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 31, |ir, a, _| ir.gen_rotli(a, 1));
}

fn trans_rotr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 0, |ir, a, _| ir.gen_rotri(a, 1));
}

fn trans_rotcl(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let t = ir.read_reg(REG_T);
    let out = ir.gen_shri(rn, 31);
    let sh = ir.gen_shli(rn, 1);
    let d = ir.gen_or(sh, t);
    set_reg(ir, i.n, d);
    set_t(ir, out);
}

fn trans_rotcr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let t = ir.read_reg(REG_T);
    let out = ir.gen_andi(rn, 1);
    let sh = ir.gen_shri(rn, 1);
    let tb = ir.gen_shli(t, 31);
    let d = ir.gen_or(sh, tb);
    set_reg(ir, i.n, d);
    set_t(ir, out);
}

/// SHAD/SHLD: shift left by Rm when Rm >= 0, right by `32 - (Rm & 31)`
/// otherwise. A negative Rm with zero low bits shifts everything out.
fn gen_dynamic_shift(ir: &mut Context, i: Sh4Instr, right: BinOp, fill: Option<u32>) {
    let rn = reg(ir, i.n);
    let rm = reg(ir, i.m);
    let zero = ir.new_const(0);
    let l_right = ir.new_label();
    let l_done = ir.new_label();

    ir.gen_brcond(Cond::Lt, rm, zero, l_right);
    let amt = ir.gen_andi(rm, 31);
    let d = ir.gen_shl(rn, amt);
    set_reg(ir, i.n, d);
    ir.gen_br(l_done);

    ir.gen_set_label(l_right);
    let neg = ir.gen_neg(rm);
    let amt = ir.gen_andi(neg, 31);
    let shifted = right(ir, rn, amt);
    let out = match fill {
        Some(sh) => ir.gen_sari(rn, sh),
        None => zero,
    };
    let k31 = ir.new_const(31);
    let d = ir.gen_movcond(Cond::TstEq, rm, k31, out, shifted);
    set_reg(ir, i.n, d);

    ir.gen_set_label(l_done);
}

fn trans_shad(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_dynamic_shift(ir, i, Context::gen_sar, Some(31));
}

fn trans_shld(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_dynamic_shift(ir, i, Context::gen_shr, None);
}

fn trans_shal(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 31, Context::gen_shl);
}

fn trans_shar(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 0, Context::gen_sar);
}

fn trans_shll(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 31, Context::gen_shl);
}

fn trans_shlr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift1(ir, i, 0, Context::gen_shr);
}

fn trans_shll2(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 2, Context::gen_shl);
}

fn trans_shll8(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 8, Context::gen_shl);
}

fn trans_shll16(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 16, Context::gen_shl);
}

fn trans_shlr2(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 2, Context::gen_shr);
}

fn trans_shlr8(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 8, Context::gen_shr);
}

fn trans_shlr16(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_shift_imm(ir, i, 16, Context::gen_shr);
}

// ── Branch ─────────────────────────────────────────────────────

/// BF/BT and their delayed forms. T is sampled before the delay slot.
fn gen_cond_branch(
    ctx: &mut Sh4DisasContext<'_>,
    ir: &mut Context,
    addr: u32,
    i: Sh4Instr,
    taken_if_set: bool,
    delayed: bool,
) {
    begin_branch(ctx);
    let t = ir.read_reg(REG_T);
    let zero = ir.new_const(0);
    let cond = if taken_if_set { Cond::Ne } else { Cond::Eq };
    let target = i.branch_target8(addr);
    let fallthrough = if delayed {
        if !ctx.translate_delay_slot(ir, addr) {
            return;
        }
        addr.wrapping_add(4)
    } else {
        addr.wrapping_add(2)
    };
    if ctx.slot_sleep {
        let taken = ir.new_const(target);
        let not_taken = ir.new_const(fallthrough);
        let next = ir.gen_movcond(cond, t, zero, taken, not_taken);
        gen_sleep_at(ir, next);
        return;
    }
    ir.gen_brcond_tb(cond, t, zero, target, fallthrough);
}

fn trans_bf(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cond_branch(ctx, ir, addr, i, false, false);
}

fn trans_bfs(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cond_branch(ctx, ir, addr, i, false, true);
}

fn trans_bt(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cond_branch(ctx, ir, addr, i, true, false);
}

fn trans_bts(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_cond_branch(ctx, ir, addr, i, true, true);
}

/// Delayed jump to a static target.
fn gen_delayed_goto(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, target: u32) {
    begin_branch(ctx);
    if !ctx.translate_delay_slot(ir, addr) {
        return;
    }
    if ctx.slot_sleep {
        let next = ir.new_const(target);
        gen_sleep_at(ir, next);
    } else {
        ir.gen_goto_tb(target);
    }
}

/// Delayed jump to a target computed at runtime (before the slot runs).
fn gen_delayed_goto_ptr(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, target: Value) {
    begin_branch(ctx);
    if !ctx.translate_delay_slot(ir, addr) {
        return;
    }
    if ctx.slot_sleep {
        gen_sleep_at(ir, target);
    } else {
        ir.gen_goto_ptr(target);
    }
}

fn gen_link(ir: &mut Context, addr: u32) {
    let ret = ir.new_const(addr.wrapping_add(4));
    ir.write_reg(REG_PR, ret);
}

fn trans_bra(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_delayed_goto(ctx, ir, addr, i.branch_target12(addr));
}

fn trans_bsr(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    gen_link(ir, addr);
    gen_delayed_goto(ctx, ir, addr, i.branch_target12(addr));
}

fn trans_braf(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let target = ir.gen_addi(rn, addr.wrapping_add(4));
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

fn trans_bsrf(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let rn = reg(ir, i.n);
    let target = ir.gen_addi(rn, addr.wrapping_add(4));
    gen_link(ir, addr);
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

fn trans_jmp(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let target = reg(ir, i.n);
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

fn trans_jsr(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let target = reg(ir, i.n);
    gen_link(ir, addr);
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

fn trans_rts(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, _i: Sh4Instr, _ds: bool) {
    let target = ir.read_reg(REG_PR);
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

fn trans_rte(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, _i: Sh4Instr, _ds: bool) {
    let target = ir.read_reg(REG_SPC);
    let ssr = ir.read_reg(REG_SSR);
    gen_write_sr(ir, ssr);
    gen_delayed_goto_ptr(ctx, ir, addr, target);
}

// ── System ─────────────────────────────────────────────────────

fn trans_clrmac(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    let zero = ir.new_const(0);
    ir.write_reg(REG_MACH, zero);
    ir.write_reg(REG_MACL, zero);
}

fn gen_sr_bit(ir: &mut Context, bit: u32, set: bool) {
    let sr = ir.read_reg(REG_SR);
    let sr = if set {
        ir.gen_ori(sr, bit)
    } else {
        ir.gen_andi(sr, !bit)
    };
    gen_write_sr_flags(ir, sr);
}

fn trans_clrs(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    gen_sr_bit(ir, SR_S, false);
}

fn trans_sets(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    gen_sr_bit(ir, SR_S, true);
}

fn trans_clrt(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    let zero = ir.new_const(0);
    set_t(ir, zero);
}

fn trans_sett(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    let one = ir.new_const(1);
    set_t(ir, one);
}

fn trans_nop(_ctx: &mut Sh4DisasContext<'_>, _ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {}

/// Leave the block asleep, waking up at `next`.
fn gen_sleep_at(ir: &mut Context, next: Value) {
    ir.write_reg(REG_PC, next);
    ir.gen_exit_tb(EXIT_SLEEP);
}

fn trans_sleep(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, _i: Sh4Instr, ds: bool) {
    if ds {
        // The owning branch supplies the wake-up PC.
        ctx.slot_sleep = true;
        return;
    }
    let next = ir.new_const(addr.wrapping_add(2));
    gen_sleep_at(ir, next);
    ctx.base.is_jmp = DisasJumpType::NoReturn;
}

fn trans_trapa(ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, addr: u32, i: Sh4Instr, _ds: bool) {
    let imm = ir.new_const(i.imm8 as u32);
    let next = ir.new_const(addr.wrapping_add(2));
    ir.gen_call(Sh4Helper::Trapa as u32, &[imm, next], 0);
    let vector = ir.read_reg(REG_PC);
    ir.gen_goto_ptr(vector);
    begin_branch(ctx);
}

fn gen_mem_helper(ir: &mut Context, helper: Sh4Helper, i: Sh4Instr) {
    let addr = reg(ir, i.n);
    ir.gen_call(helper as u32, &[addr], CALL_NO_REG_ACCESS);
}

fn trans_ldtlb(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, _i: Sh4Instr, _ds: bool) {
    ir.gen_call(Sh4Helper::Ldtlb as u32, &[], CALL_NO_REG_ACCESS);
}

fn trans_ocbi(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mem_helper(ir, Sh4Helper::Ocbi, i);
}

fn trans_ocbp(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mem_helper(ir, Sh4Helper::Ocbp, i);
}

fn trans_ocbwb(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mem_helper(ir, Sh4Helper::Ocbwb, i);
}

fn trans_pref(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_mem_helper(ir, Sh4Helper::Pref, i);
}

// -- LDC / LDS --

fn trans_ldc_sr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let v = reg(ir, i.n);
    gen_write_sr(ir, v);
}

fn trans_ldcl_sr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    let v = gen_pop(ir, i.n, MemOp::ul());
    gen_write_sr(ir, v);
}

/// `ctl = Rn`.
fn gen_ldc(ir: &mut Context, i: Sh4Instr, ctl: u32) {
    let v = reg(ir, i.n);
    ir.write_reg(ctl, v);
}

/// `ctl = @Rn+`.
fn gen_ldcl(ir: &mut Context, i: Sh4Instr, ctl: u32) {
    let v = gen_pop(ir, i.n, MemOp::ul());
    ir.write_reg(ctl, v);
}

/// `Rn = ctl`.
fn gen_stc(ir: &mut Context, i: Sh4Instr, ctl: u32) {
    let v = ir.read_reg(ctl);
    set_reg(ir, i.n, v);
}

/// `@-Rn = ctl`.
fn gen_stcl(ir: &mut Context, i: Sh4Instr, ctl: u32) {
    let v = ir.read_reg(ctl);
    gen_push(ir, i.n, MemOp::ul(), v);
}

macro_rules! ctl_transfers {
    ($( $ldc:ident, $ldcl:ident, $stc:ident, $stcl:ident => $reg:expr; )*) => {
        $(
            fn $ldc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
                gen_ldc(ir, i, $reg);
            }
            fn $ldcl(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
                gen_ldcl(ir, i, $reg);
            }
            fn $stc(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
                gen_stc(ir, i, $reg);
            }
            fn $stcl(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
                gen_stcl(ir, i, $reg);
            }
        )*
    };
}

ctl_transfers! {
    trans_ldc_gbr, trans_ldcl_gbr, trans_stc_gbr, trans_stcl_gbr => REG_GBR;
    trans_ldc_vbr, trans_ldcl_vbr, trans_stc_vbr, trans_stcl_vbr => REG_VBR;
    trans_ldc_ssr, trans_ldcl_ssr, trans_stc_ssr, trans_stcl_ssr => REG_SSR;
    trans_ldc_spc, trans_ldcl_spc, trans_stc_spc, trans_stcl_spc => REG_SPC;
    trans_ldc_dbr, trans_ldcl_dbr, trans_stc_dbr, trans_stcl_dbr => REG_DBR;
    trans_lds_mach, trans_ldsl_mach, trans_sts_mach, trans_stsl_mach => REG_MACH;
    trans_lds_macl, trans_ldsl_macl, trans_sts_macl, trans_stsl_macl => REG_MACL;
    trans_lds_pr, trans_ldsl_pr, trans_sts_pr, trans_stsl_pr => REG_PR;
}

fn trans_ldc_bank(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_ldc(ir, i, REG_BANK0 + i.bank() as u32);
}

fn trans_ldcl_bank(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_ldcl(ir, i, REG_BANK0 + i.bank() as u32);
}

fn trans_stc_bank(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stc(ir, i, REG_BANK0 + i.bank() as u32);
}

fn trans_stcl_bank(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stcl(ir, i, REG_BANK0 + i.bank() as u32);
}

fn trans_stc_sr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stc(ir, i, REG_SR);
}

fn trans_stcl_sr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stcl(ir, i, REG_SR);
}

fn trans_stc_sgr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stc(ir, i, REG_SGR);
}

fn trans_stcl_sgr(_ctx: &mut Sh4DisasContext<'_>, ir: &mut Context, _addr: u32, i: Sh4Instr, _ds: bool) {
    gen_stcl(ir, i, REG_SGR);
}

// ── Dispatch table ─────────────────────────────────────────────

const fn build_translators() -> [TranslateFn; NUM_SH4_OPS] {
    let mut t: [TranslateFn; NUM_SH4_OPS] = [trans_invalid; NUM_SH4_OPS];

    macro_rules! set {
        ($($op:ident => $f:ident,)*) => {
            $(t[Sh4Op::$op as usize] = $f;)*
        };
    }

    set! {
        MovImm => trans_mov_imm,
        MovwPcrel => trans_movw_pcrel,
        MovlPcrel => trans_movl_pcrel,
        Mov => trans_mov,
        MovbStore => trans_movb_store,
        MovwStore => trans_movw_store,
        MovlStore => trans_movl_store,
        MovbLoad => trans_movb_load,
        MovwLoad => trans_movw_load,
        MovlLoad => trans_movl_load,
        MovbPredec => trans_movb_predec,
        MovwPredec => trans_movw_predec,
        MovlPredec => trans_movl_predec,
        MovbPostinc => trans_movb_postinc,
        MovwPostinc => trans_movw_postinc,
        MovlPostinc => trans_movl_postinc,
        MovbStoreDisp => trans_movb_store_disp,
        MovwStoreDisp => trans_movw_store_disp,
        MovlStoreDisp => trans_movl_store_disp,
        MovbLoadDisp => trans_movb_load_disp,
        MovwLoadDisp => trans_movw_load_disp,
        MovlLoadDisp => trans_movl_load_disp,
        MovbStoreIdx => trans_movb_store_idx,
        MovwStoreIdx => trans_movw_store_idx,
        MovlStoreIdx => trans_movl_store_idx,
        MovbLoadIdx => trans_movb_load_idx,
        MovwLoadIdx => trans_movw_load_idx,
        MovlLoadIdx => trans_movl_load_idx,
        MovbStoreGbr => trans_movb_store_gbr,
        MovwStoreGbr => trans_movw_store_gbr,
        MovlStoreGbr => trans_movl_store_gbr,
        MovbLoadGbr => trans_movb_load_gbr,
        MovwLoadGbr => trans_movw_load_gbr,
        MovlLoadGbr => trans_movl_load_gbr,
        Mova => trans_mova,
        Movt => trans_movt,
        MovcaL => trans_movca_l,
        SwapB => trans_swap_b,
        SwapW => trans_swap_w,
        Xtrct => trans_xtrct,

        Add => trans_add,
        AddImm => trans_add_imm,
        Addc => trans_addc,
        Addv => trans_addv,
        CmpEqImm => trans_cmp_eq_imm,
        CmpEq => trans_cmp_eq,
        CmpHs => trans_cmp_hs,
        CmpGe => trans_cmp_ge,
        CmpHi => trans_cmp_hi,
        CmpGt => trans_cmp_gt,
        CmpPz => trans_cmp_pz,
        CmpPl => trans_cmp_pl,
        CmpStr => trans_cmp_str,
        Div0s => trans_div0s,
        Div0u => trans_div0u,
        Div1 => trans_div1,
        DmulsL => trans_dmuls_l,
        DmuluL => trans_dmulu_l,
        Dt => trans_dt,
        ExtsB => trans_exts_b,
        ExtsW => trans_exts_w,
        ExtuB => trans_extu_b,
        ExtuW => trans_extu_w,
        MulL => trans_mul_l,
        MulsW => trans_muls_w,
        MuluW => trans_mulu_w,
        Neg => trans_neg,
        Negc => trans_negc,
        Sub => trans_sub,
        Subc => trans_subc,
        Subv => trans_subv,

        And => trans_and,
        AndImm => trans_and_imm,
        AndB => trans_and_b,
        Not => trans_not,
        Or => trans_or,
        OrImm => trans_or_imm,
        OrB => trans_or_b,
        TasB => trans_tas_b,
        Tst => trans_tst,
        TstImm => trans_tst_imm,
        TstB => trans_tst_b,
        Xor => trans_xor,
        XorImm => trans_xor_imm,
        XorB => trans_xor_b,

        Rotl => trans_rotl,
        Rotr => trans_rotr,
        Rotcl => trans_rotcl,
        Rotcr => trans_rotcr,
        Shad => trans_shad,
        Shal => trans_shal,
        Shar => trans_shar,
        Shld => trans_shld,
        Shll => trans_shll,
        Shll2 => trans_shll2,
        Shll8 => trans_shll8,
        Shll16 => trans_shll16,
        Shlr => trans_shlr,
        Shlr2 => trans_shlr2,
        Shlr8 => trans_shlr8,
        Shlr16 => trans_shlr16,

        Bf => trans_bf,
        Bfs => trans_bfs,
        Bt => trans_bt,
        Bts => trans_bts,
        Bra => trans_bra,
        Braf => trans_braf,
        Bsr => trans_bsr,
        Bsrf => trans_bsrf,
        Jmp => trans_jmp,
        Jsr => trans_jsr,
        Rts => trans_rts,
        Rte => trans_rte,

        Clrmac => trans_clrmac,
        Clrs => trans_clrs,
        Clrt => trans_clrt,
        Sets => trans_sets,
        Sett => trans_sett,
        Nop => trans_nop,
        Sleep => trans_sleep,
        Trapa => trans_trapa,
        Ldtlb => trans_ldtlb,
        Ocbi => trans_ocbi,
        Ocbp => trans_ocbp,
        Ocbwb => trans_ocbwb,
        Pref => trans_pref,
        LdcSr => trans_ldc_sr,
        LdcGbr => trans_ldc_gbr,
        LdcVbr => trans_ldc_vbr,
        LdcSsr => trans_ldc_ssr,
        LdcSpc => trans_ldc_spc,
        LdcDbr => trans_ldc_dbr,
        LdcBank => trans_ldc_bank,
        LdclSr => trans_ldcl_sr,
        LdclGbr => trans_ldcl_gbr,
        LdclVbr => trans_ldcl_vbr,
        LdclSsr => trans_ldcl_ssr,
        LdclSpc => trans_ldcl_spc,
        LdclDbr => trans_ldcl_dbr,
        LdclBank => trans_ldcl_bank,
        LdsMach => trans_lds_mach,
        LdsMacl => trans_lds_macl,
        LdsPr => trans_lds_pr,
        LdslMach => trans_ldsl_mach,
        LdslMacl => trans_ldsl_macl,
        LdslPr => trans_ldsl_pr,
        StcSr => trans_stc_sr,
        StcGbr => trans_stc_gbr,
        StcVbr => trans_stc_vbr,
        StcSsr => trans_stc_ssr,
        StcSpc => trans_stc_spc,
        StcSgr => trans_stc_sgr,
        StcDbr => trans_stc_dbr,
        StcBank => trans_stc_bank,
        StclSr => trans_stcl_sr,
        StclGbr => trans_stcl_gbr,
        StclVbr => trans_stcl_vbr,
        StclSsr => trans_stcl_ssr,
        StclSpc => trans_stcl_spc,
        StclSgr => trans_stcl_sgr,
        StclDbr => trans_stcl_dbr,
        StclBank => trans_stcl_bank,
        StsMach => trans_sts_mach,
        StsMacl => trans_sts_macl,
        StsPr => trans_sts_pr,
        StslMach => trans_stsl_mach,
        StslMacl => trans_stsl_macl,
        StslPr => trans_stsl_pr,
    }

    t
}

/// Translation routine for every opcode class, indexed by `Sh4Op as usize`.
/// Classes without a dedicated routine raise an illegal instruction.
pub static SH4_TRANSLATORS: [TranslateFn; NUM_SH4_OPS] = build_translators();
