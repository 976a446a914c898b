//! One instruction followed by SLEEP, checked against the architectural
//! result.

use sh4jit_core::MemOp;
use sh4jit_frontend::sh4::cpu::{SR_M, SR_Q};
use sh4jit_guest::Sh4Machine;

use super::{layout, run, run_with, NOP, SLEEP};
use crate::util::BASE;

/// Scratch RAM below the program.
const DATA: u32 = 0x8c00_0000;

fn exec(insn: u16, setup: impl FnOnce(&mut Sh4Machine)) -> Sh4Machine {
    run_with(&[insn, SLEEP], setup)
}

/// Run `insn` with r1 = `rn`, r2 = `rm` and T = `t`; returns (r1, T).
fn binop(insn: u16, rn: u32, rm: u32, t: u32) -> (u32, u32) {
    let m = exec(insn, |m| {
        m.cpu.r[1] = rn;
        m.cpu.r[2] = rm;
        m.cpu.t = t;
    });
    (m.cpu.r[1], m.cpu.t)
}

#[test]
fn carry_and_borrow() {
    // addc r2, r1
    assert_eq!(binop(0x312e, 0xffff_ffff, 1, 0), (0, 1));
    assert_eq!(binop(0x312e, 1, 2, 1), (4, 0));
    // subc r2, r1
    assert_eq!(binop(0x312a, 0, 1, 0), (0xffff_ffff, 1));
    assert_eq!(binop(0x312a, 5, 2, 1), (2, 0));
    // negc r2, r1
    assert_eq!(binop(0x612a, 0, 1, 0), (0xffff_ffff, 1));
    assert_eq!(binop(0x612a, 0, 0, 0), (0, 0));
}

#[test]
fn signed_overflow() {
    // addv r2, r1
    assert_eq!(binop(0x312f, 0x7fff_ffff, 1, 0), (0x8000_0000, 1));
    assert_eq!(binop(0x312f, 1, 1, 1), (2, 0));
    // subv r2, r1
    assert_eq!(binop(0x312b, 0x8000_0000, 1, 0), (0x7fff_ffff, 1));
    assert_eq!(binop(0x312b, 3, 1, 1), (2, 0));
}

#[test]
fn comparisons() {
    // cmp/gt r2, r1: signed
    assert_eq!(binop(0x3127, 1, 0xffff_ffff, 0).1, 1);
    // cmp/hi r2, r1: unsigned
    assert_eq!(binop(0x3126, 1, 0xffff_ffff, 1).1, 0);
    // cmp/str r2, r1: some byte equal
    assert_eq!(binop(0x212c, 0x1234_5678, 0xab34_cdef, 0).1, 1);
    assert_eq!(binop(0x212c, 0x1234_5678, 0x2143_6587, 1).1, 0);
    // tst r2, r1
    assert_eq!(binop(0x2128, 0xf0, 0x0f, 0).1, 1);
}

#[test]
fn wide_multiplies() {
    // dmuls.l r2, r1
    let m = exec(0x312d, |m| {
        m.cpu.r[1] = (-2i32) as u32;
        m.cpu.r[2] = 3;
    });
    assert_eq!((m.cpu.mach, m.cpu.macl), (0xffff_ffff, 0xffff_fffa));

    // dmulu.l r2, r1
    let m = exec(0x3125, |m| {
        m.cpu.r[1] = 0xffff_ffff;
        m.cpu.r[2] = 2;
    });
    assert_eq!((m.cpu.mach, m.cpu.macl), (1, 0xffff_fffe));
}

#[test]
fn narrow_multiplies() {
    let setup = |m: &mut Sh4Machine| {
        m.cpu.r[1] = 0x0001_ffff;
        m.cpu.r[2] = 3;
    };
    // mul.l r2, r1
    assert_eq!(exec(0x0127, setup).cpu.macl, 0x0005_fffd);
    // muls.w r2, r1
    assert_eq!(exec(0x212f, setup).cpu.macl, 0xffff_fffd);
    // mulu.w r2, r1
    assert_eq!(exec(0x212e, setup).cpu.macl, 0x0002_fffd);
}

#[test]
fn dynamic_shifts() {
    // shad r2, r1
    assert_eq!(binop(0x412c, 1, 4, 0).0, 16);
    assert_eq!(binop(0x412c, 0x8000_0000, (-4i32) as u32, 0).0, 0xf800_0000);
    assert_eq!(binop(0x412c, 0x8000_0000, (-32i32) as u32, 0).0, 0xffff_ffff);
    assert_eq!(binop(0x412c, 0x4000_0000, (-32i32) as u32, 0).0, 0);
    // shld r2, r1
    assert_eq!(binop(0x412d, 0x8000_0000, (-4i32) as u32, 0).0, 0x0800_0000);
    assert_eq!(binop(0x412d, 0x8000_0000, (-32i32) as u32, 0).0, 0);
    assert_eq!(binop(0x412d, 3, 31, 0).0, 0x8000_0000);
}

#[test]
fn rotates_through_t() {
    // rotcl r1
    assert_eq!(binop(0x4124, 0x8000_0000, 0, 0), (0, 1));
    assert_eq!(binop(0x4124, 0, 0, 1), (1, 0));
    // rotcr r1
    assert_eq!(binop(0x4125, 1, 0, 1), (0x8000_0000, 1));
    // rotl r1
    assert_eq!(binop(0x4104, 0x8000_0001, 0, 0), (3, 1));
    // shar r1
    assert_eq!(binop(0x4121, 0x8000_0001, 0, 0), (0xc000_0000, 1));
}

#[test]
fn data_movement() {
    // xtrct r2, r1
    assert_eq!(binop(0x212d, 0x1111_2222, 0x3333_4444, 0).0, 0x4444_1111);
    // swap.w r2, r1
    assert_eq!(binop(0x6129, 0, 0x1111_2222, 0).0, 0x2222_1111);
    // swap.b r2, r1
    assert_eq!(binop(0x6128, 0, 0x1111_2233, 0).0, 0x1111_3322);
    // exts.b r2, r1
    assert_eq!(binop(0x612e, 0, 0x80, 0).0, 0xffff_ff80);
    // extu.w r2, r1
    assert_eq!(binop(0x612d, 0, 0xffff_8000, 0).0, 0x8000);
    // movt r1
    assert_eq!(binop(0x0129, 0, 0, 1).0, 1);
    // dt r1
    assert_eq!(binop(0x4110, 1, 0, 0), (0, 1));
}

#[test]
fn div0s_sets_q_m_t() {
    let m = exec(0x2127, |m| {
        m.cpu.r[1] = 0x8000_0000;
        m.cpu.r[2] = 1;
    });
    assert_ne!(m.cpu.sr() & SR_Q, 0);
    assert_eq!(m.cpu.sr() & SR_M, 0);
    assert_eq!(m.cpu.t, 1);
}

#[test]
fn signed_byte_load() {
    // mov.b @r2, r1
    let m = exec(0x6120, |m| {
        m.write(DATA, 0x80, MemOp::ub());
        m.cpu.r[2] = DATA;
    });
    assert_eq!(m.cpu.r[1], 0xffff_ff80);
}

#[test]
fn post_increment_onto_itself() {
    // mov.l @r1+, r1
    let m = exec(0x6116, |m| {
        m.write(DATA, 0x1234_5678, MemOp::ul());
        m.cpu.r[1] = DATA;
    });
    assert_eq!(m.cpu.r[1], 0x1234_5678);
}

#[test]
fn pre_decrement_stores_old_value() {
    // mov.l r1, @-r1
    let mut m = exec(0x2116, |m| m.cpu.r[1] = DATA + 0x10);
    assert_eq!(m.cpu.r[1], DATA + 0x0c);
    assert_eq!(m.read(DATA + 0x0c, MemOp::ul()), DATA + 0x10);
}

#[test]
fn test_and_set() {
    // tas.b @r1
    let mut m = exec(0x411b, |m| m.cpu.r[1] = DATA);
    assert_eq!(m.cpu.t, 1);
    assert_eq!(m.read(DATA, MemOp::ub()), 0x80);

    let m = exec(0x411b, |m| {
        m.write(DATA, 0x01, MemOp::ub());
        m.cpu.r[1] = DATA;
    });
    assert_eq!(m.cpu.t, 0);
}

#[test]
fn gbr_byte_update() {
    // or.b #0x0f, @(r0, gbr)
    let mut m = exec(0xcf0f, |m| {
        m.write(DATA + 4, 0xf0, MemOp::ub());
        m.cpu.gbr = DATA;
        m.cpu.r[0] = 4;
    });
    assert_eq!(m.read(DATA + 4, MemOp::ub()), 0xff);
}

#[test]
fn pc_relative_address() {
    // mova @(0x8c010008), r0
    let m = run(&[0xc701, SLEEP]);
    assert_eq!(m.cpu.r[0], BASE + 8);
}

#[test]
fn braf_is_relative_to_the_slot() {
    let m = run_with(&layout(&[0x0123, NOP], 0x14, &[SLEEP]), |m| m.cpu.r[1] = 0x10);
    assert_eq!(m.cpu.pc, BASE + 0x16);
}

#[test]
fn jsr_links_past_the_slot() {
    let m = run_with(&layout(&[0x410b, 0xe305], 0x20, &[SLEEP]), |m| {
        m.cpu.r[1] = BASE + 0x20;
    });
    assert_eq!(m.cpu.pr, BASE + 4);
    assert_eq!(m.cpu.r[3], 5);
    assert_eq!(m.cpu.pc, BASE + 0x22);
}
