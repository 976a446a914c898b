//! Exceptions, privileged state and register banks.

use sh4jit_exec::ExitReason;
use sh4jit_frontend::sh4::cpu::{SR_BL, SR_MD, SR_RB};

use super::{layout, run, run_until_exit, run_with, NOP, SLEEP};
use crate::util::{exec_env, machine, BASE};

/// VBR used by the tests; the general handler lives at VBR + 0x100.
const VBR: u32 = BASE + 0x200;
const HANDLER: u32 = VBR + 0x100;

#[test]
fn illegal_instruction_enters_the_handler() {
    let mut m = machine(&layout(&[0xe101, 0xffff], 0x300, &[SLEEP]));
    m.cpu.vbr = VBR;
    m.cpu.r[15] = 0x1234;
    let mut env = exec_env();

    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Exception(0x180));
    assert_eq!(m.cpu.expevt, 0x180);
    assert_eq!(m.cpu.spc, BASE + 2);
    assert_eq!(m.cpu.sgr, 0x1234);
    assert_eq!(m.cpu.pc, HANDLER);
    // Instructions before the fault have retired.
    assert_eq!(m.cpu.r[1], 1);

    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.pc, HANDLER + 2);
}

#[test]
fn branch_in_delay_slot_is_slot_illegal() {
    let mut m = machine(&[0xa000, 0xa000]);
    m.cpu.vbr = VBR;
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Exception(0x1a0));
    assert_eq!(m.cpu.spc, BASE);
}

#[test]
fn trapa_vectors_to_the_handler() {
    let m = run_with(&layout(&[NOP, 0xc305], 0x300, &[SLEEP]), |m| m.cpu.vbr = VBR);
    assert_eq!(m.cpu.tra, 0x14);
    assert_eq!(m.cpu.expevt, 0x160);
    assert_eq!(m.cpu.spc, BASE + 4);
    assert_eq!(m.cpu.pc, HANDLER + 2);
    assert_ne!(m.cpu.sr() & SR_BL, 0);
}

#[test]
fn rte_restores_sr_and_returns() {
    let m = run_with(&layout(&[0x002b, NOP], 0x10, &[SLEEP]), |m| {
        m.cpu.spc = BASE + 0x10;
        m.cpu.ssr = SR_MD | 1;
    });
    assert_eq!(m.cpu.sr(), SR_MD | 1);
    assert_eq!(m.cpu.t, 1);
    assert_eq!(m.cpu.pc, BASE + 0x12);
}

#[test]
fn privileged_instruction_in_user_mode() {
    let mut m = machine(&[SLEEP]);
    m.cpu.set_sr(0);
    m.cpu.vbr = VBR;
    let mut env = exec_env();

    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Exception(0x180));
    assert!(m.cpu.md());
    assert_eq!(m.cpu.ssr, 0);
    assert_eq!(m.cpu.pc, HANDLER);
}

#[test]
fn same_code_translates_per_mode() {
    let mut m = machine(&[0xe101, SLEEP]);
    m.cpu.vbr = VBR;
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);

    m.cpu.set_sr(0);
    m.cpu.pc = BASE;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Exception(0x180));
    assert_eq!(env.stats.compiles, 2);
}

#[test]
fn banked_register_transfer() {
    let m = run(&[
        0xe005, // mov #5, r0
        0x409e, // ldc r0, r1_bank
        0x0292, // stc r1_bank, r2
        SLEEP,
    ]);
    assert_eq!(m.cpu.r_bank[1], 5);
    assert_eq!(m.cpu.r[2], 5);
}

#[test]
fn sr_write_switches_banks() {
    let m = run_with(
        &[
            0xd001, // 00: mov.l @(0x08), r0
            0x400e, // 02: ldc r0, sr
            SLEEP,  // 04:
            NOP,    // 06:
            0x0000, // 08: .long 0x40000000
            0x4000,
        ],
        |m| m.cpu.r_bank[3] = 0x77,
    );
    assert_eq!(m.cpu.sr(), SR_MD);
    assert_eq!(m.cpu.sr() & SR_RB, 0);
    assert_eq!(m.cpu.r[3], 0x77);
    // r0 was written in bank 1 and is now the inactive copy.
    assert_eq!(m.cpu.r_bank[0], SR_MD);
}
