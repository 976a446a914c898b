use sh4jit_core::MemOp;
use sh4jit_exec::{ExitReason, JitConfig};

use super::{layout, run, run_until_exit, run_with, NOP, SLEEP};
use crate::util::{exec_env, exec_env_with, image, machine, BASE};

/// Sum 1..=10 into r1.
const LOOP: [u16; 6] = [
    0xe00a, // mov #10, r0
    0xe100, // mov #0, r1
    0x310c, // add r0, r1
    0x4010, // dt r0
    0x8bfc, // bf -4
    SLEEP,
];

#[test]
fn counted_loop() {
    let m = run(&LOOP);
    assert_eq!(m.cpu.r[1], 55);
    assert_eq!(m.cpu.r[0], 0);
    assert_eq!(m.cpu.t, 1);
    assert_eq!(m.cpu.pc, BASE + 0x0c);
}

#[test]
fn forward_branch_skips_code() {
    let m = run(&[
        0xe003, // mov #3, r0
        0x8803, // cmp/eq #3, r0
        0x8901, // bt +1
        0xe301, // mov #1, r3
        NOP,
        0xe407, // mov #7, r4
        SLEEP,
    ]);
    assert_eq!(m.cpu.r[3], 0);
    assert_eq!(m.cpu.r[4], 7);
}

#[test]
fn subroutine_call_with_stack() {
    let mut m = run(&[
        0xdf03, // 00: mov.l @(0x10), r15
        0xe12a, // 02: mov #42, r1
        0x2f16, // 04: mov.l r1, @-r15
        0xb005, // 06: bsr 0x14
        NOP,    // 08:
        0x62f6, // 0a: mov.l @r15+, r2
        SLEEP,  // 0c:
        NOP,    // 0e:
        0x1000, // 10: .long 0x8c001000
        0x8c00,
        0x7101, // 14: add #1, r1
        0x000b, // 16: rts
        0x6313, // 18: mov r1, r3
    ]);
    assert_eq!(m.cpu.r[15], 0x8c00_1000);
    assert_eq!(m.cpu.r[1], 43);
    assert_eq!(m.cpu.r[2], 42);
    assert_eq!(m.cpu.r[3], 43);
    assert_eq!(m.cpu.pr, BASE + 0x0a);
    assert_eq!(m.cpu.pc, BASE + 0x0e);
    assert_eq!(m.read(0x8c00_0ffc, MemOp::ul()), 42);
}

#[test]
fn self_modifying_code_is_retranslated() {
    let words = layout(
        &[
            0xe001, // mov #1, r0
            SLEEP,
        ],
        0x100,
        &[
            0xd101, // 100: mov.l @(0x108), r1
            0x9203, // 102: mov.w @(0x10c), r2
            0x2121, // 104: mov.w r2, @r1
            SLEEP,  // 106:
            0x0000, // 108: .long 0x8c010000
            0x8c01,
            0xe002, // 10c: mov #2, r0
        ],
    );
    let mut m = machine(&words);
    let mut env = exec_env();

    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[0], 1);

    m.cpu.pc = BASE + 0x100;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.read(BASE, MemOp::uw()), 0xe002);
    // The patcher shares the page with the code it rewrote.
    assert_eq!(env.stats.invalidated, 2);

    m.cpu.pc = BASE;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[0], 2);
    assert_eq!(env.stats.compiles, 3);
}

#[test]
fn code_survives_buffer_relocation() {
    let mut m = machine(&LOOP);
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    let compiles = env.stats.compiles;

    env.code_buf.relocate();
    m.cpu.r = [0; 16];
    m.cpu.pc = BASE;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);

    assert!(env.code_buf.relocation_count() >= 1);
    assert_eq!(env.stats.compiles, compiles);
    assert_eq!(m.cpu.r[1], 55);
}

#[test]
fn small_code_buffer_grows() {
    let mut m = machine(&LOOP);
    let mut env = exec_env_with(JitConfig {
        code_buffer_size: 16,
        code_buffer_limit: 1 << 20,
        ..JitConfig::default()
    });
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert!(env.code_buf.grow_count() > 0);
    assert_eq!(env.stats.flushes, 0);
    assert_eq!(m.cpu.r[1], 55);
}

#[test]
fn results_do_not_depend_on_chaining() {
    let mut chained = machine(&LOOP);
    let mut env = exec_env();
    run_until_exit(&mut env, &mut chained);

    let mut unchained = machine(&LOOP);
    let mut env = exec_env_with(JitConfig {
        chain_blocks: false,
        ..JitConfig::default()
    });
    run_until_exit(&mut env, &mut unchained);

    assert_eq!(chained.cpu.r, unchained.cpu.r);
    assert_eq!(chained.cpu.sr(), unchained.cpu.sr());
    assert_eq!(chained.cpu.pc, unchained.cpu.pc);
}

#[test]
fn single_instruction_blocks_give_the_same_result() {
    let mut m = machine(&LOOP);
    let mut env = exec_env_with(JitConfig {
        max_insns: 1,
        ..JitConfig::default()
    });
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[1], 55);
    assert_eq!(env.stats.compiles, LOOP.len() as u64);
}

#[test]
fn host_reload_between_runs_is_retranslated() {
    let mut m = machine(&[0xe001, SLEEP]); // mov #1, r0
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[0], 1);

    assert!(m.load_image(BASE, &image(&[0xe002, SLEEP]))); // mov #2, r0
    m.cpu.pc = BASE;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[0], 2);
    assert_eq!(env.stats.compiles, 2);
}

#[test]
fn host_store_between_runs_is_retranslated() {
    let mut m = machine(&[0xe001, SLEEP]);
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);

    m.write(BASE, 0xe003, MemOp::uw()); // mov #3, r0
    m.cpu.pc = BASE;
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    assert_eq!(m.cpu.r[0], 3);
}

#[test]
fn sr_read_after_sett_in_the_same_block() {
    let m = run(&[
        0x0002, // stc sr, r0
        0x0018, // sett
        0x0102, // stc sr, r1
        SLEEP,
    ]);
    assert_eq!(m.cpu.r[0] & 1, 0);
    assert_eq!(m.cpu.r[1], m.cpu.r[0] | 1);
}

#[test]
fn sleep_in_bra_slot_wakes_at_target() {
    let m = run(&[0xa008, SLEEP]); // bra +0x14
    assert_eq!(m.cpu.pc, BASE + 0x14);
}

#[test]
fn sleep_in_bts_slot_follows_t() {
    let words = [0x8d03, SLEEP]; // bt/s +0x0a
    let taken = run_with(&words, |m| m.cpu.t = 1);
    assert_eq!(taken.cpu.pc, BASE + 0x0a);
    let not_taken = run_with(&words, |m| m.cpu.t = 0);
    assert_eq!(not_taken.cpu.pc, BASE + 4);
}
