//! Guest programs run end to end through translation, lowering and the
//! execution loop.

mod insns;
mod programs;
mod system;

use sh4jit_backend::PortableCodeGen;
use sh4jit_exec::{cpu_exec_loop, ExecEnv, ExitReason};
use sh4jit_guest::Sh4Machine;

use crate::util::{exec_env, machine};

const SLEEP: u16 = 0x001b;
const NOP: u16 = 0x0009;

/// Run until the next block exit code.
fn run_until_exit(env: &mut ExecEnv<PortableCodeGen>, m: &mut Sh4Machine) -> ExitReason {
    cpu_exec_loop(env, m).expect("execution failed")
}

/// Run `words` from the load address until SLEEP.
fn run(words: &[u16]) -> Sh4Machine {
    run_with(words, |_| {})
}

/// Like [`run`], with `setup` applied to the machine first.
fn run_with(words: &[u16], setup: impl FnOnce(&mut Sh4Machine)) -> Sh4Machine {
    let mut m = machine(words);
    setup(&mut m);
    let mut env = exec_env();
    assert_eq!(run_until_exit(&mut env, &mut m), ExitReason::Sleep);
    m
}

/// Program image with `tail` placed `offset` bytes after `head`.
fn layout(head: &[u16], offset: usize, tail: &[u16]) -> Vec<u16> {
    assert!(head.len() * 2 <= offset);
    let mut words = head.to_vec();
    words.resize(offset / 2, NOP);
    words.extend_from_slice(tail);
    words
}
