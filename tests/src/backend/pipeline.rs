use sh4jit_backend::liveness::liveness_analysis;
use sh4jit_backend::optimize::optimize;
use sh4jit_backend::regalloc::allocate_frame;
use sh4jit_backend::{BackendError, CodeBuffer, HostCodeGen, PortableCodeGen};
use sh4jit_core::{Cond, Context, MemOp, Opcode, TbExit};

use super::TestEnv;

fn live_count(ir: &Context, opc: Opcode) -> usize {
    ir.ops().iter().filter(|op| op.opc == opc).count()
}

fn run(ir: &mut Context, env: &mut TestEnv) -> TbExit {
    let mut backend = PortableCodeGen::new();
    let mut buf = CodeBuffer::new(256, 4096);
    let code = backend.compile(ir, &mut buf).unwrap();
    backend.execute(&buf, code.offset, env).unwrap()
}

#[test]
fn constants_fold_and_dead_code_goes() {
    let mut ir = Context::new();
    let a = ir.read_reg(1);
    let two = ir.new_const(2);
    let three = ir.new_const(3);
    let k = ir.gen_add(two, three);
    let t = ir.gen_add(a, k);
    let _unused = ir.gen_mul(a, a);
    ir.write_reg(2, t);
    ir.gen_goto_tb(0x1000);

    optimize(&mut ir);
    assert_eq!(live_count(&ir, Opcode::Add), 1);
    assert_eq!(live_count(&ir, Opcode::Mul), 0);
    let add = ir.ops().iter().find(|op| op.opc == Opcode::Add).unwrap();
    assert_eq!(ir.const_val(add.iargs()[1]), Some(5));
}

#[test]
fn constant_branch_becomes_unconditional() {
    let mut ir = Context::new();
    let l = ir.new_label();
    let one = ir.new_const(1);
    ir.gen_brcond(Cond::Eq, one, one, l);
    ir.gen_set_label(l);
    ir.gen_exit_tb(0);

    optimize(&mut ir);
    assert_eq!(live_count(&ir, Opcode::BrCond), 0);
    assert_eq!(live_count(&ir, Opcode::Br), 1);
}

#[test]
fn identities_alias_their_operand() {
    let mut ir = Context::new();
    let a = ir.read_reg(1);
    let x = ir.gen_xor(a, a);
    let o = ir.gen_ori(a, 0);
    ir.write_reg(2, x);
    ir.write_reg(3, o);
    ir.gen_goto_tb(0);

    optimize(&mut ir);
    assert_eq!(live_count(&ir, Opcode::Xor), 0);
    assert_eq!(live_count(&ir, Opcode::Or), 0);

    let mut env = TestEnv::default();
    env.regs[1] = 0xdead;
    run(&mut ir, &mut env);
    assert_eq!(env.regs[2], 0);
    assert_eq!(env.regs[3], 0xdead);
}

#[test]
fn slots_are_reused_after_last_use() {
    let mut ir = Context::new();
    let mut v = ir.read_reg(1);
    for _ in 0..50 {
        let w = ir.read_reg(2);
        v = ir.gen_add(v, w);
    }
    ir.write_reg(3, v);
    ir.gen_goto_tb(0);

    liveness_analysis(&mut ir);
    let frame = allocate_frame(&ir).unwrap();
    assert!(frame.nslots <= 3, "used {} slots", frame.nslots);
}

#[test]
fn arithmetic_and_memory() {
    let mut ir = Context::new();
    let r1 = ir.read_reg(1);
    let sum = ir.gen_addi(r1, 5);
    ir.write_reg(2, sum);
    let addr = ir.read_reg(3);
    ir.gen_store(MemOp::ul(), addr, sum);
    let neg = ir.gen_neg(sum);
    let off = ir.gen_addi(addr, 4);
    ir.gen_store(MemOp::uw(), off, neg);
    let back = ir.gen_load(MemOp::sw(), off);
    ir.write_reg(4, back);
    ir.gen_goto_tb(0x1000);

    let mut env = TestEnv::default();
    env.regs[1] = 10;
    env.regs[3] = 0x100;
    assert_eq!(run(&mut ir, &mut env), TbExit::Chain(0));
    assert_eq!(env.regs[2], 15);
    assert_eq!(env.mem[&0x100], 15);
    assert_eq!(env.mem.get(&0x106), None);
    assert_eq!(env.regs[4], (-15i32) as u32);
    assert_eq!(env.pc, Some(0x1000));
}

fn brcond_tb_block() -> Context {
    let mut ir = Context::new();
    let r0 = ir.read_reg(0);
    let zero = ir.new_const(0);
    ir.gen_brcond_tb(Cond::Eq, r0, zero, 0x2000, 0x3000);
    ir
}

#[test]
fn two_way_exit_selects_slot() {
    let mut env = TestEnv::default();
    assert_eq!(run(&mut brcond_tb_block(), &mut env), TbExit::Chain(0));
    assert_eq!(env.pc, Some(0x2000));

    env.regs[0] = 1;
    assert_eq!(run(&mut brcond_tb_block(), &mut env), TbExit::Chain(1));
    assert_eq!(env.pc, Some(0x3000));
}

fn skip_block() -> Context {
    let mut ir = Context::new();
    let l = ir.new_label();
    let r0 = ir.read_reg(0);
    let zero = ir.new_const(0);
    ir.gen_brcond(Cond::Eq, r0, zero, l);
    let one = ir.new_const(1);
    ir.write_reg(1, one);
    ir.gen_set_label(l);
    ir.gen_exit_tb(0x42);
    ir
}

#[test]
fn internal_branch_skips_code() {
    let mut env = TestEnv::default();
    assert_eq!(run(&mut skip_block(), &mut env), TbExit::Exit(0x42));
    assert_eq!(env.regs[1], 0);

    env.regs[0] = 9;
    assert_eq!(run(&mut skip_block(), &mut env), TbExit::Exit(0x42));
    assert_eq!(env.regs[1], 1);
    assert_eq!(env.pc, None);
}

#[test]
fn helper_call_and_dynamic_exit() {
    let mut ir = Context::new();
    let a = ir.read_reg(1);
    let b = ir.new_const(0x10);
    let ret = ir.gen_call(7, &[a, b], 0);
    ir.write_reg(5, ret);
    let target = ir.read_reg(6);
    ir.gen_goto_ptr(target);

    let mut env = TestEnv::default();
    env.regs[1] = 0x20;
    env.regs[6] = 0x8c00_0400;
    assert_eq!(run(&mut ir, &mut env), TbExit::Lookup);
    assert_eq!(env.calls, vec![(7, [0x20, 0x10, 0])]);
    assert_eq!(env.regs[5], 0x30);
    assert_eq!(env.pc, Some(0x8c00_0400));
}

#[test]
fn blocks_are_appended() {
    let mut backend = PortableCodeGen::new();
    let mut buf = CodeBuffer::new(256, 4096);
    let first = backend.compile(&mut brcond_tb_block(), &mut buf).unwrap();
    let second = backend.compile(&mut skip_block(), &mut buf).unwrap();
    assert_eq!(first.offset, 0);
    assert_eq!(second.offset, first.size);
    assert_eq!(buf.offset(), first.size + second.size);
    assert_eq!(backend.blocks_lowered, 2);

    // Both stay runnable from their own offsets.
    let mut env = TestEnv::default();
    assert_eq!(backend.execute(&buf, second.offset, &mut env), Ok(TbExit::Exit(0x42)));
    assert_eq!(backend.execute(&buf, first.offset, &mut env), Ok(TbExit::Chain(0)));
}

#[test]
fn full_buffer_leaves_nothing_behind() {
    let mut backend = PortableCodeGen::new();
    let mut buf = CodeBuffer::new(4, 4);
    let err = backend.compile(&mut skip_block(), &mut buf).unwrap_err();
    assert!(matches!(err, BackendError::BufferFull { .. }));
    assert_eq!(buf.offset(), 0);
}

#[test]
fn garbage_is_reported_not_run() {
    let backend = PortableCodeGen::new();
    let mut buf = CodeBuffer::new(16, 16);
    buf.emit_bytes(&[0x00, 0x01]).unwrap();
    let mut env = TestEnv::default();
    assert_eq!(
        backend.execute(&buf, 0, &mut env),
        Err(BackendError::Corrupt { offset: 0 })
    );
}
