use std::collections::HashSet;

use sh4jit_core::{Context, Opcode, CALL_NO_REG_ACCESS};

fn count(ir: &Context, opc: Opcode) -> usize {
    ir.ops().iter().filter(|op| op.opc == opc).count()
}

#[test]
fn consts_are_deduplicated() {
    let mut ir = Context::new();
    let a = ir.new_const(0x1234);
    let b = ir.gen_movi(0x1234);
    let c = ir.new_const(0x5678);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(ir.const_val(a), Some(0x1234));
    assert_eq!(ir.num_ops(), 0);
}

#[test]
fn reg_reads_are_cached() {
    let mut ir = Context::new();
    let a = ir.read_reg(3);
    let b = ir.read_reg(3);
    assert_eq!(a, b);
    assert_eq!(count(&ir, Opcode::ReadReg), 1);
}

#[test]
fn reg_write_feeds_later_reads() {
    let mut ir = Context::new();
    let one = ir.new_const(1);
    let r = ir.read_reg(2);
    let sum = ir.gen_add(r, one);
    ir.write_reg(2, sum);
    assert_eq!(ir.read_reg(2), sum);
    assert_eq!(count(&ir, Opcode::ReadReg), 1);
}

#[test]
fn label_drops_reg_cache() {
    let mut ir = Context::new();
    let l = ir.new_label();
    let a = ir.read_reg(5);
    ir.gen_set_label(l);
    let b = ir.read_reg(5);
    assert_ne!(a, b);
    assert_eq!(count(&ir, Opcode::ReadReg), 2);
    assert!(ir.label(l).present);
}

#[test]
fn call_drops_reg_cache_unless_told_not_to() {
    let mut ir = Context::new();
    let a = ir.read_reg(1);
    ir.gen_call(7, &[a], CALL_NO_REG_ACCESS);
    assert_eq!(ir.read_reg(1), a);

    ir.gen_call(7, &[a], 0);
    assert_ne!(ir.read_reg(1), a);
}

#[test]
fn call_arg_layout() {
    let mut ir = Context::new();
    let x = ir.read_reg(0);
    let ret = ir.gen_call(9, &[x], CALL_NO_REG_ACCESS);
    let op = ir.ops().last().unwrap();
    assert_eq!(op.opc, Opcode::Call);
    assert_eq!(op.oargs(), &[ret]);
    assert_eq!(op.iargs().len(), 3);
    assert_eq!(op.iargs()[0], x);
    assert_eq!(op.cargs()[0].0, 9);
    assert_eq!(op.cargs()[1].0, CALL_NO_REG_ACCESS);
}

#[test]
fn every_value_has_one_producer() {
    let mut ir = Context::new();
    let a = ir.read_reg(0);
    let b = ir.read_reg(1);
    let s = ir.gen_add(a, b);
    let d = ir.gen_sub(s, a);
    let m = ir.gen_mul(d, s);
    ir.write_reg(2, m);
    ir.gen_goto_tb(0x1000);

    let mut seen = HashSet::new();
    for op in ir.ops() {
        for &v in op.oargs() {
            assert!(seen.insert(v), "value {v:?} produced twice");
        }
    }
    assert_eq!(seen.len(), 5);
}

#[test]
fn terminal_closes_block() {
    let mut ir = Context::new();
    assert!(!ir.is_closed());
    assert!(ir.terminal().is_none());
    let t = ir.read_reg(27);
    let z = ir.new_const(0);
    ir.gen_brcond_tb(sh4jit_core::Cond::Ne, t, z, 0x2000, 0x1004);
    assert!(ir.is_closed());
    assert_eq!(ir.terminal().map(|op| op.opc), Some(Opcode::BrCondTb));
}

#[test]
#[should_panic]
fn second_terminal_is_rejected() {
    let mut ir = Context::new();
    ir.gen_exit_tb(0);
    ir.gen_goto_tb(0x1000);
}

#[test]
fn reset_clears_block_state() {
    let mut ir = Context::new();
    ir.read_reg(4);
    ir.new_label();
    ir.gen_exit_tb(1);
    ir.reset();
    assert_eq!(ir.num_ops(), 0);
    assert_eq!(ir.nb_values(), 0);
    assert!(ir.labels().is_empty());
    assert!(!ir.is_closed());
    ir.read_reg(4);
    assert_eq!(count(&ir, Opcode::ReadReg), 1);
}
