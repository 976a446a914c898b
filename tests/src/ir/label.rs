use sh4jit_core::label::*;
use sh4jit_core::{Context, Opcode};

#[test]
fn fresh_label_is_unbound() {
    let l = Label::new(3);
    assert_eq!(l.id, 3);
    assert!(!l.present && !l.has_value);
    assert!(!l.has_pending_uses());
}

#[test]
fn uses_are_kept_until_bound() {
    let mut l = Label::new(1);
    l.add_use(0x40, RelocKind::Rel32);
    l.add_use(0x48, RelocKind::Rel8);
    assert_eq!(l.uses.len(), 2);
    assert_eq!(l.uses[1].kind, RelocKind::Rel8);
    assert!(l.has_pending_uses());

    l.set_value(0x80);
    assert!(l.present && l.has_value);
    assert_eq!(l.value, 0x80);
    assert!(!l.has_pending_uses());
}

#[test]
fn displacement_widths() {
    assert_eq!(RelocKind::Rel8.size(), 1);
    assert_eq!(RelocKind::Rel32.size(), 4);
}

#[test]
fn binding_a_label_forgets_cached_registers() {
    let mut ir = Context::new();
    let l = ir.new_label();
    ir.read_reg(1);
    ir.read_reg(1);
    ir.gen_set_label(l);
    ir.read_reg(1);
    let reads = ir.ops().iter().filter(|op| op.opc == Opcode::ReadReg).count();
    assert_eq!(reads, 2);
}
