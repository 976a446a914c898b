use sh4jit_core::types::*;

const ALL_CONDS: [Cond; 14] = [
    Cond::Never,
    Cond::Always,
    Cond::Eq,
    Cond::Ne,
    Cond::Lt,
    Cond::Ge,
    Cond::Le,
    Cond::Gt,
    Cond::Ltu,
    Cond::Geu,
    Cond::Leu,
    Cond::Gtu,
    Cond::TstEq,
    Cond::TstNe,
];

#[test]
fn cond_invert_is_involution() {
    for c in ALL_CONDS {
        assert_eq!(c.invert().invert(), c, "{c:?}");
    }
}

#[test]
fn cond_round_trips_through_u32() {
    for c in ALL_CONDS {
        assert_eq!(Cond::from_u32(c as u32), Some(c));
    }
    assert_eq!(Cond::from_u32(2), None);
}

#[test]
fn cond_eval() {
    assert!(Cond::Lt.eval(0xffff_ffff, 0));
    assert!(!Cond::Ltu.eval(0xffff_ffff, 0));
    assert!(Cond::TstEq.eval(0xf0, 0x0f));
    assert!(Cond::TstNe.eval(0xf1, 0x0f));
    for c in ALL_CONDS {
        for (a, b) in [(0, 0), (1, 2), (0x8000_0000, 1), (5, 0xffff_fffb)] {
            assert_eq!(c.invert().eval(a, b), !c.eval(a, b));
            assert_eq!(c.swap().eval(b, a), c.eval(a, b));
        }
    }
}

#[test]
fn memop_extend() {
    assert_eq!(MemOp::sb().extend(0x80), 0xffff_ff80);
    assert_eq!(MemOp::ub().extend(0x180), 0x80);
    assert_eq!(MemOp::sw().extend(0x8000), 0xffff_8000);
    assert_eq!(MemOp::uw().extend(0x1_8000), 0x8000);
    assert_eq!(MemOp::ul().extend(0xdead_beef), 0xdead_beef);
    assert_eq!(MemOp::ul().size_bytes(), 4);
    assert_eq!(MemOp::new(MemOp::sw().bits()), MemOp::sw());
}
