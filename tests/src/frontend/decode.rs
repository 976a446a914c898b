use proptest::prelude::*;
use sh4jit_frontend::sh4::decode::*;

#[test]
fn decode_is_total() {
    for raw in 0..=u16::MAX {
        let instr = decode(raw);
        assert!((instr.op as usize) < NUM_SH4_OPS);
        assert_eq!(instr.raw, raw);
        if instr.op != Sh4Op::Invalid {
            assert!(instr.op.desc().matches(raw), "{raw:#06x} -> {:?}", instr.op);
        }
    }
}

#[test]
fn descriptor_table_is_dense() {
    for (i, desc) in SH4_OPS.iter().enumerate() {
        assert_eq!(desc.op as usize, i);
        assert_eq!(Sh4Op::from_index(i), Some(desc.op));
    }
    assert_eq!(Sh4Op::from_index(NUM_SH4_OPS), None);
}

#[test]
fn every_class_is_reachable() {
    for desc in SH4_OPS.iter().skip(1) {
        assert_eq!(sh4_get_op(desc.key), desc.op, "{}", desc.name);
    }
}

#[test]
fn decode_known_opcodes() {
    assert_eq!(decode(0x0009).op, Sh4Op::Nop);
    assert_eq!(decode(0x001b).op, Sh4Op::Sleep);
    assert_eq!(decode(0x000b).op, Sh4Op::Rts);
    assert_eq!(decode(0x002b).op, Sh4Op::Rte);

    let mov = decode(0xe00a);
    assert_eq!(mov.op, Sh4Op::MovImm);
    assert_eq!(mov.n, 0);
    assert_eq!(mov.simm8(), 10);

    let add = decode(0x310c);
    assert_eq!(add.op, Sh4Op::Add);
    assert_eq!((add.n, add.m), (1, 0));

    let bf = decode(0x8bfc);
    assert_eq!(bf.op, Sh4Op::Bf);
    assert_eq!(bf.branch_target8(0x8c01_0008), 0x8c01_0004);

    let bra = decode(0xaffe);
    assert_eq!(bra.op, Sh4Op::Bra);
    assert_eq!(bra.branch_target12(0x1000), 0x1000);

    let bank = decode(0x4f8e);
    assert_eq!(bank.op, Sh4Op::LdcBank);
    assert_eq!(bank.bank(), 0);
}

#[test]
fn fpu_and_mac_decode_as_invalid() {
    // fadd fr0, fr1 / fmov.s / mac.l / mac.w
    for raw in [0xf100u16, 0xf10c, 0x010f, 0x410f, 0xffff] {
        assert_eq!(decode(raw).op, Sh4Op::Invalid, "{raw:#06x}");
    }
}

#[test]
fn flags_describe_branches() {
    assert!(Sh4Op::Bra.flags().contains(Sh4Flags::BRANCH | Sh4Flags::DELAYED));
    assert!(Sh4Op::Bt.flags().contains(Sh4Flags::BRANCH));
    assert!(!Sh4Op::Bt.flags().contains(Sh4Flags::DELAYED));
    assert!(Sh4Op::Rte.flags().contains(Sh4Flags::PRIV));
    assert!(Sh4Op::Trapa.flags().contains(Sh4Flags::SLOT_ILLEGAL));
    assert!(Sh4Op::MovlLoad.flags().contains(Sh4Flags::LOAD));
    assert!(Sh4Op::MovlStore.flags().contains(Sh4Flags::STORE));
}

#[test]
fn pcrel_operands() {
    let movl = decode(0xdf03);
    assert_eq!(movl.op, Sh4Op::MovlPcrel);
    assert_eq!(movl.pcrel_long(0x8c01_0000), 0x8c01_0010);
    assert_eq!(movl.pcrel_long(0x8c01_0002), 0x8c01_0010);

    let movw = decode(0x9203);
    assert_eq!(movw.op, Sh4Op::MovwPcrel);
    assert_eq!(movw.pcrel_word(0x8c01_0102), 0x8c01_010c);
}

proptest! {
    #[test]
    fn at_most_one_class_matches(raw in any::<u16>()) {
        let hits = SH4_OPS.iter().filter(|d| d.matches(raw)).count();
        let op = sh4_get_op(raw);
        if op == Sh4Op::Invalid {
            prop_assert_eq!(hits, 0);
        } else {
            prop_assert_eq!(hits, 1);
        }
    }

    #[test]
    fn fields_come_from_fixed_bit_positions(raw in any::<u16>()) {
        let i = decode(raw);
        prop_assert_eq!(u16::from(i.n), (raw >> 8) & 0xf);
        prop_assert_eq!(u16::from(i.m), (raw >> 4) & 0xf);
        prop_assert_eq!(u16::from(i.imm8), raw & 0xff);
        prop_assert_eq!(i.disp12, raw & 0xfff);
    }
}
