use sh4jit_core::dump::{dump_ops, dump_ops_with};
use sh4jit_core::Context;

fn render(ir: &Context) -> String {
    let mut out = Vec::new();
    dump_ops(ir, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn dump_basic_block() {
    let mut ir = Context::new();
    ir.gen_insn_start(0x8c01_0000);
    let r = ir.read_reg(3);
    let s = ir.gen_addi(r, 4);
    ir.write_reg(3, s);
    ir.gen_goto_tb(0x8c01_0002);

    let text = render(&ir);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], " ---- 0x8c010000");
    assert!(lines[1].starts_with(" read_reg v"));
    assert!(lines[1].ends_with(", g3"));
    assert!(lines.iter().any(|l| l.contains("$0x4")));
    assert_eq!(*lines.last().unwrap(), " goto_tb 0x8c010002");
}

#[test]
fn dump_annotates_insn_headers() {
    let mut ir = Context::new();
    ir.gen_insn_start(0x100);
    ir.gen_exit_tb(0);

    let mut out = Vec::new();
    dump_ops_with(
        &ir,
        &mut out,
        |r| format!("r{r}"),
        |pc, w| write!(w, "  insn@{pc:x}"),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(" ---- 0x00000100  insn@100\n"));
}

#[test]
fn dump_labels_and_branches() {
    let mut ir = Context::new();
    let l = ir.new_label();
    let a = ir.read_reg(0);
    let z = ir.new_const(0);
    ir.gen_brcond(sh4jit_core::Cond::Eq, a, z, l);
    ir.gen_set_label(l);
    ir.gen_exit_tb(0);

    let text = render(&ir);
    assert!(text.contains("brcond"));
    assert!(text.contains("eq, L0"));
    assert!(text.contains(" L0:"));
}
