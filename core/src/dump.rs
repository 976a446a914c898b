//! IR dump: human-readable text output for a block's ops.

use std::fmt::Write as FmtWrite;
use std::io::Write;

use crate::context::Context;
use crate::opcode::Opcode;
use crate::types::{Cond, MemOp};
use crate::value::Value;

fn cond_name(c: u32) -> &'static str {
    Cond::from_u32(c).map_or("???", Cond::name)
}

/// Format a value reference for display.
fn fmt_value(ctx: &Context, v: Value, buf: &mut String) {
    match ctx.const_val(v) {
        Some(c) => {
            let _ = write!(buf, "$0x{c:x}");
        }
        None => {
            let i = v.0;
            let _ = write!(buf, "v{i}");
        }
    }
}

fn default_reg_name(reg: u32) -> String {
    format!("g{reg}")
}

/// Dump all IR ops in `ctx` to the given writer, naming guest registers
/// `g<n>`.
pub fn dump_ops(ctx: &Context, w: &mut impl Write) -> std::io::Result<()> {
    dump_ops_with(ctx, w, default_reg_name, |_, _| Ok(()))
}

/// Dump IR ops with a guest register namer and an annotation callback for
/// `insn_start`.
///
/// `insn_anno` is called at each guest instruction boundary with
/// `(pc, writer)`; use it to print disassembly on the `---- 0x...` header
/// line.
pub fn dump_ops_with(
    ctx: &Context,
    w: &mut impl Write,
    reg_name: impl Fn(u32) -> String,
    insn_anno: impl Fn(u32, &mut dyn Write) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let mut buf = String::with_capacity(128);

    for op in ctx.ops() {
        buf.clear();
        let cargs = op.cargs();
        match op.opc {
            Opcode::InsnStart => {
                let pc = cargs[0].0;
                write!(w, " ---- 0x{pc:08x}")?;
                insn_anno(pc, w)?;
                writeln!(w)?;
                continue;
            }
            Opcode::SetLabel => {
                let label_id = cargs[0].0;
                writeln!(w, " L{label_id}:")?;
                continue;
            }
            Opcode::Nop => continue,
            _ => {}
        }

        let name = op.opc.def().name;
        let _ = write!(buf, " {name}");

        let mut first = true;
        for &a in op.oargs().iter().chain(op.iargs()) {
            buf.push_str(if first { " " } else { ", " });
            first = false;
            fmt_value(ctx, a, &mut buf);
        }

        // Constant args, per opcode
        let sep = if first { " " } else { ", " };
        match op.opc {
            Opcode::ReadReg | Opcode::WriteReg => {
                let _ = write!(buf, "{sep}{}", reg_name(cargs[0].0));
            }
            Opcode::SetCond | Opcode::MovCond => {
                let _ = write!(buf, "{sep}{}", cond_name(cargs[0].0));
            }
            Opcode::BrCond => {
                let cond = cond_name(cargs[0].0);
                let label = cargs[1].0;
                let _ = write!(buf, "{sep}{cond}, L{label}");
            }
            Opcode::Br => {
                let label = cargs[0].0;
                let _ = write!(buf, "{sep}L{label}");
            }
            Opcode::Load | Opcode::Store => {
                let memop = MemOp::new(cargs[0].0 as u16);
                let _ = write!(buf, "{sep}{}", memop.name());
            }
            Opcode::Call => {
                let helper = cargs[0].0;
                let flags = cargs[1].0;
                let _ = write!(buf, "{sep}helper{helper}, $0x{flags:x}");
            }
            Opcode::GotoTb => {
                let target = cargs[0].0;
                let _ = write!(buf, "{sep}0x{target:08x}");
            }
            Opcode::BrCondTb => {
                let cond = cond_name(cargs[0].0);
                let taken = cargs[1].0;
                let not_taken = cargs[2].0;
                let _ = write!(buf, "{sep}{cond}, 0x{taken:08x}, 0x{not_taken:08x}");
            }
            _ => {
                for (i, &c) in cargs.iter().enumerate() {
                    let s = if i == 0 { sep } else { ", " };
                    let v = c.0;
                    let _ = write!(buf, "{s}$0x{v:x}");
                }
            }
        }

        writeln!(w, "{buf}")?;
    }
    Ok(())
}
