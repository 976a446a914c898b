//! SH4 disassembler driven by the descriptor templates.
//!
//! Template escapes:
//! `%n`/`%m` register fields, `%k` bank index, `%s` signed imm8,
//! `%x` unsigned imm8, `%b`/`%w`/`%l` disp4 scaled by 1/2/4,
//! `%1`/`%2`/`%4` disp8 scaled by 1/2/4, `%j`/`%J` 8/12-bit branch target,
//! `%W`/`%L` PC-relative word/long operand address, `%r` raw opcode.

use std::fmt::Write;

use super::decode::{decode, Sh4Instr};

/// Disassemble one instruction located at `pc`.
pub fn disas(pc: u32, raw: u16) -> String {
    disas_instr(pc, &decode(raw))
}

pub fn disas_instr(pc: u32, instr: &Sh4Instr) -> String {
    let fmt = instr.op.desc().fmt;
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            break;
        };
        let _ = match esc {
            'n' => write!(out, "{}", instr.n),
            'm' => write!(out, "{}", instr.m),
            'k' => write!(out, "{}", instr.bank()),
            's' => write!(out, "{}", instr.simm8()),
            'x' => write!(out, "0x{:02x}", instr.imm8),
            'b' => write!(out, "{}", instr.disp4),
            'w' => write!(out, "{}", instr.disp4 as u32 * 2),
            'l' => write!(out, "{}", instr.disp4 as u32 * 4),
            '1' => write!(out, "{}", instr.imm8),
            '2' => write!(out, "{}", instr.imm8 as u32 * 2),
            '4' => write!(out, "{}", instr.imm8 as u32 * 4),
            'j' => write!(out, "0x{:08x}", instr.branch_target8(pc)),
            'J' => write!(out, "0x{:08x}", instr.branch_target12(pc)),
            'W' => write!(out, "0x{:08x}", instr.pcrel_word(pc)),
            'L' => write!(out, "0x{:08x}", instr.pcrel_long(pc)),
            'r' => write!(out, "0x{:04x}", instr.raw),
            other => write!(out, "%{other}"),
        };
    }
    out
}
