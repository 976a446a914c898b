//! Host instruction encoder.
//!
//! The portable host target is a compact byte stream. Control-flow
//! opcodes borrow the x86 encodings (`EB`/`E9` jumps, `90` nop) so the
//! short/near selection and displacement arithmetic match the familiar
//! form: displacements are signed and relative to the end of the jump.
//! Frame slots are little-endian `u16`, immediates little-endian `u32`.

use sh4jit_core::{Cond, Label, RelocKind};

use crate::error::BackendError;

// -- Opcode bytes --

pub const OPC_NOP: u8 = 0x90;
pub const OPC_JMP_SHORT: u8 = 0xEB;
pub const OPC_JMP_NEAR: u8 = 0xE9;
/// `cond:u8 a:u16 b:u16 rel8`
pub const OPC_JCC_SHORT: u8 = 0x72;
/// `cond:u8 a:u16 b:u16 rel32`
pub const OPC_JCC_NEAR: u8 = 0x73;
/// `nslots:u16`; first instruction of every block.
pub const OPC_ENTER: u8 = 0xC8;
/// `dst:u16 imm:u32`
pub const OPC_MOVI: u8 = 0xB8;
/// `dst:u16 reg:u16`
pub const OPC_RDREG: u8 = 0x8B;
/// `reg:u16 src:u16`
pub const OPC_WRREG: u8 = 0x89;
/// `op:u8 dst:u16 a:u16 b:u16`
pub const OPC_ALU: u8 = 0x01;
/// `op:u8 dst:u16 a:u16`
pub const OPC_UNARY: u8 = 0xF7;
/// `cond:u8 dst:u16 a:u16 b:u16`
pub const OPC_SETC: u8 = 0x0F;
/// `cond:u8 dst:u16 c1:u16 c2:u16 v1:u16 v2:u16`
pub const OPC_MOVC: u8 = 0x4F;
/// `memop:u8 dst:u16 addr:u16`
pub const OPC_LD: u8 = 0x8A;
/// `memop:u8 addr:u16 val:u16`
pub const OPC_ST: u8 = 0x88;
/// `helper:u32 dst:u16 a0:u16 a1:u16 a2:u16`
pub const OPC_CALL: u8 = 0xE8;
/// `slot:u8 pc:u32`
pub const OPC_GOTO_TB: u8 = 0xC2;
/// `src:u16`
pub const OPC_GOTO_PTR: u8 = 0xFF;
/// `code:u32`
pub const OPC_EXIT: u8 = 0xC3;

/// Binary ALU operations carried by [`OPC_ALU`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AluOp {
    Add = 0,
    Sub,
    Mul,
    MulSH,
    MulUH,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Sar,
    RotL,
    RotR,
}

impl AluOp {
    pub fn from_u8(raw: u8) -> Option<AluOp> {
        use AluOp::*;
        const ALL: [AluOp; 13] = [Add, Sub, Mul, MulSH, MulUH, And, Or, Xor, Shl, Shr, Sar, RotL, RotR];
        ALL.get(raw as usize).copied()
    }

    pub fn eval(self, a: u32, b: u32) -> u32 {
        match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::MulSH => ((a as i32 as i64 * b as i32 as i64) >> 32) as u32,
            AluOp::MulUH => ((a as u64 * b as u64) >> 32) as u32,
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::Shl => a.wrapping_shl(b & 31),
            AluOp::Shr => a.wrapping_shr(b & 31),
            AluOp::Sar => ((a as i32) >> (b & 31)) as u32,
            AluOp::RotL => a.rotate_left(b & 31),
            AluOp::RotR => a.rotate_right(b & 31),
        }
    }
}

/// Unary operations carried by [`OPC_UNARY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnaryOp {
    Neg = 0,
    Not,
    ExtS8,
    ExtS16,
    ExtU8,
    ExtU16,
    Bswap16,
}

impl UnaryOp {
    pub fn from_u8(raw: u8) -> Option<UnaryOp> {
        use UnaryOp::*;
        const ALL: [UnaryOp; 7] = [Neg, Not, ExtS8, ExtS16, ExtU8, ExtU16, Bswap16];
        ALL.get(raw as usize).copied()
    }

    pub fn eval(self, a: u32) -> u32 {
        match self {
            UnaryOp::Neg => a.wrapping_neg(),
            UnaryOp::Not => !a,
            UnaryOp::ExtS8 => a as u8 as i8 as i32 as u32,
            UnaryOp::ExtS16 => a as u16 as i16 as i32 as u32,
            UnaryOp::ExtU8 => a & 0xff,
            UnaryOp::ExtU16 => a & 0xffff,
            UnaryOp::Bswap16 => (a & 0xffff_0000) | ((a & 0xff) << 8) | ((a >> 8) & 0xff),
        }
    }
}

/// Frame slot index.
pub type Slot = u16;

/// Block-local assembler with its own label arena.
///
/// Code goes to a private vector; label displacements are resolved in a
/// second pass by [`finish`](Self::finish), after which the bytes can be
/// copied anywhere.
pub struct Emitter {
    code: Vec<u8>,
    labels: Vec<Label>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            labels: Vec::new(),
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    // -- Labels --

    pub fn new_label(&mut self) -> u32 {
        let id = self.labels.len() as u32;
        self.labels.push(Label::new(id));
        id
    }

    /// Place `label` at the current offset.
    pub fn bind(&mut self, label: u32) {
        let off = self.code.len();
        let l = &mut self.labels[label as usize];
        debug_assert!(!l.has_value, "label L{label} bound twice");
        l.set_value(off);
    }

    pub fn label(&self, label: u32) -> &Label {
        &self.labels[label as usize]
    }

    // -- Raw emission --

    #[inline]
    pub fn emit_u8(&mut self, v: u8) {
        self.code.push(v);
    }

    #[inline]
    pub fn emit_u16(&mut self, v: u16) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn emit_u32(&mut self, v: u32) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    pub fn emit_nops(&mut self, n: usize) {
        self.code.resize(self.code.len() + n, OPC_NOP);
    }

    // -- Instructions --

    pub fn enter(&mut self, nslots: Slot) {
        self.emit_u8(OPC_ENTER);
        self.emit_u16(nslots);
    }

    pub fn movi(&mut self, dst: Slot, imm: u32) {
        self.emit_u8(OPC_MOVI);
        self.emit_u16(dst);
        self.emit_u32(imm);
    }

    pub fn rdreg(&mut self, dst: Slot, reg: u16) {
        self.emit_u8(OPC_RDREG);
        self.emit_u16(dst);
        self.emit_u16(reg);
    }

    pub fn wrreg(&mut self, reg: u16, src: Slot) {
        self.emit_u8(OPC_WRREG);
        self.emit_u16(reg);
        self.emit_u16(src);
    }

    pub fn alu(&mut self, op: AluOp, dst: Slot, a: Slot, b: Slot) {
        self.emit_u8(OPC_ALU);
        self.emit_u8(op as u8);
        self.emit_u16(dst);
        self.emit_u16(a);
        self.emit_u16(b);
    }

    pub fn unary(&mut self, op: UnaryOp, dst: Slot, a: Slot) {
        self.emit_u8(OPC_UNARY);
        self.emit_u8(op as u8);
        self.emit_u16(dst);
        self.emit_u16(a);
    }

    pub fn setc(&mut self, cond: Cond, dst: Slot, a: Slot, b: Slot) {
        self.emit_u8(OPC_SETC);
        self.emit_u8(cond as u8);
        self.emit_u16(dst);
        self.emit_u16(a);
        self.emit_u16(b);
    }

    pub fn movc(&mut self, cond: Cond, dst: Slot, c: [Slot; 2], v: [Slot; 2]) {
        self.emit_u8(OPC_MOVC);
        self.emit_u8(cond as u8);
        self.emit_u16(dst);
        self.emit_u16(c[0]);
        self.emit_u16(c[1]);
        self.emit_u16(v[0]);
        self.emit_u16(v[1]);
    }

    pub fn ld(&mut self, memop: u8, dst: Slot, addr: Slot) {
        self.emit_u8(OPC_LD);
        self.emit_u8(memop);
        self.emit_u16(dst);
        self.emit_u16(addr);
    }

    pub fn st(&mut self, memop: u8, addr: Slot, val: Slot) {
        self.emit_u8(OPC_ST);
        self.emit_u8(memop);
        self.emit_u16(addr);
        self.emit_u16(val);
    }

    pub fn call(&mut self, helper: u32, dst: Slot, args: [Slot; 3]) {
        self.emit_u8(OPC_CALL);
        self.emit_u32(helper);
        self.emit_u16(dst);
        for a in args {
            self.emit_u16(a);
        }
    }

    pub fn goto_tb(&mut self, slot: u8, pc: u32) {
        self.emit_u8(OPC_GOTO_TB);
        self.emit_u8(slot);
        self.emit_u32(pc);
    }

    pub fn goto_ptr(&mut self, src: Slot) {
        self.emit_u8(OPC_GOTO_PTR);
        self.emit_u16(src);
    }

    pub fn exit(&mut self, code: u32) {
        self.emit_u8(OPC_EXIT);
        self.emit_u32(code);
    }

    /// Unconditional jump to `label`.
    ///
    /// A bound (backward) label gets the shortest encoding that reaches
    /// it. An unbound (forward) label gets a near jump unless `short` is
    /// set, in which case [`finish`](Self::finish) fails if the target
    /// ends up out of rel8 range.
    pub fn jmp(&mut self, label: u32, short: bool) {
        self.emit_branch(label, short, &[OPC_JMP_SHORT], &[OPC_JMP_NEAR]);
    }

    /// Jump to `label` when `a cond b`.
    pub fn jcc(&mut self, cond: Cond, a: Slot, b: Slot, label: u32, short: bool) {
        let mut head = [0u8; 6];
        head[1] = cond as u8;
        head[2..4].copy_from_slice(&a.to_le_bytes());
        head[4..6].copy_from_slice(&b.to_le_bytes());
        let mut near = head;
        head[0] = OPC_JCC_SHORT;
        near[0] = OPC_JCC_NEAR;
        self.emit_branch(label, short, &head, &near);
    }

    fn emit_branch(&mut self, label: u32, short: bool, short_head: &[u8], near_head: &[u8]) {
        let start = self.code.len();
        let l = &self.labels[label as usize];
        if l.has_value {
            let target = l.value as i64;
            let disp8 = target - (start + short_head.len() + 1) as i64;
            if i8::try_from(disp8).is_ok() {
                self.code.extend_from_slice(short_head);
                self.emit_u8(disp8 as i8 as u8);
            } else {
                let disp32 = target - (start + near_head.len() + 4) as i64;
                self.code.extend_from_slice(near_head);
                self.emit_u32(disp32 as i32 as u32);
            }
            return;
        }
        let (head, kind) = if short {
            (short_head, RelocKind::Rel8)
        } else {
            (near_head, RelocKind::Rel32)
        };
        self.code.extend_from_slice(head);
        let at = self.code.len();
        self.labels[label as usize].add_use(at, kind);
        self.code.resize(at + kind.size(), 0);
    }

    /// Resolve every pending label use and return the finished code.
    pub fn finish(mut self) -> Result<Vec<u8>, BackendError> {
        for l in &self.labels {
            if l.has_pending_uses() {
                return Err(BackendError::UnboundLabel(l.id));
            }
            for u in &l.uses {
                let end = u.offset + u.kind.size();
                let disp = l.value as i64 - end as i64;
                match u.kind {
                    RelocKind::Rel8 => {
                        let d = i8::try_from(disp)
                            .map_err(|_| BackendError::LabelOutOfRange { label: l.id, disp })?;
                        self.code[u.offset] = d as u8;
                    }
                    RelocKind::Rel32 => {
                        let d = i32::try_from(disp)
                            .map_err(|_| BackendError::LabelOutOfRange { label: l.id, disp })?;
                        self.code[u.offset..end].copy_from_slice(&d.to_le_bytes());
                    }
                }
            }
        }
        Ok(self.code)
    }
}
