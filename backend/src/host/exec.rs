//! Interpreter for the portable host instruction stream.

use sh4jit_core::{Cond, GuestEnv, MemOp, TbExit};

use super::emitter::*;
use crate::error::BackendError;

/// Bounds-checked cursor over a block's code.
struct Cursor<'a> {
    code: &'a [u8],
    pos: usize,
    /// Offset of the instruction being decoded, for error reports.
    insn: usize,
}

impl<'a> Cursor<'a> {
    fn corrupt(&self) -> BackendError {
        BackendError::Corrupt { offset: self.insn }
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], BackendError> {
        let end = self.pos + N;
        let s = self.code.get(self.pos..end).ok_or_else(|| self.corrupt())?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(s);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, BackendError> {
        Ok(self.bytes::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, BackendError> {
        Ok(u16::from_le_bytes(self.bytes()?))
    }

    fn u32(&mut self) -> Result<u32, BackendError> {
        Ok(u32::from_le_bytes(self.bytes()?))
    }

    fn cond(&mut self) -> Result<Cond, BackendError> {
        let raw = self.u8()?;
        Cond::from_u32(raw as u32).ok_or_else(|| self.corrupt())
    }

    /// Apply a displacement relative to the current position.
    fn jump(&mut self, disp: i64) -> Result<(), BackendError> {
        let target = self.pos as i64 + disp;
        if target < 0 || target as usize >= self.code.len() {
            return Err(self.corrupt());
        }
        self.pos = target as usize;
        Ok(())
    }
}

/// Value frame of one block activation.
struct Frame {
    slots: Vec<u32>,
}

impl Frame {
    fn get(&self, cur: &Cursor<'_>, s: Slot) -> Result<u32, BackendError> {
        self.slots.get(s as usize).copied().ok_or_else(|| cur.corrupt())
    }

    fn set(&mut self, cur: &Cursor<'_>, s: Slot, v: u32) -> Result<(), BackendError> {
        let slot = self.slots.get_mut(s as usize).ok_or_else(|| cur.corrupt())?;
        *slot = v;
        Ok(())
    }
}

/// Run the block whose code starts at `entry` until it leaves.
pub fn run_block(code: &[u8], entry: usize, env: &mut dyn GuestEnv) -> Result<TbExit, BackendError> {
    let mut cur = Cursor {
        code,
        pos: entry,
        insn: entry,
    };
    if cur.u8()? != OPC_ENTER {
        return Err(cur.corrupt());
    }
    let nslots = cur.u16()? as usize;
    let mut f = Frame {
        slots: vec![0; nslots],
    };

    loop {
        cur.insn = cur.pos;
        match cur.u8()? {
            OPC_NOP => {}
            OPC_MOVI => {
                let d = cur.u16()?;
                let imm = cur.u32()?;
                f.set(&cur, d, imm)?;
            }
            OPC_RDREG => {
                let d = cur.u16()?;
                let reg = cur.u16()?;
                let v = env.read_reg(reg as u32);
                f.set(&cur, d, v)?;
            }
            OPC_WRREG => {
                let (reg, src) = (cur.u16()?, cur.u16()?);
                let v = f.get(&cur, src)?;
                env.write_reg(reg as u32, v);
            }
            OPC_ALU => {
                let op = AluOp::from_u8(cur.u8()?).ok_or_else(|| cur.corrupt())?;
                let (d, a, b) = (cur.u16()?, cur.u16()?, cur.u16()?);
                let v = op.eval(f.get(&cur, a)?, f.get(&cur, b)?);
                f.set(&cur, d, v)?;
            }
            OPC_UNARY => {
                let op = UnaryOp::from_u8(cur.u8()?).ok_or_else(|| cur.corrupt())?;
                let (d, a) = (cur.u16()?, cur.u16()?);
                let v = op.eval(f.get(&cur, a)?);
                f.set(&cur, d, v)?;
            }
            OPC_SETC => {
                let cond = cur.cond()?;
                let (d, a, b) = (cur.u16()?, cur.u16()?, cur.u16()?);
                let v = cond.eval(f.get(&cur, a)?, f.get(&cur, b)?) as u32;
                f.set(&cur, d, v)?;
            }
            OPC_MOVC => {
                let cond = cur.cond()?;
                let d = cur.u16()?;
                let (c1, c2, v1, v2) = (cur.u16()?, cur.u16()?, cur.u16()?, cur.u16()?);
                let v = if cond.eval(f.get(&cur, c1)?, f.get(&cur, c2)?) {
                    f.get(&cur, v1)?
                } else {
                    f.get(&cur, v2)?
                };
                f.set(&cur, d, v)?;
            }
            OPC_LD => {
                let memop = MemOp::new(cur.u8()? as u16);
                let (d, a) = (cur.u16()?, cur.u16()?);
                let v = env.load(f.get(&cur, a)?, memop);
                f.set(&cur, d, v)?;
            }
            OPC_ST => {
                let memop = MemOp::new(cur.u8()? as u16);
                let (a, v) = (cur.u16()?, cur.u16()?);
                env.store(f.get(&cur, a)?, f.get(&cur, v)?, memop);
            }
            OPC_CALL => {
                let helper = cur.u32()?;
                let d = cur.u16()?;
                let mut args = [0u32; 3];
                for a in &mut args {
                    let s = cur.u16()?;
                    *a = f.get(&cur, s)?;
                }
                let v = env.call_helper(helper, args);
                f.set(&cur, d, v)?;
            }
            OPC_JMP_SHORT => {
                let disp = cur.u8()? as i8 as i64;
                cur.jump(disp)?;
            }
            OPC_JMP_NEAR => {
                let disp = cur.u32()? as i32 as i64;
                cur.jump(disp)?;
            }
            op @ (OPC_JCC_SHORT | OPC_JCC_NEAR) => {
                let cond = cur.cond()?;
                let (a, b) = (cur.u16()?, cur.u16()?);
                let disp = if op == OPC_JCC_SHORT {
                    cur.u8()? as i8 as i64
                } else {
                    cur.u32()? as i32 as i64
                };
                if cond.eval(f.get(&cur, a)?, f.get(&cur, b)?) {
                    cur.jump(disp)?;
                }
            }
            OPC_GOTO_TB => {
                let slot = cur.u8()? as usize;
                let pc = cur.u32()?;
                env.set_pc(pc);
                return Ok(TbExit::Chain(slot));
            }
            OPC_GOTO_PTR => {
                let src = cur.u16()?;
                let pc = f.get(&cur, src)?;
                env.set_pc(pc);
                return Ok(TbExit::Lookup);
            }
            OPC_EXIT => {
                let code = cur.u32()?;
                return Ok(TbExit::Exit(code));
            }
            _ => return Err(cur.corrupt()),
        }
    }
}
