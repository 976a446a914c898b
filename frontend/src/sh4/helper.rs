//! Runtime helpers called from translated code.
//!
//! Helpers that only touch CPU state run here; the rest (cache and TLB
//! maintenance) need the memory system and are left to the machine.

use super::cpu::{Sh4Cpu, SR_M, SR_Q};

/// Helper ids carried by `call` ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Sh4Helper {
    /// args: expevt, faulting pc
    RaiseException = 0,
    /// args: imm, pc of the next instruction
    Trapa,
    /// args: Rn, Rm; returns the new Rn
    Div1,
    /// args: address
    Pref,
    /// args: address
    Ocbi,
    /// args: address
    Ocbp,
    /// args: address
    Ocbwb,
    Ldtlb,
}

impl Sh4Helper {
    pub const ALL: [Sh4Helper; 8] = [
        Sh4Helper::RaiseException,
        Sh4Helper::Trapa,
        Sh4Helper::Div1,
        Sh4Helper::Pref,
        Sh4Helper::Ocbi,
        Sh4Helper::Ocbp,
        Sh4Helper::Ocbwb,
        Sh4Helper::Ldtlb,
    ];

    pub fn from_u32(id: u32) -> Option<Sh4Helper> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Sh4Helper::RaiseException => "raise_exception",
            Sh4Helper::Trapa => "trapa",
            Sh4Helper::Div1 => "div1",
            Sh4Helper::Pref => "pref",
            Sh4Helper::Ocbi => "ocbi",
            Sh4Helper::Ocbp => "ocbp",
            Sh4Helper::Ocbwb => "ocbwb",
            Sh4Helper::Ldtlb => "ldtlb",
        }
    }
}

/// Run a CPU-only helper. Returns `None` when the helper needs the memory
/// system.
pub fn call_cpu_helper(
    cpu: &mut Sh4Cpu,
    helper: Sh4Helper,
    args: [u32; 3],
) -> Option<u32> {
    match helper {
        Sh4Helper::RaiseException => {
            cpu.raise_exception(args[0], args[1]);
            Some(0)
        }
        Sh4Helper::Trapa => {
            cpu.trapa(args[0], args[1]);
            Some(0)
        }
        Sh4Helper::Div1 => Some(helper_div1(cpu, args[0], args[1])),
        Sh4Helper::Pref
        | Sh4Helper::Ocbi
        | Sh4Helper::Ocbp
        | Sh4Helper::Ocbwb
        | Sh4Helper::Ldtlb => None,
    }
}

/// One step of the non-restoring division; updates Q and T.
pub fn helper_div1(cpu: &mut Sh4Cpu, rn: u32, rm: u32) -> u32 {
    let sr = cpu.sr();
    let old_q = sr & SR_Q != 0;
    let m = sr & SR_M != 0;
    let mut q = rn & 0x8000_0000 != 0;

    let shifted = (rn << 1) | (cpu.t & 1);
    let (res, carry) = if old_q == m {
        let res = shifted.wrapping_sub(rm);
        (res, res > shifted)
    } else {
        let res = shifted.wrapping_add(rm);
        (res, res < shifted)
    };
    // Q flips when the carry out disagrees with M.
    q = if m { q == carry } else { q != carry };

    let mut new_sr = sr & !(SR_Q | 1);
    if q {
        new_sr |= SR_Q;
    }
    if q == m {
        new_sr |= 1;
    }
    cpu.set_sr(new_sr);
    res
}
