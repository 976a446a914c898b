//! Cache controller: operand cache RAM, store queues and the cache/MMU
//! control registers.
//!
//! Neither cache is simulated. The operand cache only exists as the 8 KB
//! RAM exposed when CCR.ORA is set, and the address/data arrays read as
//! zero. Instruction cache invalidation is forwarded to the block cache,
//! which is what keeps translated code coherent with guest writes.

use sh4jit_core::{CodeInvalidator, GuestMemory, MemOp};
use tracing::{info, trace, warn};

use crate::regs::{Ccr, Mmucr};

/// Operand cache RAM size (two 4 KB halves).
pub const CACHE_SIZE: usize = 0x2000;
/// Store queue area, P4 0xe0000000-0xe3ffffff.
pub const SQ_BASE: u32 = 0xe000_0000;
pub const SQ_END: u32 = 0xe400_0000;
/// Bytes written back by one store queue flush.
pub const SQ_BYTES: u32 = 32;
/// Store queue remap entries kept from the UTLB.
pub const SQ_MAP_ENTRIES: usize = 64;

/// Offset into the operand cache RAM for `addr`.
///
/// Bit 25 (OIX) or bit 13 selects the 4 KB half; the low 12 bits index
/// into it.
pub fn cache_offset(addr: u32, oix: bool) -> usize {
    let half = if oix {
        (addr & 0x0200_0000) >> 13
    } else {
        (addr & 0x2000) >> 1
    };
    (half | (addr & 0xfff)) as usize
}

pub fn is_sq_addr(addr: u32) -> bool {
    (SQ_BASE..SQ_END).contains(&addr)
}

fn sq_index(addr: u32) -> usize {
    ((addr & 0x20) >> 5) as usize
}

fn sq_word(addr: u32) -> usize {
    ((addr & 0x1c) >> 2) as usize
}

pub struct Ccn {
    pub ccr: Ccr,
    pub mmucr: Mmucr,
    pub qacr: [u32; 2],
    pub pteh: u32,
    pub ptel: u32,
    cache: Box<[u8; CACHE_SIZE]>,
    sq: [[u32; 8]; 2],
    /// Physical address bits 28:20 for each 1 MB of the SQ area, filled by
    /// LDTLB and used while MMUCR.AT is set.
    sq_map: [u32; SQ_MAP_ENTRIES],
}

impl Ccn {
    pub fn new() -> Self {
        Self {
            ccr: Ccr::empty(),
            mmucr: Mmucr::empty(),
            qacr: [0; 2],
            pteh: 0,
            ptel: 0,
            cache: Box::new([0; CACHE_SIZE]),
            sq: [[0; 8]; 2],
            sq_map: [0; SQ_MAP_ENTRIES],
        }
    }

    /// Power-on reset. Every translated block is dropped.
    pub fn reset(&mut self, inv: &mut dyn CodeInvalidator) {
        info!("ccn reset");
        self.ccr = Ccr::empty();
        self.mmucr = Mmucr::empty();
        self.qacr = [0; 2];
        self.pteh = 0;
        self.ptel = 0;
        self.sq = [[0; 8]; 2];
        self.sq_map = [0; SQ_MAP_ENTRIES];
        inv.invalidate_all();
    }

    // ── Control registers ──

    /// CCR write. ICI drops all translated code and, like OCI, is cleared
    /// in the stored value.
    pub fn write_ccr(&mut self, val: u32, inv: &mut dyn CodeInvalidator) {
        let mut ccr = Ccr::from_bits_retain(val);
        if ccr.contains(Ccr::ICI) {
            info!("instruction cache invalidate");
            inv.invalidate_all();
        }
        ccr.remove(Ccr::ICI | Ccr::OCI);
        self.ccr = ccr;
    }

    pub fn write_mmucr(&mut self, val: u32) {
        let mmucr = Mmucr::from_bits_retain(val);
        if mmucr.contains(Mmucr::AT) {
            warn!("MMU not fully supported");
        }
        self.mmucr = mmucr;
    }

    /// QACR write. The whole value reads back; only bits 4:2 take part
    /// in store queue addressing.
    pub fn write_qacr(&mut self, n: usize, val: u32) {
        self.qacr[n & 1] = val;
    }

    /// LDTLB: load PTEH/PTEL into the UTLB. Only the store queue remap is
    /// kept.
    pub fn load_tlb(&mut self) {
        let vpn = self.pteh & 0xffff_fc00;
        if is_sq_addr(vpn) {
            let idx = ((vpn >> 20) & 0x3f) as usize;
            self.sq_map[idx] = self.ptel & 0x1ff0_0000;
            trace!(
                vpn = format_args!("{vpn:#010x}"),
                ppn = format_args!("{:#010x}", self.sq_map[idx]),
                "sq remap"
            );
        }
    }

    // ── Operand cache RAM ──

    pub fn cache_read(&self, addr: u32, memop: MemOp) -> u32 {
        debug_assert!(self.ccr.contains(Ccr::ORA), "cache RAM read with ORA clear");
        let off = cache_offset(addr, self.ccr.contains(Ccr::OIX));
        let n = memop.size_bytes() as usize;
        let mut raw = 0u32;
        for i in 0..n {
            let b = self.cache[(off + i) % CACHE_SIZE];
            raw |= u32::from(b) << (8 * i);
        }
        raw
    }

    pub fn cache_write(&mut self, addr: u32, val: u32, memop: MemOp) {
        debug_assert!(self.ccr.contains(Ccr::ORA), "cache RAM write with ORA clear");
        let off = cache_offset(addr, self.ccr.contains(Ccr::OIX));
        let n = memop.size_bytes() as usize;
        for i in 0..n {
            self.cache[(off + i) % CACHE_SIZE] = (val >> (8 * i)) as u8;
        }
    }

    // ── Store queues ──

    pub fn sq_read(&self, addr: u32) -> u32 {
        self.sq[sq_index(addr)][sq_word(addr)]
    }

    pub fn sq_write(&mut self, addr: u32, val: u32) {
        self.sq[sq_index(addr)][sq_word(addr)] = val;
    }

    /// External address a store queue flush of `addr` writes to.
    pub fn sq_dest(&self, addr: u32) -> u32 {
        if self.mmucr.contains(Mmucr::AT) {
            self.sq_map[((addr >> 20) & 0x3f) as usize] | (addr & 0x000f_ffe0)
        } else {
            let qacr = self.qacr[sq_index(addr)];
            ((qacr & 0x1c) << 24) | (addr & 0x03ff_ffe0)
        }
    }

    /// PREF on the store queue area: write the selected queue out.
    pub fn sq_prefetch(&self, addr: u32, mem: &mut dyn GuestMemory) {
        debug_assert!(is_sq_addr(addr));
        let dst = self.sq_dest(addr);
        trace!(
            addr = format_args!("{addr:#010x}"),
            dst = format_args!("{dst:#010x}"),
            "sq flush"
        );
        for (i, &word) in self.sq[sq_index(addr)].iter().enumerate() {
            mem.write(dst.wrapping_add(4 * i as u32), word, MemOp::ul());
        }
    }

    // ── Cache arrays ──

    pub fn icache_read(&self, addr: u32) -> u32 {
        trace!(addr = format_args!("{addr:#010x}"), "icache array read");
        0
    }

    pub fn icache_write(&mut self, addr: u32, val: u32) {
        trace!(
            addr = format_args!("{addr:#010x}"),
            val = format_args!("{val:#x}"),
            "icache array write ignored"
        );
    }

    pub fn ocache_read(&self, addr: u32) -> u32 {
        trace!(addr = format_args!("{addr:#010x}"), "ocache array read");
        0
    }

    pub fn ocache_write(&mut self, addr: u32, val: u32) {
        trace!(
            addr = format_args!("{addr:#010x}"),
            val = format_args!("{val:#x}"),
            "ocache array write ignored"
        );
    }
}

impl Default for Ccn {
    fn default() -> Self {
        Self::new()
    }
}
