//! System RAM with tracking of pages that hold translated code.

use std::collections::HashMap;

use sh4jit_core::tb::{TARGET_PAGE_BITS, TARGET_PAGE_MASK, TARGET_PAGE_SIZE};
use sh4jit_core::{GuestMemory, MemOp};
use tracing::trace;

/// Physical address bits; P0-P3 alias the same 512 MB.
pub const PHYS_MASK: u32 = 0x1fff_ffff;

pub struct Bus {
    ram: Vec<u8>,
    base: u32,
    /// Physical code page -> guest page addresses it was translated under.
    code_pages: HashMap<u32, Vec<u32>>,
}

impl Bus {
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            ram: vec![0; size],
            base: base & PHYS_MASK,
            code_pages: HashMap::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.ram.len()
    }

    fn ram_offset(&self, addr: u32, len: u32) -> Option<usize> {
        let off = (addr & PHYS_MASK).checked_sub(self.base)? as usize;
        (off + len as usize <= self.ram.len()).then_some(off)
    }

    pub fn is_ram(&self, addr: u32) -> bool {
        self.ram_offset(addr, 1).is_some()
    }

    /// Copy `bytes` into RAM at `addr`. Returns false when the range does
    /// not fit.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> bool {
        match self.ram_offset(addr, bytes.len() as u32) {
            Some(off) => {
                self.ram[off..off + bytes.len()].copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    pub fn read(&self, addr: u32, memop: MemOp) -> u32 {
        let n = memop.size_bytes();
        let Some(off) = self.ram_offset(addr, n) else {
            trace!(addr = format_args!("{addr:#010x}"), "unmapped read");
            return 0;
        };
        let mut raw = 0u32;
        for i in 0..n as usize {
            raw |= u32::from(self.ram[off + i]) << (8 * i);
        }
        raw
    }

    /// Store to RAM. Returns the guest pages to invalidate when the write
    /// lands in a page holding translated code.
    pub fn write(&mut self, addr: u32, val: u32, memop: MemOp) -> Option<Vec<u32>> {
        let n = memop.size_bytes();
        let Some(off) = self.ram_offset(addr, n) else {
            trace!(addr = format_args!("{addr:#010x}"), "unmapped write");
            return None;
        };
        for i in 0..n as usize {
            self.ram[off + i] = (val >> (8 * i)) as u8;
        }
        let hit = self.take_code_pages(addr, n as usize);
        (!hit.is_empty()).then_some(hit)
    }

    /// Stop tracking the code pages backing `[addr, addr + len)` and
    /// return the guest pages they were translated under.
    pub fn take_code_pages(&mut self, addr: u32, len: usize) -> Vec<u32> {
        let mut hit = Vec::new();
        if len == 0 {
            return hit;
        }
        let first = Self::phys_page(addr);
        let last = Self::phys_page(addr.wrapping_add(len as u32 - 1));
        let mut page = first;
        loop {
            if let Some(vpages) = self.code_pages.remove(&page) {
                hit.extend(vpages);
            }
            if page == last {
                break;
            }
            page = (page + 1) & (PHYS_MASK >> TARGET_PAGE_BITS);
        }
        hit
    }

    fn phys_page(addr: u32) -> u32 {
        (addr & PHYS_MASK) >> TARGET_PAGE_BITS
    }

    /// Record that guest code in `[start, start + size)` was translated.
    pub fn mark_code(&mut self, start: u32, size: u32) {
        if size == 0 {
            return;
        }
        let mut page = start & TARGET_PAGE_MASK;
        let end = start.wrapping_add(size - 1) & TARGET_PAGE_MASK;
        loop {
            if self.is_ram(page) {
                let vpages = self.code_pages.entry(Self::phys_page(page)).or_default();
                if !vpages.contains(&page) {
                    vpages.push(page);
                }
            }
            if page == end {
                break;
            }
            page = page.wrapping_add(TARGET_PAGE_SIZE);
        }
    }

    pub fn is_code_page(&self, addr: u32) -> bool {
        self.code_pages.contains_key(&Self::phys_page(addr))
    }

    pub fn clear_code_pages(&mut self) {
        self.code_pages.clear();
    }
}

/// Plain RAM access for instruction fetch. Stores made this way bypass
/// code tracking.
impl GuestMemory for Bus {
    fn read(&mut self, addr: u32, memop: MemOp) -> u32 {
        Bus::read(self, addr, memop)
    }

    fn write(&mut self, addr: u32, val: u32, memop: MemOp) {
        let _ = Bus::write(self, addr, val, memop);
    }
}
