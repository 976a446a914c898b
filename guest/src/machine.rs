//! An SH4 CPU wired to RAM and the cache controller, runnable by the
//! execution engine.

use sh4jit_core::tb::TARGET_PAGE_SIZE;
use sh4jit_core::{CodeInvalidator, Context, GuestEnv, GuestMemory, MemOp};
use sh4jit_exec::{GuestBlock, GuestCpu, Invalidation};
use sh4jit_frontend::sh4::cpu::Sh4Cpu;
use sh4jit_frontend::sh4::gen_block;
use sh4jit_frontend::sh4::helper::{call_cpu_helper, Sh4Helper};
use tracing::{debug, trace, warn};

use crate::bus::Bus;
use crate::ccn::{is_sq_addr, Ccn};
use crate::regs::{
    Ccr, CCR_ADDR, MMUCR_ADDR, PTEH_ADDR, PTEL_ADDR, QACR0_ADDR, QACR1_ADDR,
};

/// Machine construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Physical base address of system RAM.
    pub ram_base: u32,
    pub ram_size: usize,
    /// PC after reset.
    pub entry_pc: u32,
    /// SR after reset; the architectural reset value when `None`.
    pub sr: Option<u32>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_base: 0x0c00_0000,
            ram_size: 16 << 20,
            entry_pc: 0x8c01_0000,
            sr: None,
        }
    }
}

/// Invalidations raised by guest activity, drained by the execution loop.
#[derive(Debug, Default)]
struct InvalidationQueue(Vec<Invalidation>);

impl CodeInvalidator for InvalidationQueue {
    fn invalidate_range(&mut self, start: u32, end: u32) {
        self.0.push(Invalidation::Range { start, end });
    }

    fn invalidate_all(&mut self) {
        self.0.push(Invalidation::All);
    }
}

fn queue_code_pages(queue: &mut InvalidationQueue, pages: Vec<u32>) {
    for page in pages {
        trace!(page = format_args!("{page:#010x}"), "write to code page");
        queue.invalidate_range(page, page.wrapping_add(TARGET_PAGE_SIZE));
    }
}

/// Store to RAM, queueing the guest pages it dirtied.
fn store_ram(bus: &mut Bus, queue: &mut InvalidationQueue, addr: u32, val: u32, memop: MemOp) {
    if let Some(pages) = bus.write(addr, val, memop) {
        queue_code_pages(queue, pages);
    }
}

/// RAM view used for store queue write-back.
struct RamPort<'a> {
    bus: &'a mut Bus,
    queue: &'a mut InvalidationQueue,
}

impl GuestMemory for RamPort<'_> {
    fn read(&mut self, addr: u32, memop: MemOp) -> u32 {
        self.bus.read(addr, memop)
    }

    fn write(&mut self, addr: u32, val: u32, memop: MemOp) {
        store_ram(self.bus, self.queue, addr, val, memop);
    }
}

fn zero_extend(val: u32, memop: MemOp) -> u32 {
    MemOp::new(memop.size()).extend(val)
}

pub struct Sh4Machine {
    pub cpu: Sh4Cpu,
    pub bus: Bus,
    pub ccn: Ccn,
    queue: InvalidationQueue,
}

impl Sh4Machine {
    /// Build a machine in its reset state. The CCN reset queues an
    /// `Invalidation::All`.
    pub fn new(config: &MachineConfig) -> Self {
        let mut m = Self {
            cpu: Sh4Cpu::new(),
            bus: Bus::new(config.ram_base, config.ram_size),
            ccn: Ccn::new(),
            queue: InvalidationQueue::default(),
        };
        m.ccn.reset(&mut m.queue);
        m.cpu.pc = config.entry_pc;
        if let Some(sr) = config.sr {
            m.cpu.set_sr(sr);
        }
        m
    }

    /// Copy a program image into RAM. Returns false when it does not fit.
    ///
    /// Code translated from the overwritten pages is queued for
    /// invalidation under every alias it was translated through.
    pub fn load_image(&mut self, addr: u32, bytes: &[u8]) -> bool {
        if !self.bus.load(addr, bytes) {
            return false;
        }
        let pages = self.bus.take_code_pages(addr, bytes.len());
        queue_code_pages(&mut self.queue, pages);
        debug!(
            addr = format_args!("{addr:#010x}"),
            len = bytes.len(),
            "loaded image"
        );
        true
    }

    /// Invalidations queued so far, without draining them.
    pub fn pending_invalidations(&self) -> &[Invalidation] {
        &self.queue.0
    }

    /// Bus read; the result is zero-extended.
    pub fn read(&mut self, addr: u32, memop: MemOp) -> u32 {
        let val = match addr {
            a if is_sq_addr(a) => self.ccn.sq_read(a),
            0x7c00_0000..=0x7fff_ffff if self.ccn.ccr.contains(Ccr::ORA) => {
                self.ccn.cache_read(addr, memop)
            }
            0xf000_0000..=0xf3ff_ffff => self.ccn.icache_read(addr),
            0xf400_0000..=0xf7ff_ffff => self.ccn.ocache_read(addr),
            0xff00_0000..=0xffff_ffff => self.read_control(addr),
            _ => self.bus.read(addr, memop),
        };
        zero_extend(val, memop)
    }

    pub fn write(&mut self, addr: u32, val: u32, memop: MemOp) {
        let val = zero_extend(val, memop);
        match addr {
            a if is_sq_addr(a) => self.ccn.sq_write(a, val),
            0x7c00_0000..=0x7fff_ffff if self.ccn.ccr.contains(Ccr::ORA) => {
                self.ccn.cache_write(addr, val, memop)
            }
            0xf000_0000..=0xf3ff_ffff => self.ccn.icache_write(addr, val),
            0xf400_0000..=0xf7ff_ffff => self.ccn.ocache_write(addr, val),
            0xff00_0000..=0xffff_ffff => self.write_control(addr, val),
            _ => store_ram(&mut self.bus, &mut self.queue, addr, val, memop),
        }
    }

    fn read_control(&self, addr: u32) -> u32 {
        match addr {
            PTEH_ADDR => self.ccn.pteh,
            PTEL_ADDR => self.ccn.ptel,
            MMUCR_ADDR => self.ccn.mmucr.bits(),
            CCR_ADDR => self.ccn.ccr.bits(),
            QACR0_ADDR => self.ccn.qacr[0],
            QACR1_ADDR => self.ccn.qacr[1],
            _ => {
                trace!(addr = format_args!("{addr:#010x}"), "unhandled p4 read");
                0
            }
        }
    }

    fn write_control(&mut self, addr: u32, val: u32) {
        match addr {
            PTEH_ADDR => self.ccn.pteh = val,
            PTEL_ADDR => self.ccn.ptel = val,
            MMUCR_ADDR => self.ccn.write_mmucr(val),
            CCR_ADDR => {
                self.ccn.write_ccr(val, &mut self.queue);
                if Ccr::from_bits_retain(val).contains(Ccr::ICI) {
                    self.bus.clear_code_pages();
                }
            }
            QACR0_ADDR => self.ccn.write_qacr(0, val),
            QACR1_ADDR => self.ccn.write_qacr(1, val),
            _ => trace!(
                addr = format_args!("{addr:#010x}"),
                val = format_args!("{val:#x}"),
                "unhandled p4 write"
            ),
        }
    }

    fn memory_helper(&mut self, helper: Sh4Helper, args: [u32; 3]) {
        match helper {
            Sh4Helper::Pref if is_sq_addr(args[0]) => {
                let Self { ccn, bus, queue, .. } = self;
                ccn.sq_prefetch(args[0], &mut RamPort { bus, queue });
            }
            Sh4Helper::Ldtlb => self.ccn.load_tlb(),
            // No operand cache to maintain.
            _ => {}
        }
    }
}

impl GuestEnv for Sh4Machine {
    fn read_reg(&mut self, reg: u32) -> u32 {
        self.cpu.read_reg(reg)
    }

    fn write_reg(&mut self, reg: u32, val: u32) {
        self.cpu.write_reg(reg, val);
    }

    fn load(&mut self, addr: u32, memop: MemOp) -> u32 {
        memop.extend(self.read(addr, memop))
    }

    fn store(&mut self, addr: u32, val: u32, memop: MemOp) {
        self.write(addr, val, memop);
    }

    fn call_helper(&mut self, helper: u32, args: [u32; 3]) -> u32 {
        let Some(h) = Sh4Helper::from_u32(helper) else {
            warn!(helper, "unknown helper");
            return 0;
        };
        if let Some(ret) = call_cpu_helper(&mut self.cpu, h, args) {
            return ret;
        }
        self.memory_helper(h, args);
        0
    }

    fn set_pc(&mut self, pc: u32) {
        self.cpu.pc = pc;
    }
}

impl GuestMemory for Sh4Machine {
    fn read(&mut self, addr: u32, memop: MemOp) -> u32 {
        Sh4Machine::read(self, addr, memop)
    }

    fn write(&mut self, addr: u32, val: u32, memop: MemOp) {
        Sh4Machine::write(self, addr, val, memop);
    }
}

impl GuestCpu for Sh4Machine {
    fn pc(&self) -> u32 {
        self.cpu.pc
    }

    fn flags(&self) -> u32 {
        self.cpu.tb_flags()
    }

    fn gen_code(&mut self, ir: &mut Context, pc: u32, flags: u32, max_insns: u32) -> GuestBlock {
        let info = gen_block(ir, &mut self.bus, pc, flags, max_insns);
        self.bus.mark_code(pc, info.size);
        GuestBlock {
            size: info.size,
            icount: info.icount,
            ends_in_branch: info.ends_in_branch,
        }
    }

    fn take_invalidations(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.queue.0)
    }
}
