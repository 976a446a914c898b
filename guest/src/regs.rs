//! Cache and MMU control registers.

use bitflags::bitflags;

// P4 control register addresses.
pub const PTEH_ADDR: u32 = 0xff00_0000;
pub const PTEL_ADDR: u32 = 0xff00_0004;
pub const MMUCR_ADDR: u32 = 0xff00_0010;
pub const CCR_ADDR: u32 = 0xff00_001c;
pub const QACR0_ADDR: u32 = 0xff00_0038;
pub const QACR1_ADDR: u32 = 0xff00_003c;

bitflags! {
    /// Cache control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ccr: u32 {
        /// Operand cache enable.
        const OCE = 1 << 0;
        /// Write-through for P0/U0/P3.
        const WT = 1 << 1;
        /// Copy-back for P1.
        const CB = 1 << 2;
        /// Operand cache invalidate; reads back as zero.
        const OCI = 1 << 3;
        /// Half of the operand cache mapped as RAM at 0x7c000000.
        const ORA = 1 << 5;
        /// Operand cache index mode.
        const OIX = 1 << 7;
        /// Instruction cache enable.
        const ICE = 1 << 8;
        /// Instruction cache invalidate; reads back as zero.
        const ICI = 1 << 11;
        /// Instruction cache index mode.
        const IIX = 1 << 15;
        const EMODE = 1 << 31;
    }
}

bitflags! {
    /// MMU control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mmucr: u32 {
        /// Address translation enable.
        const AT = 1 << 0;
        /// TLB invalidate.
        const TI = 1 << 2;
        /// Single virtual memory mode.
        const SV = 1 << 8;
        /// Store queue access restricted to privileged mode.
        const SQMD = 1 << 9;
    }
}
