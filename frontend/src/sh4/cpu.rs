//! SH4 CPU architectural state.

/// Number of general-purpose registers (R0-R15).
pub const NUM_GPRS: usize = 16;
/// Number of banked registers (R0_BANK-R7_BANK).
pub const NUM_BANKED: usize = 8;

// Register ids used by `read_reg`/`write_reg` in the IR.
pub const REG_SR: u32 = 16;
pub const REG_GBR: u32 = 17;
pub const REG_VBR: u32 = 18;
pub const REG_SSR: u32 = 19;
pub const REG_SPC: u32 = 20;
pub const REG_SGR: u32 = 21;
pub const REG_DBR: u32 = 22;
pub const REG_MACH: u32 = 23;
pub const REG_MACL: u32 = 24;
pub const REG_PR: u32 = 25;
pub const REG_PC: u32 = 26;
pub const REG_T: u32 = 27;
/// First id of the inactive register bank, `REG_BANK0 + i` names Ri_BANK.
pub const REG_BANK0: u32 = 28;
/// Number of register ids.
pub const NUM_REGS: usize = REG_BANK0 as usize + NUM_BANKED;

// SR bits.
pub const SR_T: u32 = 1 << 0;
pub const SR_S: u32 = 1 << 1;
pub const SR_IMASK: u32 = 0xf << 4;
pub const SR_Q: u32 = 1 << 8;
pub const SR_M: u32 = 1 << 9;
pub const SR_FD: u32 = 1 << 15;
pub const SR_BL: u32 = 1 << 28;
pub const SR_RB: u32 = 1 << 29;
pub const SR_MD: u32 = 1 << 30;
/// Writable SR bits.
pub const SR_MASK: u32 = 0x7000_83f3;

/// Block flag: translated with SR.MD = 1.
pub const TB_FLAG_MD: u32 = 1 << 0;

// Exception event codes.
pub const EXPEVT_RESET: u32 = 0x000;
pub const EXPEVT_TRAPA: u32 = 0x160;
pub const EXPEVT_ILLEGAL: u32 = 0x180;
pub const EXPEVT_SLOT_ILLEGAL: u32 = 0x1a0;

/// Reset vector (P2, uncached).
pub const RESET_PC: u32 = 0xa000_0000;

/// Register names in id order.
pub const REG_NAMES: [&str; NUM_REGS] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10",
    "r11", "r12", "r13", "r14", "r15", "sr", "gbr", "vbr", "ssr", "spc",
    "sgr", "dbr", "mach", "macl", "pr", "pc", "t", "r0_bank", "r1_bank",
    "r2_bank", "r3_bank", "r4_bank", "r5_bank", "r6_bank", "r7_bank",
];

/// SH4 CPU architectural state.
///
/// `r[0..8]` always hold the bank selected by SR.MD/RB; `r_bank` holds the
/// other one. T lives outside `sr` and is merged on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sh4Cpu {
    pub r: [u32; NUM_GPRS],
    pub r_bank: [u32; NUM_BANKED],
    sr: u32,
    pub t: u32,
    pub gbr: u32,
    pub vbr: u32,
    pub ssr: u32,
    pub spc: u32,
    pub sgr: u32,
    pub dbr: u32,
    pub mach: u32,
    pub macl: u32,
    pub pr: u32,
    pub pc: u32,
    pub expevt: u32,
    pub tra: u32,
}

impl Sh4Cpu {
    pub fn new() -> Self {
        let mut cpu = Self {
            r: [0; NUM_GPRS],
            r_bank: [0; NUM_BANKED],
            sr: 0,
            t: 0,
            gbr: 0,
            vbr: 0,
            ssr: 0,
            spc: 0,
            sgr: 0,
            dbr: 0,
            mach: 0,
            macl: 0,
            pr: 0,
            pc: RESET_PC,
            expevt: EXPEVT_RESET,
            tra: 0,
        };
        cpu.sr = SR_MD | SR_RB | SR_BL | SR_IMASK;
        cpu
    }

    /// Full SR value including T.
    pub fn sr(&self) -> u32 {
        self.sr | (self.t & 1)
    }

    /// Write SR, swapping register banks when the selected bank changes.
    pub fn set_sr(&mut self, val: u32) {
        let val = val & SR_MASK;
        let old_bank = Self::bank_of(self.sr);
        self.sr = val & !SR_T;
        self.t = val & SR_T;
        if Self::bank_of(self.sr) != old_bank {
            for i in 0..NUM_BANKED {
                std::mem::swap(&mut self.r[i], &mut self.r_bank[i]);
            }
        }
    }

    fn bank_of(sr: u32) -> bool {
        sr & SR_MD != 0 && sr & SR_RB != 0
    }

    pub fn md(&self) -> bool {
        self.sr & SR_MD != 0
    }

    /// Flags the translation of a block depends on.
    pub fn tb_flags(&self) -> u32 {
        if self.md() {
            TB_FLAG_MD
        } else {
            0
        }
    }

    pub fn read_reg(&self, reg: u32) -> u32 {
        match reg {
            0..=15 => self.r[reg as usize],
            REG_SR => self.sr(),
            REG_GBR => self.gbr,
            REG_VBR => self.vbr,
            REG_SSR => self.ssr,
            REG_SPC => self.spc,
            REG_SGR => self.sgr,
            REG_DBR => self.dbr,
            REG_MACH => self.mach,
            REG_MACL => self.macl,
            REG_PR => self.pr,
            REG_PC => self.pc,
            REG_T => self.t,
            _ => {
                let i = (reg - REG_BANK0) as usize;
                debug_assert!(i < NUM_BANKED, "bad register id {reg}");
                self.r_bank[i & 7]
            }
        }
    }

    pub fn write_reg(&mut self, reg: u32, val: u32) {
        match reg {
            0..=15 => self.r[reg as usize] = val,
            REG_SR => self.set_sr(val),
            REG_GBR => self.gbr = val,
            REG_VBR => self.vbr = val,
            REG_SSR => self.ssr = val,
            REG_SPC => self.spc = val,
            REG_SGR => self.sgr = val,
            REG_DBR => self.dbr = val,
            REG_MACH => self.mach = val,
            REG_MACL => self.macl = val,
            REG_PR => self.pr = val,
            REG_PC => self.pc = val,
            REG_T => self.t = val & 1,
            _ => {
                let i = (reg - REG_BANK0) as usize;
                debug_assert!(i < NUM_BANKED, "bad register id {reg}");
                self.r_bank[i & 7] = val;
            }
        }
    }

    /// Enter the general exception handler.
    ///
    /// `pc` is the address saved in SPC: the faulting instruction, or the
    /// delayed branch for slot exceptions.
    pub fn raise_exception(&mut self, expevt: u32, pc: u32) {
        self.expevt = expevt;
        self.spc = pc;
        self.ssr = self.sr();
        self.sgr = self.r[15];
        self.set_sr(self.sr() | SR_MD | SR_RB | SR_BL);
        self.pc = self.vbr.wrapping_add(0x100);
    }

    /// TRAPA #imm; `next_pc` is the address of the following instruction.
    pub fn trapa(&mut self, imm: u32, next_pc: u32) {
        self.tra = (imm & 0xff) << 2;
        self.raise_exception(EXPEVT_TRAPA, next_pc);
    }
}

impl Default for Sh4Cpu {
    fn default() -> Self {
        Self::new()
    }
}
