//! SH4 frontend: translation of SH4 integer code into IR.

pub mod cpu;
pub mod decode;
pub mod disas;
pub mod helper;
mod trans;

use std::marker::PhantomData;

use crate::{translator_loop, DisasContextBase, DisasJumpType, TranslatorOps};
use cpu::NUM_REGS;
use decode::{decode, Sh4Flags};
use sh4jit_core::tb::TARGET_PAGE_MASK;
use sh4jit_core::{Context, GuestMemory};

pub use trans::{TranslateFn, SH4_TRANSLATORS};

// ---------------------------------------------------------------
// Disassembly context
// ---------------------------------------------------------------

/// SH4 disassembly context (extends `DisasContextBase`).
pub struct Sh4DisasContext<'a> {
    /// Generic base fields (pc, is_jmp, counters).
    pub base: DisasContextBase,
    /// Block flags (`cpu::TB_FLAG_*`) the code is translated under.
    pub flags: u32,
    /// Set when the current instruction also translated its delay slot.
    pub slot_consumed: bool,
    /// Whether the block ends in a guest control transfer.
    pub ends_in_branch: bool,
    /// The delay slot just translated was SLEEP; the branch resumes at
    /// its target on wake-up.
    pub slot_sleep: bool,
    mem: &'a mut dyn GuestMemory,
}

impl<'a> Sh4DisasContext<'a> {
    /// Create a new context for translating a block starting at `pc`.
    pub fn new(
        pc: u32,
        flags: u32,
        max_insns: u32,
        mem: &'a mut dyn GuestMemory,
    ) -> Self {
        Self {
            base: DisasContextBase::new(pc, max_insns),
            flags,
            slot_consumed: false,
            ends_in_branch: false,
            slot_sleep: false,
            mem,
        }
    }

    pub fn fetch(&mut self, addr: u32) -> u16 {
        self.mem.fetch16(addr)
    }

    pub fn privileged(&self) -> bool {
        self.flags & cpu::TB_FLAG_MD != 0
    }

    /// Translate the delay slot of the branch at `branch_addr`.
    ///
    /// Returns `false` when the slot instruction closed the block itself
    /// (it raised an exception), in which case the branch emits nothing
    /// further.
    pub fn translate_delay_slot(&mut self, ir: &mut Context, branch_addr: u32) -> bool {
        let slot_addr = branch_addr.wrapping_add(2);
        let instr = decode(self.fetch(slot_addr));
        ir.gen_insn_start(slot_addr);
        self.base.num_insns += 1;
        self.slot_consumed = true;
        self.slot_sleep = false;
        trans::dispatch(self, ir, slot_addr, instr, true);
        !ir.is_closed()
    }
}

// ---------------------------------------------------------------
// TranslatorOps implementation
// ---------------------------------------------------------------

/// Marker type for the SH4 translator.
pub struct Sh4Translator<'a>(PhantomData<&'a ()>);

impl<'a> TranslatorOps for Sh4Translator<'a> {
    type DisasContext = Sh4DisasContext<'a>;

    fn init_disas_context(ctx: &mut Sh4DisasContext<'a>, ir: &mut Context) {
        debug_assert!(ir.nb_guest_regs() >= NUM_REGS);
        ir.pc_first = ctx.base.pc_first;
    }

    fn tb_start(_ctx: &mut Sh4DisasContext<'a>, _ir: &mut Context) {}

    fn insn_start(ctx: &mut Sh4DisasContext<'a>, ir: &mut Context) {
        ir.gen_insn_start(ctx.base.pc_next);
        ctx.base.num_insns += 1;
    }

    fn translate_insn(ctx: &mut Sh4DisasContext<'a>, ir: &mut Context) {
        let addr = ctx.base.pc_next;
        let instr = decode(ctx.fetch(addr));
        ctx.slot_consumed = false;

        trans::dispatch(ctx, ir, addr, instr, false);

        let len = if ctx.slot_consumed { 4 } else { 2 };
        ctx.base.pc_next = addr.wrapping_add(len);
        if ctx.base.is_jmp == DisasJumpType::Next
            && instr.op.flags().contains(Sh4Flags::ENDS_BLOCK)
        {
            ctx.base.is_jmp = DisasJumpType::Stop;
        }
        // Blocks never start a new guest page.
        if ctx.base.is_jmp == DisasJumpType::Next
            && (ctx.base.pc_next ^ ctx.base.pc_first) & TARGET_PAGE_MASK != 0
        {
            ctx.base.is_jmp = DisasJumpType::TooMany;
        }
    }

    fn tb_stop(ctx: &mut Sh4DisasContext<'a>, ir: &mut Context) {
        match ctx.base.is_jmp {
            DisasJumpType::NoReturn => {
                // Block already terminated by the instruction.
            }
            DisasJumpType::Next | DisasJumpType::TooMany | DisasJumpType::Stop => {
                ir.gen_goto_tb(ctx.base.pc_next);
            }
        }
    }

    fn base<'b>(ctx: &'b Sh4DisasContext<'a>) -> &'b DisasContextBase {
        &ctx.base
    }

    fn base_mut<'b>(ctx: &'b mut Sh4DisasContext<'a>) -> &'b mut DisasContextBase {
        &mut ctx.base
    }
}

/// Summary of a translated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Guest bytes covered, delay slots included.
    pub size: u32,
    pub icount: u32,
    pub ends_in_branch: bool,
}

/// Translate the block at `pc` into `ir`, which is reset first.
pub fn gen_block(
    ir: &mut Context,
    mem: &mut dyn GuestMemory,
    pc: u32,
    flags: u32,
    max_insns: u32,
) -> BlockInfo {
    ir.reset();
    let mut ctx = Sh4DisasContext::new(pc, flags, max_insns.max(1), mem);
    translator_loop::<Sh4Translator<'_>>(&mut ctx, ir);
    BlockInfo {
        size: ctx.base.pc_next.wrapping_sub(pc),
        icount: ctx.base.num_insns,
        ends_in_branch: ctx.ends_in_branch,
    }
}
