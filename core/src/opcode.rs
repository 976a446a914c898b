/// IR opcodes.
///
/// All values are 32 bits wide; there are no type-polymorphic ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // -- Guest register access --
    ReadReg = 0,
    WriteReg,

    // -- Arithmetic --
    Add,
    Sub,
    Mul,
    MulSH, // signed multiply high
    MulUH, // unsigned multiply high
    Neg,

    // -- Logic --
    And,
    Or,
    Xor,
    Not,

    // -- Shift/rotate (amount taken modulo 32) --
    Shl,
    Shr,
    Sar,
    RotL,
    RotR,

    // -- Extension / byte swap --
    ExtS8,
    ExtS16,
    ExtU8,
    ExtU16,
    Bswap16, // swap the two low bytes, keep the high half

    // -- Compare --
    SetCond,
    MovCond,

    // -- Guest memory access --
    Load,
    Store,

    // -- Call-out to a runtime helper --
    Call,

    // -- Block-internal control flow --
    Br,
    BrCond,
    SetLabel,

    // -- Block terminals --
    GotoTb,   // static successor (chain slot 0)
    BrCondTb, // two static successors (chain slots 0/1)
    GotoPtr,  // successor computed at runtime
    ExitTb,   // return to the execution loop with a code

    // -- Misc --
    InsnStart,
    Nop,

    // Sentinel, must be last
    Count,
}

/// Flags describing properties of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpFlags(u16);

impl OpFlags {
    pub const NONE: OpFlags = OpFlags(0);
    /// Exits the translation block.
    pub const BB_EXIT: OpFlags = OpFlags(0x01);
    /// Ends a basic block (next op starts a new BB).
    pub const BB_END: OpFlags = OpFlags(0x02);
    /// May read or write any guest register.
    pub const CALL_CLOBBER: OpFlags = OpFlags(0x04);
    /// Has side effects; cannot be eliminated by DCE.
    pub const SIDE_EFFECTS: OpFlags = OpFlags(0x08);
    /// Not lowered to host code.
    pub const NOT_PRESENT: OpFlags = OpFlags(0x20);
    /// Conditional branch (may or may not be taken).
    pub const COND_BRANCH: OpFlags = OpFlags(0x80);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: OpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: OpFlags) -> Self {
        Self(self.0 | other.0)
    }
}

/// Static definition of an opcode: argument counts and flags.
#[derive(Debug, Clone, Copy)]
pub struct OpDef {
    pub name: &'static str,
    pub nb_oargs: u8,
    pub nb_iargs: u8,
    pub nb_cargs: u8,
    pub flags: OpFlags,
}

impl OpDef {
    pub const fn nb_args(&self) -> u8 {
        self.nb_oargs + self.nb_iargs + self.nb_cargs
    }
}

const fn def(name: &'static str, o: u8, i: u8, c: u8, flags: OpFlags) -> OpDef {
    OpDef {
        name,
        nb_oargs: o,
        nb_iargs: i,
        nb_cargs: c,
        flags,
    }
}

// Helper to combine flags in const context.
const fn f(a: OpFlags, b: OpFlags) -> OpFlags {
    OpFlags(a.0 | b.0)
}

const NP: OpFlags = OpFlags::NOT_PRESENT;
const SE: OpFlags = OpFlags::SIDE_EFFECTS;
const CC: OpFlags = OpFlags::CALL_CLOBBER;
const BE: OpFlags = OpFlags::BB_END;
const BX: OpFlags = OpFlags::BB_EXIT;
const CB: OpFlags = OpFlags::COND_BRANCH;
const N: OpFlags = OpFlags::NONE;

/// Static opcode definition table, indexed by `Opcode as usize`.
pub static OPCODE_DEFS: [OpDef; Opcode::Count as usize] = [
    def("read_reg", 1, 0, 1, N),
    def("write_reg", 0, 1, 1, SE),
    def("add", 1, 2, 0, N),
    def("sub", 1, 2, 0, N),
    def("mul", 1, 2, 0, N),
    def("mulsh", 1, 2, 0, N),
    def("muluh", 1, 2, 0, N),
    def("neg", 1, 1, 0, N),
    def("and", 1, 2, 0, N),
    def("or", 1, 2, 0, N),
    def("xor", 1, 2, 0, N),
    def("not", 1, 1, 0, N),
    def("shl", 1, 2, 0, N),
    def("shr", 1, 2, 0, N),
    def("sar", 1, 2, 0, N),
    def("rotl", 1, 2, 0, N),
    def("rotr", 1, 2, 0, N),
    def("ext8s", 1, 1, 0, N),
    def("ext16s", 1, 1, 0, N),
    def("ext8u", 1, 1, 0, N),
    def("ext16u", 1, 1, 0, N),
    def("bswap16", 1, 1, 0, N),
    // setcond: d = cond(a, b)
    def("setcond", 1, 2, 1, N),
    // movcond: d = cond(c1, c2) ? v1 : v2
    def("movcond", 1, 4, 1, N),
    def("ld", 1, 1, 1, SE),
    // st: addr, val
    def("st", 0, 2, 1, SE),
    // call: ret = helper(a0, a1, a2); cargs = helper id, call flags
    def("call", 1, 3, 2, f(CC, SE)),
    def("br", 0, 0, 1, BE),
    def("brcond", 0, 2, 2, f(BE, CB)),
    def("set_label", 0, 0, 1, BE),
    def("goto_tb", 0, 0, 1, f(BX, BE)),
    // brcond_tb: a, b; cargs = cond, taken pc, fallthrough pc
    def("brcond_tb", 0, 2, 3, f(f(BX, BE), CB)),
    def("goto_ptr", 0, 1, 0, f(BX, BE)),
    def("exit_tb", 0, 0, 1, f(BX, BE)),
    def("insn_start", 0, 0, 1, NP),
    def("nop", 0, 0, 0, NP),
];

impl Opcode {
    /// Look up the static definition for this opcode.
    pub fn def(self) -> &'static OpDef {
        &OPCODE_DEFS[self as usize]
    }

    /// Whether this opcode ends the translation block.
    pub fn is_terminal(self) -> bool {
        self.def().flags.contains(OpFlags::BB_EXIT)
    }

    /// Pure ops can be folded or removed when their result is unused.
    pub fn is_pure(self) -> bool {
        let flags = self.def().flags;
        self.def().nb_oargs == 1
            && !flags.contains(OpFlags::SIDE_EFFECTS)
            && !flags.contains(OpFlags::BB_END)
    }
}
