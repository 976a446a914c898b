//! SH4 instruction decoder.
//!
//! Every 16-bit opcode maps to exactly one [`Sh4Op`] through a 64K-entry
//! lookup table built from the bit patterns below. Encodings that match no
//! pattern (including all FPU and MAC forms) map to [`Sh4Op::Invalid`].

use std::sync::OnceLock;

use bitflags::bitflags;

bitflags! {
    /// Static properties of an opcode class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sh4Flags: u32 {
        /// Transfers control; ends the block.
        const BRANCH = 1 << 0;
        /// Followed by a delay slot.
        const DELAYED = 1 << 1;
        /// Only legal with SR.MD = 1.
        const PRIV = 1 << 2;
        /// Changes state the translation depends on; ends the block.
        const ENDS_BLOCK = 1 << 3;
        /// Raises a slot-illegal exception inside a delay slot.
        const SLOT_ILLEGAL = 1 << 4;
        const LOAD = 1 << 5;
        const STORE = 1 << 6;
        /// Reads or writes the T bit.
        const USES_T = 1 << 7;
    }
}

const BR: u32 = Sh4Flags::BRANCH.bits() | Sh4Flags::SLOT_ILLEGAL.bits();
const DS: u32 = Sh4Flags::DELAYED.bits();
const PV: u32 = Sh4Flags::PRIV.bits();
const EB: u32 = Sh4Flags::ENDS_BLOCK.bits();
const SI: u32 = Sh4Flags::SLOT_ILLEGAL.bits();
const LD: u32 = Sh4Flags::LOAD.bits();
const ST: u32 = Sh4Flags::STORE.bits();
const T: u32 = Sh4Flags::USES_T.bits();
const NO: u32 = 0;

/// Parse a 16-character pattern into `(mask, key)`; `0`/`1` are fixed bits,
/// any other character is an operand bit.
pub const fn parse_pattern(pattern: &str) -> (u16, u16) {
    let bytes = pattern.as_bytes();
    assert!(bytes.len() == 16, "opcode pattern must have 16 bits");
    let mut mask: u16 = 0;
    let mut key: u16 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        mask <<= 1;
        key <<= 1;
        if c == b'0' || c == b'1' {
            mask |= 1;
            if c == b'1' {
                key |= 1;
            }
        }
        i += 1;
    }
    (mask, key)
}

/// Descriptor of one opcode class.
#[derive(Debug, Clone, Copy)]
pub struct OpDesc {
    pub op: Sh4Op,
    pub name: &'static str,
    pub pattern: &'static str,
    pub mask: u16,
    pub key: u16,
    /// Disassembly template, see [`crate::sh4::disas`].
    pub fmt: &'static str,
    pub flags: Sh4Flags,
}

impl OpDesc {
    const fn new(
        op: Sh4Op,
        name: &'static str,
        pattern: &'static str,
        fmt: &'static str,
        flags: u32,
    ) -> Self {
        let (mask, key) = parse_pattern(pattern);
        Self {
            op,
            name,
            pattern,
            mask,
            key,
            fmt,
            flags: Sh4Flags::from_bits_retain(flags),
        }
    }

    pub fn matches(&self, raw: u16) -> bool {
        self.op != Sh4Op::Invalid && raw & self.mask == self.key
    }
}

macro_rules! sh4_ops {
    ($( $op:ident: $pat:literal, $fmt:literal, $flags:expr; )*) => {
        /// Opcode class identifier, dense in `[0, NUM_SH4_OPS)`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Sh4Op {
            Invalid = 0,
            $($op,)*
            // Sentinel, must be last
            Count,
        }

        /// Descriptor table indexed by `Sh4Op as usize`.
        pub static SH4_OPS: [OpDesc; NUM_SH4_OPS] = [
            OpDesc {
                op: Sh4Op::Invalid,
                name: "invalid",
                pattern: "",
                mask: 0,
                key: 0,
                fmt: ".word %r",
                flags: Sh4Flags::empty(),
            },
            $(OpDesc::new(Sh4Op::$op, stringify!($op), $pat, $fmt, $flags),)*
        ];
    };
}

/// Number of opcode classes, including `Invalid`.
pub const NUM_SH4_OPS: usize = Sh4Op::Count as usize;

sh4_ops! {
    // -- Data transfer --
    MovImm:        "1110nnnniiiiiiii", "mov #%s, r%n", NO;
    MovwPcrel:     "1001nnnndddddddd", "mov.w @(%W), r%n", LD;
    MovlPcrel:     "1101nnnndddddddd", "mov.l @(%L), r%n", LD;
    Mov:           "0110nnnnmmmm0011", "mov r%m, r%n", NO;
    MovbStore:     "0010nnnnmmmm0000", "mov.b r%m, @r%n", ST;
    MovwStore:     "0010nnnnmmmm0001", "mov.w r%m, @r%n", ST;
    MovlStore:     "0010nnnnmmmm0010", "mov.l r%m, @r%n", ST;
    MovbLoad:      "0110nnnnmmmm0000", "mov.b @r%m, r%n", LD;
    MovwLoad:      "0110nnnnmmmm0001", "mov.w @r%m, r%n", LD;
    MovlLoad:      "0110nnnnmmmm0010", "mov.l @r%m, r%n", LD;
    MovbPredec:    "0010nnnnmmmm0100", "mov.b r%m, @-r%n", ST;
    MovwPredec:    "0010nnnnmmmm0101", "mov.w r%m, @-r%n", ST;
    MovlPredec:    "0010nnnnmmmm0110", "mov.l r%m, @-r%n", ST;
    MovbPostinc:   "0110nnnnmmmm0100", "mov.b @r%m+, r%n", LD;
    MovwPostinc:   "0110nnnnmmmm0101", "mov.w @r%m+, r%n", LD;
    MovlPostinc:   "0110nnnnmmmm0110", "mov.l @r%m+, r%n", LD;
    MovbStoreDisp: "10000000nnnndddd", "mov.b r0, @(%b, r%m)", ST;
    MovwStoreDisp: "10000001nnnndddd", "mov.w r0, @(%w, r%m)", ST;
    MovlStoreDisp: "0001nnnnmmmmdddd", "mov.l r%m, @(%l, r%n)", ST;
    MovbLoadDisp:  "10000100mmmmdddd", "mov.b @(%b, r%m), r0", LD;
    MovwLoadDisp:  "10000101mmmmdddd", "mov.w @(%w, r%m), r0", LD;
    MovlLoadDisp:  "0101nnnnmmmmdddd", "mov.l @(%l, r%m), r%n", LD;
    MovbStoreIdx:  "0000nnnnmmmm0100", "mov.b r%m, @(r0, r%n)", ST;
    MovwStoreIdx:  "0000nnnnmmmm0101", "mov.w r%m, @(r0, r%n)", ST;
    MovlStoreIdx:  "0000nnnnmmmm0110", "mov.l r%m, @(r0, r%n)", ST;
    MovbLoadIdx:   "0000nnnnmmmm1100", "mov.b @(r0, r%m), r%n", LD;
    MovwLoadIdx:   "0000nnnnmmmm1101", "mov.w @(r0, r%m), r%n", LD;
    MovlLoadIdx:   "0000nnnnmmmm1110", "mov.l @(r0, r%m), r%n", LD;
    MovbStoreGbr:  "11000000dddddddd", "mov.b r0, @(%1, gbr)", ST;
    MovwStoreGbr:  "11000001dddddddd", "mov.w r0, @(%2, gbr)", ST;
    MovlStoreGbr:  "11000010dddddddd", "mov.l r0, @(%4, gbr)", ST;
    MovbLoadGbr:   "11000100dddddddd", "mov.b @(%1, gbr), r0", LD;
    MovwLoadGbr:   "11000101dddddddd", "mov.w @(%2, gbr), r0", LD;
    MovlLoadGbr:   "11000110dddddddd", "mov.l @(%4, gbr), r0", LD;
    Mova:          "11000111dddddddd", "mova @(%L), r0", NO;
    Movt:          "0000nnnn00101001", "movt r%n", T;
    MovcaL:        "0000nnnn11000011", "movca.l r0, @r%n", ST;
    SwapB:         "0110nnnnmmmm1000", "swap.b r%m, r%n", NO;
    SwapW:         "0110nnnnmmmm1001", "swap.w r%m, r%n", NO;
    Xtrct:         "0010nnnnmmmm1101", "xtrct r%m, r%n", NO;

    // -- Arithmetic --
    Add:           "0011nnnnmmmm1100", "add r%m, r%n", NO;
    AddImm:        "0111nnnniiiiiiii", "add #%s, r%n", NO;
    Addc:          "0011nnnnmmmm1110", "addc r%m, r%n", T;
    Addv:          "0011nnnnmmmm1111", "addv r%m, r%n", T;
    CmpEqImm:      "10001000iiiiiiii", "cmp/eq #%s, r0", T;
    CmpEq:         "0011nnnnmmmm0000", "cmp/eq r%m, r%n", T;
    CmpHs:         "0011nnnnmmmm0010", "cmp/hs r%m, r%n", T;
    CmpGe:         "0011nnnnmmmm0011", "cmp/ge r%m, r%n", T;
    CmpHi:         "0011nnnnmmmm0110", "cmp/hi r%m, r%n", T;
    CmpGt:         "0011nnnnmmmm0111", "cmp/gt r%m, r%n", T;
    CmpPz:         "0100nnnn00010001", "cmp/pz r%n", T;
    CmpPl:         "0100nnnn00010101", "cmp/pl r%n", T;
    CmpStr:        "0010nnnnmmmm1100", "cmp/str r%m, r%n", T;
    Div0s:         "0010nnnnmmmm0111", "div0s r%m, r%n", T;
    Div0u:         "0000000000011001", "div0u", T;
    Div1:          "0011nnnnmmmm0100", "div1 r%m, r%n", T;
    DmulsL:        "0011nnnnmmmm1101", "dmuls.l r%m, r%n", NO;
    DmuluL:        "0011nnnnmmmm0101", "dmulu.l r%m, r%n", NO;
    Dt:            "0100nnnn00010000", "dt r%n", T;
    ExtsB:         "0110nnnnmmmm1110", "exts.b r%m, r%n", NO;
    ExtsW:         "0110nnnnmmmm1111", "exts.w r%m, r%n", NO;
    ExtuB:         "0110nnnnmmmm1100", "extu.b r%m, r%n", NO;
    ExtuW:         "0110nnnnmmmm1101", "extu.w r%m, r%n", NO;
    MulL:          "0000nnnnmmmm0111", "mul.l r%m, r%n", NO;
    MulsW:         "0010nnnnmmmm1111", "muls.w r%m, r%n", NO;
    MuluW:         "0010nnnnmmmm1110", "mulu.w r%m, r%n", NO;
    Neg:           "0110nnnnmmmm1011", "neg r%m, r%n", NO;
    Negc:          "0110nnnnmmmm1010", "negc r%m, r%n", T;
    Sub:           "0011nnnnmmmm1000", "sub r%m, r%n", NO;
    Subc:          "0011nnnnmmmm1010", "subc r%m, r%n", T;
    Subv:          "0011nnnnmmmm1011", "subv r%m, r%n", T;

    // -- Logic --
    And:           "0010nnnnmmmm1001", "and r%m, r%n", NO;
    AndImm:        "11001001iiiiiiii", "and #%x, r0", NO;
    AndB:          "11001101iiiiiiii", "and.b #%x, @(r0, gbr)", LD | ST;
    Not:           "0110nnnnmmmm0111", "not r%m, r%n", NO;
    Or:            "0010nnnnmmmm1011", "or r%m, r%n", NO;
    OrImm:         "11001011iiiiiiii", "or #%x, r0", NO;
    OrB:           "11001111iiiiiiii", "or.b #%x, @(r0, gbr)", LD | ST;
    TasB:          "0100nnnn00011011", "tas.b @r%n", LD | ST | T;
    Tst:           "0010nnnnmmmm1000", "tst r%m, r%n", T;
    TstImm:        "11001000iiiiiiii", "tst #%x, r0", T;
    TstB:          "11001100iiiiiiii", "tst.b #%x, @(r0, gbr)", LD | T;
    Xor:           "0010nnnnmmmm1010", "xor r%m, r%n", NO;
    XorImm:        "11001010iiiiiiii", "xor #%x, r0", NO;
    XorB:          "11001110iiiiiiii", "xor.b #%x, @(r0, gbr)", LD | ST;

    // -- Shift/rotate --
    Rotl:          "0100nnnn00000100", "rotl r%n", T;
    Rotr:          "0100nnnn00000101", "rotr r%n", T;
    Rotcl:         "0100nnnn00100100", "rotcl r%n", T;
    Rotcr:         "0100nnnn00100101", "rotcr r%n", T;
    Shad:          "0100nnnnmmmm1100", "shad r%m, r%n", NO;
    Shal:          "0100nnnn00100000", "shal r%n", T;
    Shar:          "0100nnnn00100001", "shar r%n", T;
    Shld:          "0100nnnnmmmm1101", "shld r%m, r%n", NO;
    Shll:          "0100nnnn00000000", "shll r%n", T;
    Shll2:         "0100nnnn00001000", "shll2 r%n", NO;
    Shll8:         "0100nnnn00011000", "shll8 r%n", NO;
    Shll16:        "0100nnnn00101000", "shll16 r%n", NO;
    Shlr:          "0100nnnn00000001", "shlr r%n", T;
    Shlr2:         "0100nnnn00001001", "shlr2 r%n", NO;
    Shlr8:         "0100nnnn00011001", "shlr8 r%n", NO;
    Shlr16:        "0100nnnn00101001", "shlr16 r%n", NO;

    // -- Branch --
    Bf:            "10001011dddddddd", "bf %j", BR | T;
    Bfs:           "10001111dddddddd", "bf/s %j", BR | DS | T;
    Bt:            "10001001dddddddd", "bt %j", BR | T;
    Bts:           "10001101dddddddd", "bt/s %j", BR | DS | T;
    Bra:           "1010dddddddddddd", "bra %J", BR | DS;
    Braf:          "0000nnnn00100011", "braf r%n", BR | DS;
    Bsr:           "1011dddddddddddd", "bsr %J", BR | DS;
    Bsrf:          "0000nnnn00000011", "bsrf r%n", BR | DS;
    Jmp:           "0100nnnn00101011", "jmp @r%n", BR | DS;
    Jsr:           "0100nnnn00001011", "jsr @r%n", BR | DS;
    Rts:           "0000000000001011", "rts", BR | DS;
    Rte:           "0000000000101011", "rte", BR | DS | PV;

    // -- System --
    Clrmac:        "0000000000101000", "clrmac", NO;
    Clrs:          "0000000001001000", "clrs", NO;
    Clrt:          "0000000000001000", "clrt", T;
    Sets:          "0000000001011000", "sets", NO;
    Sett:          "0000000000011000", "sett", T;
    Nop:           "0000000000001001", "nop", NO;
    Sleep:         "0000000000011011", "sleep", PV | EB;
    Trapa:         "11000011iiiiiiii", "trapa #%x", SI | EB;
    Ldtlb:         "0000000000111000", "ldtlb", PV;
    Ocbi:          "0000nnnn10010011", "ocbi @r%n", NO;
    Ocbp:          "0000nnnn10100011", "ocbp @r%n", NO;
    Ocbwb:         "0000nnnn10110011", "ocbwb @r%n", NO;
    Pref:          "0000nnnn10000011", "pref @r%n", NO;
    LdcSr:         "0100nnnn00001110", "ldc r%n, sr", PV | EB | T;
    LdcGbr:        "0100nnnn00011110", "ldc r%n, gbr", NO;
    LdcVbr:        "0100nnnn00101110", "ldc r%n, vbr", PV;
    LdcSsr:        "0100nnnn00111110", "ldc r%n, ssr", PV;
    LdcSpc:        "0100nnnn01001110", "ldc r%n, spc", PV;
    LdcDbr:        "0100nnnn11111010", "ldc r%n, dbr", PV;
    LdcBank:       "0100nnnn1mmm1110", "ldc r%n, r%k_bank", PV;
    LdclSr:        "0100nnnn00000111", "ldc.l @r%n+, sr", PV | EB | LD | T;
    LdclGbr:       "0100nnnn00010111", "ldc.l @r%n+, gbr", LD;
    LdclVbr:       "0100nnnn00100111", "ldc.l @r%n+, vbr", PV | LD;
    LdclSsr:       "0100nnnn00110111", "ldc.l @r%n+, ssr", PV | LD;
    LdclSpc:       "0100nnnn01000111", "ldc.l @r%n+, spc", PV | LD;
    LdclDbr:       "0100nnnn11110110", "ldc.l @r%n+, dbr", PV | LD;
    LdclBank:      "0100nnnn1mmm0111", "ldc.l @r%n+, r%k_bank", PV | LD;
    LdsMach:       "0100nnnn00001010", "lds r%n, mach", NO;
    LdsMacl:       "0100nnnn00011010", "lds r%n, macl", NO;
    LdsPr:         "0100nnnn00101010", "lds r%n, pr", NO;
    LdslMach:      "0100nnnn00000110", "lds.l @r%n+, mach", LD;
    LdslMacl:      "0100nnnn00010110", "lds.l @r%n+, macl", LD;
    LdslPr:        "0100nnnn00100110", "lds.l @r%n+, pr", LD;
    StcSr:         "0000nnnn00000010", "stc sr, r%n", PV | T;
    StcGbr:        "0000nnnn00010010", "stc gbr, r%n", NO;
    StcVbr:        "0000nnnn00100010", "stc vbr, r%n", PV;
    StcSsr:        "0000nnnn00110010", "stc ssr, r%n", PV;
    StcSpc:        "0000nnnn01000010", "stc spc, r%n", PV;
    StcSgr:        "0000nnnn00111010", "stc sgr, r%n", PV;
    StcDbr:        "0000nnnn11111010", "stc dbr, r%n", PV;
    StcBank:       "0000nnnn1mmm0010", "stc r%k_bank, r%n", PV;
    StclSr:        "0100nnnn00000011", "stc.l sr, @-r%n", PV | ST | T;
    StclGbr:       "0100nnnn00010011", "stc.l gbr, @-r%n", ST;
    StclVbr:       "0100nnnn00100011", "stc.l vbr, @-r%n", PV | ST;
    StclSsr:       "0100nnnn00110011", "stc.l ssr, @-r%n", PV | ST;
    StclSpc:       "0100nnnn01000011", "stc.l spc, @-r%n", PV | ST;
    StclSgr:       "0100nnnn00110010", "stc.l sgr, @-r%n", PV | ST;
    StclDbr:       "0100nnnn11110010", "stc.l dbr, @-r%n", PV | ST;
    StclBank:      "0100nnnn1mmm0011", "stc.l r%k_bank, @-r%n", PV | ST;
    StsMach:       "0000nnnn00001010", "sts mach, r%n", NO;
    StsMacl:       "0000nnnn00011010", "sts macl, r%n", NO;
    StsPr:         "0000nnnn00101010", "sts pr, r%n", NO;
    StslMach:      "0100nnnn00000010", "sts.l mach, @-r%n", ST;
    StslMacl:      "0100nnnn00010010", "sts.l macl, @-r%n", ST;
    StslPr:        "0100nnnn00100010", "sts.l pr, @-r%n", ST;
}

impl Sh4Op {
    /// Look up the static descriptor for this opcode class.
    pub fn desc(self) -> &'static OpDesc {
        &SH4_OPS[self as usize]
    }

    pub fn flags(self) -> Sh4Flags {
        self.desc().flags
    }

    pub fn from_index(idx: usize) -> Option<Sh4Op> {
        SH4_OPS.get(idx).map(|d| d.op)
    }
}

/// A decoded guest instruction.
///
/// All operand fields are extracted unconditionally; which of them are
/// meaningful depends on the opcode class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sh4Instr {
    pub raw: u16,
    pub op: Sh4Op,
    /// Bits 11..8.
    pub n: u8,
    /// Bits 7..4.
    pub m: u8,
    /// Bits 3..0.
    pub disp4: u8,
    /// Bits 7..0.
    pub imm8: u8,
    /// Bits 11..0.
    pub disp12: u16,
}

impl Sh4Instr {
    pub const fn from_raw(raw: u16, op: Sh4Op) -> Self {
        Self {
            raw,
            op,
            n: ((raw >> 8) & 0xf) as u8,
            m: ((raw >> 4) & 0xf) as u8,
            disp4: (raw & 0xf) as u8,
            imm8: (raw & 0xff) as u8,
            disp12: raw & 0xfff,
        }
    }

    /// Sign-extended 8-bit immediate.
    pub const fn simm8(&self) -> i32 {
        self.imm8 as i8 as i32
    }

    /// Sign-extended 12-bit displacement.
    pub const fn simm12(&self) -> i32 {
        ((self.disp12 << 4) as i16 >> 4) as i32
    }

    /// Banked register index of the `Rn_BANK` forms.
    pub const fn bank(&self) -> u8 {
        self.m & 0x7
    }

    /// Target of an 8-bit conditional branch at `pc`.
    pub const fn branch_target8(&self, pc: u32) -> u32 {
        pc.wrapping_add(4)
            .wrapping_add((self.simm8() * 2) as u32)
    }

    /// Target of a 12-bit BRA/BSR at `pc`.
    pub const fn branch_target12(&self, pc: u32) -> u32 {
        pc.wrapping_add(4)
            .wrapping_add((self.simm12() * 2) as u32)
    }

    /// Address of a PC-relative word operand.
    pub const fn pcrel_word(&self, pc: u32) -> u32 {
        pc.wrapping_add(4).wrapping_add(self.imm8 as u32 * 2)
    }

    /// Address of a PC-relative long operand (also MOVA).
    pub const fn pcrel_long(&self, pc: u32) -> u32 {
        (pc.wrapping_add(4) & !3).wrapping_add(self.imm8 as u32 * 4)
    }
}

fn build_table() -> Box<[Sh4Op]> {
    let mut table = vec![Sh4Op::Invalid; 1 << 16].into_boxed_slice();
    for desc in SH4_OPS.iter().skip(1) {
        // Walk every assignment of the operand bits.
        let free = !desc.mask;
        let mut sub: u16 = 0;
        loop {
            let raw = desc.key | sub;
            debug_assert_eq!(
                table[raw as usize],
                Sh4Op::Invalid,
                "opcode patterns overlap at {raw:#06x}"
            );
            table[raw as usize] = desc.op;
            if sub == free {
                break;
            }
            sub = sub.wrapping_sub(free) & free;
        }
    }
    table
}

fn table() -> &'static [Sh4Op] {
    static TABLE: OnceLock<Box<[Sh4Op]>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Map a raw opcode to its class in O(1).
pub fn sh4_get_op(raw: u16) -> Sh4Op {
    table()[raw as usize]
}

/// Decode a raw opcode.
pub fn decode(raw: u16) -> Sh4Instr {
    Sh4Instr::from_raw(raw, sh4_get_op(raw))
}
