/// A cached translated code block.
///
/// Maps a contiguous run of guest instructions `[pc, pc + size)` to the
/// host code generated for it.
#[derive(Debug)]
pub struct TranslationBlock {
    /// Guest PC where this block starts.
    pub pc: u32,
    /// CPU state flags that affect translation (e.g. privilege level).
    pub flags: u32,
    /// Size of guest code covered by this block, in bytes.
    pub size: u32,
    /// Number of guest instructions in this block.
    pub icount: u16,
    /// Whether the block ends in a guest control transfer rather than
    /// falling through into the next instruction.
    pub ends_in_branch: bool,

    /// Offset into the code buffer where host code starts.
    pub host_offset: usize,
    /// Size of generated host code in bytes.
    pub host_size: usize,

    /// Lifecycle state.
    pub state: TbState,
    /// Compile sequence number; unique for every compile of the cache.
    pub seq: u64,

    /// Chained successor for each static exit slot.
    pub jmp_dest: [Option<usize>; 2],
    /// Incoming chains: `(source tb, source slot)` pairs that point here.
    pub jmp_list: Vec<(usize, usize)>,
    /// Last successor reached through the block's dynamic exit.
    pub exit_target: Option<usize>,

    /// Index of the next block in the same hash bucket, or `None`.
    pub hash_next: Option<usize>,
}

/// Lifecycle of a translation block.
///
/// `Compiling -> Resident -> Stale`. A stale block never becomes resident
/// again; the same guest pc gets a new block with a new sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbState {
    Compiling,
    Resident,
    Stale,
}

impl TranslationBlock {
    pub fn new(pc: u32, flags: u32, seq: u64) -> Self {
        Self {
            pc,
            flags,
            size: 0,
            icount: 0,
            ends_in_branch: false,
            host_offset: 0,
            host_size: 0,
            state: TbState::Compiling,
            seq,
            jmp_dest: [None; 2],
            jmp_list: Vec::new(),
            exit_target: None,
            hash_next: None,
        }
    }

    /// Compute hash bucket index for block lookup.
    pub fn hash(pc: u32, flags: u32) -> usize {
        // Flags sit above the pc so both reach the high product bits.
        let h = ((pc as u64) | ((flags as u64) << 32)).wrapping_mul(0x9e3779b97f4a7c15);
        (h >> (64 - TB_HASH_SIZE.trailing_zeros())) as usize
    }

    pub fn is_resident(&self) -> bool {
        self.state == TbState::Resident
    }

    /// Whether the guest range `[start, end)` intersects this block.
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        let tb_end = self.pc as u64 + self.size.max(1) as u64;
        (self.pc as u64) < end as u64 && (start as u64) < tb_end
    }

    /// Maximum number of guest instructions per block, given a
    /// configured limit (0 = default).
    pub fn max_insns(limit: u32) -> u32 {
        if limit == 0 {
            512
        } else {
            limit.min(512)
        }
    }
}

/// Number of buckets in the block hash table.
pub const TB_HASH_SIZE: usize = 1 << 15; // 32768

/// Number of entries in the jump cache.
pub const TB_JMP_CACHE_SIZE: usize = 1 << 12; // 4096

/// Guest page granularity used for code tracking.
pub const TARGET_PAGE_BITS: u32 = 12;
pub const TARGET_PAGE_SIZE: u32 = 1 << TARGET_PAGE_BITS;
pub const TARGET_PAGE_MASK: u32 = !(TARGET_PAGE_SIZE - 1);

/// Direct-mapped block jump cache.
///
/// Indexed by `(pc >> 1) & (TB_JMP_CACHE_SIZE - 1)` since guest
/// instructions are 2-byte aligned. Provides O(1) lookup for the common
/// case of re-executing the same PC.
pub struct JumpCache {
    entries: Box<[Option<usize>; TB_JMP_CACHE_SIZE]>,
}

impl JumpCache {
    pub fn new() -> Self {
        Self {
            entries: Box::new([None; TB_JMP_CACHE_SIZE]),
        }
    }

    fn index(pc: u32) -> usize {
        (pc as usize >> 1) & (TB_JMP_CACHE_SIZE - 1)
    }

    pub fn lookup(&self, pc: u32) -> Option<usize> {
        self.entries[Self::index(pc)]
    }

    pub fn insert(&mut self, pc: u32, tb_idx: usize) {
        self.entries[Self::index(pc)] = Some(tb_idx);
    }

    /// Clear the slot for `pc` if it still refers to `tb_idx`.
    pub fn remove(&mut self, pc: u32, tb_idx: usize) {
        let slot = &mut self.entries[Self::index(pc)];
        if *slot == Some(tb_idx) {
            *slot = None;
        }
    }

    pub fn invalidate(&mut self) {
        self.entries.fill(None);
    }
}

impl Default for JumpCache {
    fn default() -> Self {
        Self::new()
    }
}

/// How execution left a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbExit {
    /// Static successor through chain slot 0 or 1; the guest PC has been
    /// written.
    Chain(usize),
    /// Successor known only at runtime; the guest PC has been written.
    Lookup,
    /// Return to the execution loop with a code from `exit_tb`.
    Exit(u32),
}

/// `exit_tb` code: the guest entered a low-power wait.
pub const EXIT_SLEEP: u32 = 0x1_0000;
/// `exit_tb` code base: the guest took an exception; the low 16 bits carry
/// the event code.
pub const EXIT_EXCEPTION: u32 = 0x2_0000;
/// Mask selecting the class bits of an exit code.
pub const EXIT_CLASS_MASK: u32 = 0xffff_0000;
