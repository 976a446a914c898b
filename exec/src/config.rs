use sh4jit_backend::code_buffer::{DEFAULT_CODE_BUF_LIMIT, DEFAULT_CODE_BUF_SIZE};
use sh4jit_core::context::MAX_INSNS;

/// Tuning knobs for the block cache and execution loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitConfig {
    /// Guest instructions per block (further capped by
    /// `TranslationBlock::max_insns`).
    pub max_insns: u32,
    /// Initial code buffer reservation in bytes.
    pub code_buffer_size: usize,
    /// Code buffer size at which the cache flushes instead of growing.
    pub code_buffer_limit: usize,
    /// Follow and cache static successor links between blocks.
    pub chain_blocks: bool,
    /// Blocks the cache may hold before it flushes.
    pub max_blocks: usize,
}

impl Default for JitConfig {
    fn default() -> Self {
        Self {
            max_insns: MAX_INSNS as u32,
            code_buffer_size: DEFAULT_CODE_BUF_SIZE,
            code_buffer_limit: DEFAULT_CODE_BUF_LIMIT,
            chain_blocks: true,
            max_blocks: 65536,
        }
    }
}
