//! Execution engine: block cache and CPU execution loop.
//!
//! Drives the lookup → translate → execute cycle, with blocks cached in
//! a hash table fronted by a direct-mapped jump cache. The cache owns the
//! code buffer; blocks refer to their code by offset.

pub mod config;
pub mod exec_loop;
pub mod tb_store;

pub use config::JitConfig;
pub use exec_loop::{cpu_exec_bounded, cpu_exec_loop, ExitReason};
pub use tb_store::TbStore;

use sh4jit_backend::{BackendError, CodeBuffer, HostCodeGen};
use sh4jit_core::tb::{JumpCache, TbState, TranslationBlock};
use sh4jit_core::{CodeInvalidator, Context, GuestEnv};
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by the block cache.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The frontend produced an empty block.
    #[error("translation produced no code at {pc:#010x}")]
    TranslationFailed { pc: u32 },
    #[error("block store full")]
    StoreFull,
}

/// What the frontend reports about a block it translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuestBlock {
    /// Guest bytes covered.
    pub size: u32,
    pub icount: u32,
    pub ends_in_branch: bool,
}

/// Code invalidation requested by guest activity, applied by the
/// execution loop once the current block has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Range { start: u32, end: u32 },
    All,
}

/// Trait for guest CPU state used by the execution loop.
///
/// Generated code runs against the CPU through its [`GuestEnv`]
/// implementation.
pub trait GuestCpu: GuestEnv {
    /// Current guest program counter.
    fn pc(&self) -> u32;

    /// CPU state that affects translation.
    fn flags(&self) -> u32;

    /// Translate guest code starting at `pc` into `ir`.
    /// Called only on a cache miss.
    fn gen_code(&mut self, ir: &mut Context, pc: u32, flags: u32, max_insns: u32) -> GuestBlock;

    /// Invalidations queued since the last call.
    fn take_invalidations(&mut self) -> Vec<Invalidation>;
}

/// Handle to a resident block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeEntry {
    pub tb: usize,
    pub host_offset: usize,
    pub seq: u64,
}

/// Block cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecStats {
    pub lookups: u64,
    pub hits: u64,
    pub compiles: u64,
    pub flushes: u64,
    pub invalidated: u64,
    pub blocks_executed: u64,
    pub chained: u64,
}

/// Execution environment holding all shared translation state.
pub struct ExecEnv<B: HostCodeGen> {
    pub tb_store: TbStore,
    pub jump_cache: JumpCache,
    pub code_buf: CodeBuffer,
    pub backend: B,
    pub ir_ctx: Context,
    pub config: JitConfig,
    pub stats: ExecStats,
    /// Storage reclaim deferred to the next lookup.
    flush_pending: bool,
}

impl<B: HostCodeGen> ExecEnv<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, JitConfig::default())
    }

    pub fn with_config(backend: B, config: JitConfig) -> Self {
        Self {
            tb_store: TbStore::new(config.max_blocks),
            jump_cache: JumpCache::new(),
            code_buf: CodeBuffer::new(config.code_buffer_size, config.code_buffer_limit),
            backend,
            ir_ctx: Context::new(),
            config,
            stats: ExecStats::default(),
            flush_pending: false,
        }
    }

    fn entry(&self, idx: usize) -> NativeEntry {
        let tb = self.tb_store.get(idx);
        NativeEntry {
            tb: idx,
            host_offset: tb.host_offset,
            seq: tb.seq,
        }
    }

    /// Whether a flush is waiting for the next lookup.
    pub fn flush_pending(&self) -> bool {
        self.flush_pending
    }

    /// Find the resident block for `(pc, flags)`, translating it on a miss.
    ///
    /// Invalidations the guest queued since the last block ran (host
    /// stores, image loads) are applied first. A backend that runs out of
    /// code space, or a full block store, triggers one flush and one retry.
    pub fn lookup_or_compile<C: GuestCpu>(
        &mut self,
        cpu: &mut C,
        pc: u32,
        flags: u32,
    ) -> Result<NativeEntry, ExecError> {
        for inv in cpu.take_invalidations() {
            self.apply(inv);
        }
        if self.flush_pending {
            self.flush();
        }
        self.stats.lookups += 1;

        // Fast path: jump cache
        if let Some(idx) = self.jump_cache.lookup(pc) {
            if self.tb_store.is_valid_target(idx, pc, flags) {
                self.stats.hits += 1;
                return Ok(self.entry(idx));
            }
        }

        // Slow path: hash table
        if let Some(idx) = self.tb_store.lookup(pc, flags) {
            self.jump_cache.insert(pc, idx);
            self.stats.hits += 1;
            return Ok(self.entry(idx));
        }

        match self.tb_gen_code(cpu, pc, flags) {
            Err(ExecError::Backend(BackendError::BufferFull { .. })) | Err(ExecError::StoreFull) => {
                info!(
                    blocks = self.tb_store.len(),
                    code_bytes = self.code_buf.offset(),
                    "block cache full, flushing"
                );
                self.flush();
                self.tb_gen_code(cpu, pc, flags)
            }
            r => r,
        }
    }

    /// Translate guest code at `pc` into a new block.
    fn tb_gen_code<C: GuestCpu>(&mut self, cpu: &mut C, pc: u32, flags: u32) -> Result<NativeEntry, ExecError> {
        let idx = self.tb_store.alloc(pc, flags)?;

        let max_insns = TranslationBlock::max_insns(self.config.max_insns);
        let info = cpu.gen_code(&mut self.ir_ctx, pc, flags, max_insns);
        if info.size == 0 {
            self.tb_store.abandon(idx);
            return Err(ExecError::TranslationFailed { pc });
        }

        let start = self.code_buf.offset();
        let code = match self.backend.compile(&mut self.ir_ctx, &mut self.code_buf) {
            Ok(code) => code,
            Err(e) => {
                self.code_buf.set_offset(start);
                self.tb_store.abandon(idx);
                return Err(e.into());
            }
        };

        let tb = self.tb_store.get_mut(idx);
        tb.size = info.size;
        tb.icount = info.icount.min(u16::MAX as u32) as u16;
        tb.ends_in_branch = info.ends_in_branch;
        tb.host_offset = code.offset;
        tb.host_size = code.size;
        tb.state = TbState::Resident;

        self.tb_store.insert(idx);
        self.jump_cache.insert(pc, idx);
        self.stats.compiles += 1;
        debug!(
            pc = format_args!("{pc:#010x}"),
            size = info.size,
            icount = info.icount,
            host_bytes = code.size,
            "compiled block"
        );
        Ok(self.entry(idx))
    }

    /// Drop every block and reclaim the code buffer.
    pub fn flush(&mut self) {
        self.tb_store.flush();
        self.jump_cache.invalidate();
        self.code_buf.reset();
        self.flush_pending = false;
        self.stats.flushes += 1;
        debug!("block cache flushed");
    }

    /// Apply an invalidation queued by the guest.
    pub fn apply(&mut self, inv: Invalidation) {
        match inv {
            Invalidation::Range { start, end } => self.invalidate_range(start, end),
            Invalidation::All => self.invalidate_all(),
        }
    }
}

impl<B: HostCodeGen> CodeInvalidator for ExecEnv<B> {
    fn invalidate_range(&mut self, start: u32, end: u32) {
        let hit = self.tb_store.find_overlapping(start, end);
        for &idx in &hit {
            let pc = self.tb_store.get(idx).pc;
            self.tb_store.invalidate(idx);
            self.jump_cache.remove(pc, idx);
        }
        self.stats.invalidated += hit.len() as u64;
        debug!(
            start = format_args!("{start:#010x}"),
            end = format_args!("{end:#010x}"),
            blocks = hit.len(),
            "invalidate_range"
        );
    }

    fn invalidate_all(&mut self) {
        let n = self.tb_store.resident_count();
        self.tb_store.invalidate_all();
        self.jump_cache.invalidate();
        self.flush_pending = true;
        self.stats.invalidated += n as u64;
        debug!(blocks = n, "invalidate_all");
    }
}
