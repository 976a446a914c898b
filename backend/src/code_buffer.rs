use tracing::debug;

use crate::error::BackendError;

/// Default initial code buffer size: 1 MiB.
pub const DEFAULT_CODE_BUF_SIZE: usize = 1024 * 1024;

/// Default upper bound the buffer may grow to: 16 MiB.
pub const DEFAULT_CODE_BUF_LIMIT: usize = 16 * 1024 * 1024;

/// Growable host code arena.
///
/// Blocks are addressed by offset, never by pointer, so the backing
/// storage is free to move when it grows. Growth stops at `limit`; past
/// that, [`reserve`](Self::reserve) reports [`BackendError::BufferFull`]
/// and the owner is expected to flush.
pub struct CodeBuffer {
    code: Vec<u8>,
    limit: usize,
    grows: u64,
    relocations: u64,
}

impl CodeBuffer {
    /// Create a buffer with `size` bytes reserved up front, growable up to
    /// `limit` bytes.
    pub fn new(size: usize, limit: usize) -> Self {
        let limit = limit.max(size);
        Self {
            code: Vec::with_capacity(size),
            limit,
            grows: 0,
            relocations: 0,
        }
    }

    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_CODE_BUF_SIZE, DEFAULT_CODE_BUF_LIMIT)
    }

    /// Current write offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    /// Bytes currently reserved.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.code.capacity()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes that can still be written before hitting the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.code.len()
    }

    /// Number of times the storage was enlarged.
    pub fn grow_count(&self) -> u64 {
        self.grows
    }

    /// Number of times the storage moved in memory.
    pub fn relocation_count(&self) -> u64 {
        self.relocations
    }

    /// Make room for `needed` more bytes, growing the storage if the limit
    /// allows it.
    pub fn reserve(&mut self, needed: usize) -> Result<(), BackendError> {
        let want = self.code.len() + needed;
        if want > self.limit {
            return Err(BackendError::BufferFull {
                needed,
                capacity: self.limit,
            });
        }
        if want > self.code.capacity() {
            let new_cap = (self.code.capacity() * 2).max(want).min(self.limit);
            let old = self.code.as_ptr();
            self.code.reserve_exact(new_cap - self.code.len());
            self.grows += 1;
            if self.code.as_ptr() != old {
                self.relocations += 1;
            }
            debug!(capacity = self.code.capacity(), "code buffer grew");
        }
        Ok(())
    }

    /// Move the storage to a fresh allocation, keeping its contents.
    pub fn relocate(&mut self) {
        let mut moved = Vec::with_capacity(self.code.capacity());
        moved.extend_from_slice(&self.code);
        self.code = moved;
        self.relocations += 1;
        debug!(bytes = self.code.len(), "code buffer relocated");
    }

    /// Set the write offset back to `offset`, discarding everything after.
    pub fn set_offset(&mut self, offset: usize) {
        assert!(offset <= self.code.len());
        self.code.truncate(offset);
    }

    /// Discard all code.
    pub fn reset(&mut self) {
        self.code.clear();
    }

    // -- Emit methods --

    pub fn emit_bytes(&mut self, data: &[u8]) -> Result<(), BackendError> {
        self.reserve(data.len())?;
        self.code.extend_from_slice(data);
        Ok(())
    }

    pub fn emit_u8(&mut self, val: u8) -> Result<(), BackendError> {
        self.emit_bytes(&[val])
    }

    pub fn emit_u32(&mut self, val: u32) -> Result<(), BackendError> {
        self.emit_bytes(&val.to_le_bytes())
    }

    /// Get the generated code as a byte slice (up to current offset).
    pub fn as_slice(&self) -> &[u8] {
        &self.code
    }
}
