use thiserror::Error;

/// Failures while compiling or running a block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The code buffer cannot take `needed` more bytes without exceeding
    /// its limit. The block cache flushes and retries once.
    #[error("code buffer full: {needed} bytes needed, limit {capacity}")]
    BufferFull { needed: usize, capacity: usize },

    /// A short jump was requested to a label further than rel8 reaches.
    #[error("label L{label} out of range for short jump (displacement {disp})")]
    LabelOutOfRange { label: u32, disp: i64 },

    #[error("label L{0} referenced but never placed")]
    UnboundLabel(u32),

    /// More live values than the frame can address.
    #[error("block needs {0} frame slots")]
    FrameOverflow(usize),

    /// Executed bytes that do not form a valid host instruction.
    #[error("corrupt host code at offset {offset:#x}")]
    Corrupt { offset: usize },
}
