pub mod code_buffer;
pub mod error;
pub mod host;
pub mod liveness;
pub mod optimize;
pub mod regalloc;
pub mod translate;

pub use code_buffer::CodeBuffer;
pub use error::BackendError;
pub use host::PortableCodeGen;
pub use regalloc::FrameLayout;

use sh4jit_core::{Context, GuestEnv, TbExit};

/// Location of a compiled block inside the [`CodeBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledCode {
    /// Offset of the block's entry.
    pub offset: usize,
    pub size: usize,
}

/// Trait for host code generators.
///
/// A backend turns finished block IR into host code and knows how to run
/// it. Code is referred to by buffer offset only.
pub trait HostCodeGen {
    /// Emit host code for `ctx` using the slot assignment in `frame`.
    /// Returns the block's bytes; labels are already resolved.
    fn lower(&mut self, ctx: &Context, frame: &FrameLayout) -> Result<Vec<u8>, BackendError>;

    /// Run the block at `entry` against `env` until it exits.
    fn execute(&self, buf: &CodeBuffer, entry: usize, env: &mut dyn GuestEnv) -> Result<TbExit, BackendError>;

    /// Optimize, allocate and lower `ctx`, appending the result to `buf`.
    fn compile(&mut self, ctx: &mut Context, buf: &mut CodeBuffer) -> Result<CompiledCode, BackendError> {
        translate::translate(ctx, self, buf)
    }
}
