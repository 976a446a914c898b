use sh4jit_core::Context;

use crate::code_buffer::CodeBuffer;
use crate::liveness::liveness_analysis;
use crate::optimize::optimize;
use crate::regalloc::allocate_frame;
use crate::{CompiledCode, HostCodeGen};

/// Full translation pipeline: optimize → liveness → frame allocation →
/// lowering, then copy the finished code into `buf`.
///
/// On error nothing has been written to `buf`.
pub fn translate(
    ctx: &mut Context,
    backend: &mut (impl HostCodeGen + ?Sized),
    buf: &mut CodeBuffer,
) -> Result<CompiledCode, crate::BackendError> {
    optimize(ctx);
    liveness_analysis(ctx);
    let frame = allocate_frame(ctx)?;
    let code = backend.lower(ctx, &frame)?;
    let offset = buf.offset();
    buf.emit_bytes(&code)?;
    Ok(CompiledCode {
        offset,
        size: code.len(),
    })
}
