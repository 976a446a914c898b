//! Portable host target.
//!
//! Blocks are lowered to a compact byte stream (`emitter`), placed in the
//! shared [`CodeBuffer`](crate::CodeBuffer) and run by a small interpreter
//! (`exec`). Nothing in the stream is an absolute address, so the buffer
//! may grow or move between compiles.

pub mod codegen;
pub mod emitter;
pub mod exec;

pub use codegen::PortableCodeGen;
