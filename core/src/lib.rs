pub mod context;
pub mod dump;
pub mod env;
pub mod ir_builder;
pub mod label;
pub mod op;
pub mod opcode;
pub mod tb;
pub mod types;
pub mod value;

pub use context::Context;
pub use env::{CodeInvalidator, GuestEnv, GuestMemory};
pub use ir_builder::{CALL_NO_REG_ACCESS, MAX_CALL_ARGS};
pub use label::{Label, LabelUse, RelocKind};
pub use op::{LifeData, Op, OpIdx, MAX_OP_ARGS};
pub use opcode::{OpDef, OpFlags, Opcode, OPCODE_DEFS};
pub use tb::{
    JumpCache, TbExit, TbState, TranslationBlock, TB_HASH_SIZE,
    TB_JMP_CACHE_SIZE,
};
pub use types::{Cond, MemOp};
pub use value::{Value, ValueInfo, ValueKind};
