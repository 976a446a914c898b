use crate::opcode::Opcode;
use crate::value::Value;

/// Maximum number of arguments per IR operation.
pub const MAX_OP_ARGS: usize = 6;

/// Index into the Context's op list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpIdx(pub u32);

/// Liveness data for an op's arguments: one "dead after this op" bit per
/// argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifeData(pub u32);

impl LifeData {
    pub const fn dead_arg(n: u32) -> u32 {
        1 << n
    }

    pub fn is_dead(&self, n: u32) -> bool {
        self.0 & Self::dead_arg(n) != 0
    }

    pub fn set_dead(&mut self, n: u32) {
        self.0 |= Self::dead_arg(n);
    }
}

/// A single IR operation.
///
/// Arguments are laid out as outputs, then inputs, then constant args; the
/// split is given by the opcode's [`OpDef`](crate::OpDef).
#[derive(Debug, Clone)]
pub struct Op {
    pub idx: OpIdx,
    pub opc: Opcode,
    /// Liveness analysis results.
    pub life: LifeData,
    /// Arguments: value handles, label ids, or encoded immediates.
    pub args: [Value; MAX_OP_ARGS],
    pub nargs: u8,
}

impl Op {
    pub fn new(idx: OpIdx, opc: Opcode) -> Self {
        Self {
            idx,
            opc,
            life: LifeData::default(),
            args: [Value(0); MAX_OP_ARGS],
            nargs: 0,
        }
    }

    pub fn with_args(idx: OpIdx, opc: Opcode, args: &[Value]) -> Self {
        let mut op = Self::new(idx, opc);
        let n = args.len().min(MAX_OP_ARGS);
        op.args[..n].copy_from_slice(&args[..n]);
        op.nargs = n as u8;
        op
    }

    /// Get the output arguments slice (based on opcode definition).
    pub fn oargs(&self) -> &[Value] {
        let n = self.opc.def().nb_oargs as usize;
        &self.args[..n]
    }

    /// Get the input arguments slice.
    pub fn iargs(&self) -> &[Value] {
        let def = self.opc.def();
        let start = def.nb_oargs as usize;
        let end = start + def.nb_iargs as usize;
        &self.args[start..end]
    }

    pub fn iargs_mut(&mut self) -> &mut [Value] {
        let def = self.opc.def();
        let start = def.nb_oargs as usize;
        let end = start + def.nb_iargs as usize;
        &mut self.args[start..end]
    }

    /// Get the constant arguments slice.
    pub fn cargs(&self) -> &[Value] {
        let def = self.opc.def();
        let start = (def.nb_oargs + def.nb_iargs) as usize;
        let end = start + def.nb_cargs as usize;
        &self.args[start..end]
    }

    /// Turn this op into a no-op in place, keeping its index.
    pub fn make_nop(&mut self) {
        self.opc = Opcode::Nop;
        self.nargs = 0;
        self.life = LifeData::default();
    }
}
