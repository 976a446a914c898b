use std::collections::HashMap;

use crate::label::Label;
use crate::op::{Op, OpIdx};
use crate::value::{Value, ValueInfo};

/// Maximum number of guest instructions per block.
pub const MAX_INSNS: usize = 512;
/// Default size of the guest register file seen by the builder.
pub const DEFAULT_GUEST_REGS: usize = 64;

/// Translation context for one block.
///
/// Holds the value pool, the op list and the label arena while a block is
/// being built, plus the per-block guest register cache that lets repeated
/// reads of a register share one IR value.
pub struct Context {
    values: Vec<ValueInfo>,
    ops: Vec<Op>,
    labels: Vec<Label>,

    // -- Constant deduplication --
    const_table: HashMap<u32, Value>,

    // -- Guest register cache --
    /// Current IR value of each guest register, if known.
    pub(crate) reg_cache: Vec<Option<Value>>,

    /// Set once a terminal op has been emitted.
    pub(crate) closed: bool,

    /// Guest pc of the first instruction, recorded by the translator.
    pub pc_first: u32,
}

impl Context {
    pub fn new() -> Self {
        Self::with_guest_regs(DEFAULT_GUEST_REGS)
    }

    pub fn with_guest_regs(nb_regs: usize) -> Self {
        Self {
            values: Vec::with_capacity(256),
            ops: Vec::with_capacity(512),
            labels: Vec::with_capacity(8),
            const_table: HashMap::new(),
            reg_cache: vec![None; nb_regs],
            closed: false,
            pc_first: 0,
        }
    }

    /// Reset context for translating a new block.
    pub fn reset(&mut self) {
        self.values.clear();
        self.ops.clear();
        self.labels.clear();
        self.const_table.clear();
        self.reg_cache.iter_mut().for_each(|r| *r = None);
        self.closed = false;
        self.pc_first = 0;
    }

    // -- Value allocation --

    pub fn nb_values(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn nb_guest_regs(&self) -> usize {
        self.reg_cache.len()
    }

    /// Allocate a fresh value to be produced by the next op.
    pub fn new_value(&mut self) -> Value {
        let idx = Value(self.values.len() as u32);
        self.values.push(ValueInfo::computed());
        idx
    }

    /// Get or create a constant value (deduplicated).
    pub fn new_const(&mut self, val: u32) -> Value {
        if let Some(&existing) = self.const_table.get(&val) {
            return existing;
        }
        let idx = Value(self.values.len() as u32);
        self.values.push(ValueInfo::constant(val));
        self.const_table.insert(val, idx);
        idx
    }

    pub fn value(&self, v: Value) -> &ValueInfo {
        &self.values[v.index()]
    }

    pub fn value_mut(&mut self, v: Value) -> &mut ValueInfo {
        &mut self.values[v.index()]
    }

    pub fn values(&self) -> &[ValueInfo] {
        &self.values
    }

    /// The constant a value holds, if it is one.
    pub fn const_val(&self, v: Value) -> Option<u32> {
        let info = self.value(v);
        info.is_const().then_some(info.val)
    }

    // -- Op emission --

    pub fn emit_op(&mut self, op: Op) -> OpIdx {
        assert!(!self.closed, "op emitted after the block terminal");
        let idx = op.idx;
        if op.opc.is_terminal() {
            self.closed = true;
        }
        self.ops.push(op);
        idx
    }

    pub fn next_op_idx(&self) -> OpIdx {
        OpIdx(self.ops.len() as u32)
    }

    pub fn op(&self, idx: OpIdx) -> &Op {
        &self.ops[idx.0 as usize]
    }

    pub fn op_mut(&mut self, idx: OpIdx) -> &mut Op {
        &mut self.ops[idx.0 as usize]
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn ops_mut(&mut self) -> &mut [Op] {
        &mut self.ops
    }

    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether the block already has its terminal op.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The terminal op, once the block is closed.
    pub fn terminal(&self) -> Option<&Op> {
        self.ops.last().filter(|op| op.opc.is_terminal())
    }

    // -- Labels --

    pub fn new_label(&mut self) -> u32 {
        let id = self.labels.len() as u32;
        self.labels.push(Label::new(id));
        id
    }

    pub fn label(&self, id: u32) -> &Label {
        &self.labels[id as usize]
    }

    pub fn label_mut(&mut self, id: u32) -> &mut Label {
        &mut self.labels[id as usize]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
