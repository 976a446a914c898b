/// How an IR value comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    /// Produced by exactly one op of the block.
    Computed,
    /// Compile-time constant; never produced by an op.
    Const,
}

/// Handle to an IR value, an index into the Context's value pool.
///
/// Constant operands of ops (conditions, labels, register ids) are stored
/// in the same argument array and reuse this type as a raw `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub u32);

impl Value {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-value bookkeeping.
#[derive(Debug, Clone)]
pub struct ValueInfo {
    pub kind: ValueKind,
    /// The immediate, valid when `kind == Const`.
    pub val: u32,
    /// Guest register this value was read from or written to, for dumps.
    pub reg_hint: Option<u32>,
}

impl ValueInfo {
    pub fn computed() -> Self {
        Self {
            kind: ValueKind::Computed,
            val: 0,
            reg_hint: None,
        }
    }

    pub fn constant(val: u32) -> Self {
        Self {
            kind: ValueKind::Const,
            val,
            reg_hint: None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.kind == ValueKind::Const
    }
}
