/// A branch target label.
///
/// Labels support forward references: a branch may name a label before it
/// is placed. The IR builder only tracks placement; the backend's emitter
/// keeps its own label arena and records code offsets and pending uses,
/// which it patches in a second pass once every position is known.
#[derive(Debug, Clone)]
pub struct Label {
    pub id: u32,
    /// Whether this label has been placed.
    pub present: bool,
    /// Whether the target offset is known (resolved during emission).
    pub has_value: bool,
    /// Resolved offset in the block's host code.
    pub value: usize,
    /// References that need patching when the label is resolved.
    pub uses: Vec<LabelUse>,
}

/// A reference to a label: where the jump was emitted and how its
/// displacement is encoded.
#[derive(Debug, Clone, Copy)]
pub struct LabelUse {
    /// Offset of the displacement field within the block's code.
    pub offset: usize,
    /// Type of relocation needed.
    pub kind: RelocKind,
}

/// Relocation types for label patching.
///
/// Displacements are relative to the end of the jump instruction, which is
/// always the end of the displacement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocKind {
    /// Signed 8-bit displacement.
    Rel8,
    /// Signed 32-bit displacement.
    Rel32,
}

impl RelocKind {
    pub const fn size(self) -> usize {
        match self {
            RelocKind::Rel8 => 1,
            RelocKind::Rel32 => 4,
        }
    }
}

impl Label {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            present: false,
            has_value: false,
            value: 0,
            uses: Vec::new(),
        }
    }

    /// Record a reference to this label.
    pub fn add_use(&mut self, offset: usize, kind: RelocKind) {
        self.uses.push(LabelUse { offset, kind });
    }

    /// Mark this label as placed at the given code offset.
    pub fn set_value(&mut self, offset: usize) {
        self.present = true;
        self.has_value = true;
        self.value = offset;
    }

    /// Whether there are references that cannot be resolved yet.
    pub fn has_pending_uses(&self) -> bool {
        !self.uses.is_empty() && !self.has_value
    }
}
