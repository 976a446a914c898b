use sh4jit_core::{Context, Opcode, Value};

use crate::error::BackendError;
use crate::host::emitter::Slot;

/// Frame layout for one block: where every value lives while it is live.
///
/// Constants get dedicated slots that are filled once at block entry.
/// Computed values share slots: a slot is returned to the free list after
/// the op holding the value's last use, so a block needs only as many
/// slots as its peak number of simultaneously live values.
#[derive(Debug, Default)]
pub struct FrameLayout {
    slots: Vec<Option<Slot>>,
    /// `(slot, value)` pairs to materialize at block entry.
    pub consts: Vec<(Slot, u32)>,
    pub nslots: usize,
}

impl FrameLayout {
    /// Slot holding `v`. Only valid for values used by a live op.
    pub fn slot(&self, v: Value) -> Slot {
        self.slots.get(v.index()).copied().flatten().unwrap_or(0)
    }
}

/// Slot allocator state.
struct SlotAllocState {
    free: Vec<Slot>,
    next: usize,
}

impl SlotAllocState {
    fn alloc(&mut self) -> Result<Slot, BackendError> {
        if let Some(s) = self.free.pop() {
            return Ok(s);
        }
        let s = Slot::try_from(self.next).map_err(|_| BackendError::FrameOverflow(self.next + 1))?;
        self.next += 1;
        Ok(s)
    }

    fn release(&mut self, s: Slot) {
        self.free.push(s);
    }
}

/// Assign frame slots to the values of a block. Requires liveness data.
pub fn allocate_frame(ctx: &Context) -> Result<FrameLayout, BackendError> {
    let mut layout = FrameLayout {
        slots: vec![None; ctx.nb_values() as usize],
        ..FrameLayout::default()
    };
    let mut state = SlotAllocState {
        free: Vec::new(),
        next: 0,
    };

    // Constants referenced by live ops.
    for op in ctx.ops() {
        if matches!(op.opc, Opcode::Nop | Opcode::InsnStart) {
            continue;
        }
        for &v in op.iargs() {
            if let Some(val) = ctx.const_val(v) {
                if layout.slots[v.index()].is_none() {
                    let s = state.alloc()?;
                    layout.slots[v.index()] = Some(s);
                    layout.consts.push((s, val));
                }
            }
        }
    }

    for op in ctx.ops() {
        if matches!(op.opc, Opcode::Nop | Opcode::InsnStart) {
            continue;
        }
        let def = op.opc.def();
        let nb_oargs = def.nb_oargs as usize;

        // Inputs whose last use is this op give their slot back first, so
        // the output may reuse it: every op reads all inputs before it
        // writes its output.
        for (i, &v) in op.iargs().iter().enumerate() {
            if op.life.is_dead((nb_oargs + i) as u32) && ctx.const_val(v).is_none() {
                if let Some(s) = layout.slots[v.index()] {
                    state.release(s);
                }
            }
        }

        for (i, &v) in op.oargs().iter().enumerate() {
            let s = state.alloc()?;
            layout.slots[v.index()] = Some(s);
            if op.life.is_dead(i as u32) {
                state.release(s);
            }
        }
    }

    layout.nslots = state.next;
    Ok(layout)
}
