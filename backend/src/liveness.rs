use sh4jit_core::op::LifeData;
use sh4jit_core::{Context, Opcode};

/// Perform backward liveness analysis over the IR ops in `ctx`.
///
/// Sets `LifeData` on each op marking the arguments whose value is not
/// used by any later op. Blocks only branch forward, so the linear op
/// order is a valid schedule and one reverse walk is exact.
pub fn liveness_analysis(ctx: &mut Context) {
    let nb_values = ctx.nb_values() as usize;
    let mut live = vec![false; nb_values];

    for oi in (0..ctx.num_ops()).rev() {
        let op = &ctx.ops()[oi];
        if matches!(op.opc, Opcode::Nop | Opcode::InsnStart) {
            continue;
        }
        let def = op.opc.def();
        let nb_oargs = def.nb_oargs as usize;
        let nb_iargs = def.nb_iargs as usize;
        let args = op.args;
        let mut life = LifeData(0);

        for (i, v) in args.iter().enumerate().take(nb_oargs) {
            let vi = v.index();
            if !live[vi] {
                life.set_dead(i as u32);
            }
            live[vi] = false;
        }

        for i in nb_oargs..nb_oargs + nb_iargs {
            let vi = args[i].index();
            if !live[vi] {
                // Last use
                life.set_dead(i as u32);
            }
            live[vi] = true;
        }

        ctx.ops_mut()[oi].life = life;
    }
}
