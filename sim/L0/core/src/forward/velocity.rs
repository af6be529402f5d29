//! Velocity-stage forward kinematics.
//!
//! Computes body spatial velocities and the time derivatives of the motion
//! subspaces from joint velocities.

use crate::dynamics::{SpatialVector, spatial_cross_motion};
use crate::types::{Data, Model};

/// Velocity kinematics: compute `cvel` and `cdof_dot` from qvel.
///
/// All quantities are about the world origin, so the parent velocity is
/// inherited without a lever-arm transform:
///
/// ```text
/// v[b] = v[parent] + Σ cdof[d]·qvel[d]        (d over the DOFs of b)
/// cdof_dot[d] = v_before(d) ×ₘ cdof[d]
/// ```
///
/// where `v_before(d)` is the velocity of the frame the DOF's axis is fixed
/// in: the parent velocity plus the DOFs of `b` declared before `d`.
pub fn mj_fwd_velocity(model: &Model, data: &mut Data) {
    data.cvel[0] = SpatialVector::zeros();

    for body_id in 1..model.nbody {
        let mut vel = data.cvel[model.body_parent[body_id]];

        let dof_start = model.body_dof_adr[body_id];
        let dof_end = dof_start + model.body_dof_num[body_id];
        for dof in dof_start..dof_end {
            data.cdof_dot[dof] = spatial_cross_motion(vel, data.cdof[dof]);
            vel += data.cdof[dof] * data.qvel[dof];
        }

        data.cvel[body_id] = vel;
    }
}
