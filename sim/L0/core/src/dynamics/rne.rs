//! Recursive Newton-Euler algorithm for bias forces and inverse dynamics.
//!
//! Computes the bias force vector `c(q, qdot)` containing gravity, Coriolis,
//! and centrifugal forces for the equation of motion `M * qacc + c = τ`, the
//! full inverse dynamics `M * qacc + c`, and body spatial accelerations.

use nalgebra::DVector;

use crate::dynamics::spatial::{SpatialVector, spatial, spatial_cross_force};
use crate::types::{Data, Model};

/// Recursive Newton-Euler: compute bias forces (Coriolis + centrifugal + gravity).
///
/// Fills `qfrc_bias` with `c(q, qdot)` (inverse dynamics at zero
/// acceleration). Requires current position and velocity kinematics.
///
/// Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 5
pub fn mj_rne(model: &Model, data: &mut Data) {
    let zero = DVector::zeros(model.nv);
    let bias = rne(model, data, &zero, true);
    data.qfrc_bias = bias;
}

/// Inverse dynamics: `qfrc_inverse = M·qacc + c(q, qdot)`.
///
/// Requires current position and velocity kinematics.
pub fn mj_inverse(model: &Model, data: &mut Data) {
    let qacc = data.qacc.clone();
    let tau = rne(model, data, &qacc, true);
    data.qfrc_inverse = tau;
}

/// Body spatial accelerations `cacc` for the current `qacc`, gravity excluded.
///
/// ```text
/// a[b] = a[parent] + Σ (cdof_dot[d]·qvel[d] + cdof[d]·qacc[d])
/// ```
///
/// Point accelerations at body-fixed points follow from `cacc` and `cvel`
/// (see [`crate::point`]).
pub fn mj_body_accel(model: &Model, data: &mut Data) {
    data.cacc[0] = SpatialVector::zeros();
    for body_id in 1..model.nbody {
        let mut acc = data.cacc[model.body_parent[body_id]];
        let dof_start = model.body_dof_adr[body_id];
        for dof in dof_start..dof_start + model.body_dof_num[body_id] {
            acc += data.cdof_dot[dof] * data.qvel[dof] + data.cdof[dof] * data.qacc[dof];
        }
        data.cacc[body_id] = acc;
    }
}

/// Generalized force produced by the external body forces in `cfrc_ext`.
///
/// `τ[d] = cdof[d] · Σ cfrc_ext[b]` over the bodies `b` in the subtree moved
/// by DOF `d`. Requires position kinematics.
pub fn mj_xfrc_accumulate(model: &Model, data: &Data) -> DVector<f64> {
    let mut subtree = data.cfrc_ext.clone();
    for body_id in (1..model.nbody).rev() {
        let child = subtree[body_id];
        subtree[model.body_parent[body_id]] += child;
    }
    DVector::from_fn(model.nv, |dof, _| data.cdof[dof].dot(&subtree[model.dof_body[dof]]))
}

/// Shared RNE recursion. Leaves per-body accelerations (gravity included
/// as a fictitious base acceleration when `gravity` is set) in `cacc` and
/// subtree forces in `cfrc`, and returns the generalized forces.
fn rne(model: &Model, data: &mut Data, qacc: &DVector<f64>, gravity: bool) -> DVector<f64> {
    let mut tau = DVector::zeros(model.nv);
    if model.nv == 0 {
        return tau;
    }

    // Forward pass: accelerations and per-body net forces.
    data.cacc[0] = if gravity {
        spatial(&nalgebra::Vector3::zeros(), &(-model.gravity))
    } else {
        SpatialVector::zeros()
    };
    data.cfrc[0] = SpatialVector::zeros();
    for body_id in 1..model.nbody {
        let mut acc = data.cacc[model.body_parent[body_id]];
        let dof_start = model.body_dof_adr[body_id];
        for dof in dof_start..dof_start + model.body_dof_num[body_id] {
            acc += data.cdof_dot[dof] * data.qvel[dof] + data.cdof[dof] * qacc[dof];
        }
        data.cacc[body_id] = acc;

        let inertia = &data.cinert[body_id];
        let vel = data.cvel[body_id];
        data.cfrc[body_id] = inertia * acc + spatial_cross_force(vel, inertia * vel);
    }

    // Backward pass: subtree forces (all about the origin, so plain sums).
    for body_id in (1..model.nbody).rev() {
        let parent_id = model.body_parent[body_id];
        let child = data.cfrc[body_id];
        data.cfrc[parent_id] += child;
    }

    // Projection onto the motion subspaces.
    for dof in 0..model.nv {
        tau[dof] = data.cdof[dof].dot(&data.cfrc[model.dof_body[dof]]);
    }
    tau
}
