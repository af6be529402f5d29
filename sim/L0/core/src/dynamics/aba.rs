//! Articulated-body algorithm (ABA) and acceleration-delta propagation.
//!
//! The recursion runs over the DOF tree (`dof_parent`), treating every DOF
//! as a link of an articulated chain. A link carries the inertia of all
//! bodies whose deepest moving DOF it is (`Model::body_dof_leaf`). Since
//! spatial quantities are about the world origin, parent/child transforms
//! are identities and the passes reduce to plain sums.
//!
//! After [`mj_aba`] the articulated inertias (`aba_ia`, `aba_u`, `aba_d`)
//! stay valid for the configuration, so the joint-space response to any
//! set of external spatial forces can be propagated with
//! [`mj_aba_accel_delta`] in linear time, without forming or inverting
//! the mass matrix.
//!
//! Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 7

use nalgebra::{DVector, Matrix6, Vector3};

use crate::dynamics::spatial::{SpatialVector, spatial, spatial_cross_force};
use crate::types::{Data, Model};

/// Forward dynamics with the articulated-body algorithm.
///
/// Computes `qacc` from `qfrc_applied` and the per-body external forces in
/// `cfrc_ext` (world frame, about the origin), including gravity and
/// velocity-product terms. Requires position and velocity kinematics.
pub fn mj_aba(model: &Model, data: &mut Data) {
    let nv = model.nv;
    data.qacc.fill(0.0);
    if nv == 0 {
        data.aba_valid = true;
        return;
    }

    // Link inertias and velocity-product bias forces.
    for dof in 0..nv {
        data.aba_ia[dof] = Matrix6::zeros();
        data.aba_pa[dof] = SpatialVector::zeros();
    }
    for body_id in 1..model.nbody {
        let Some(leaf) = model.body_dof_leaf[body_id] else {
            continue; // welded to the world
        };
        let inertia = data.cinert[body_id];
        let vel = data.cvel[body_id];
        data.aba_ia[leaf] += inertia;
        data.aba_pa[leaf] += spatial_cross_force(vel, inertia * vel) - data.cfrc_ext[body_id];
    }

    // Backward pass: articulated inertias and bias forces.
    for dof in (0..nv).rev() {
        let s = data.cdof[dof];
        let u = data.aba_ia[dof] * s;
        let d = s.dot(&u);
        let tau = data.qfrc_applied[dof] - s.dot(&data.aba_pa[dof]);
        data.aba_u[dof] = u;
        data.aba_d[dof] = d;
        data.aba_tau[dof] = tau;

        if let Some(parent) = model.dof_parent[dof] {
            let bias_acc = data.cdof_dot[dof] * data.qvel[dof];
            let ia = data.aba_ia[dof] - u * u.transpose() / d;
            let pa = data.aba_pa[dof] + ia * bias_acc + u * (tau / d);
            data.aba_ia[parent] += ia;
            data.aba_pa[parent] += pa;
        }
    }

    // Forward pass: accelerations. Gravity enters as a base acceleration.
    let base_acc = spatial(&Vector3::zeros(), &(-model.gravity));
    for dof in 0..nv {
        let parent_acc = model.dof_parent[dof].map_or(base_acc, |p| data.aba_acc[p]);
        let acc = parent_acc + data.cdof_dot[dof] * data.qvel[dof];
        let qacc = (data.aba_tau[dof] - data.aba_u[dof].dot(&acc)) / data.aba_d[dof];
        data.qacc[dof] = qacc;
        data.aba_acc[dof] = acc + data.cdof[dof] * qacc;
    }

    data.aba_valid = true;
}

/// Joint-space acceleration change caused by extra spatial forces.
///
/// `cfrc[b]` is the force on body `b` (world frame, about the origin).
/// Reuses the articulated inertias of the last [`mj_aba`] call (which must
/// have run at the current configuration) with zero velocity, gravity and
/// joint forces, so the result is linear in `cfrc`. Returns `Δqacc` and
/// leaves the per-link acceleration change in `aba_acc`, from which body
/// `b`'s spatial acceleration change is `aba_acc[body_dof_leaf[b]]`.
///
/// # Panics
///
/// Panics if `cfrc.len() != model.nbody`.
pub fn mj_aba_accel_delta(model: &Model, data: &mut Data, cfrc: &[SpatialVector]) -> DVector<f64> {
    assert_eq!(cfrc.len(), model.nbody, "one spatial force per body");
    debug_assert!(data.aba_valid, "mj_aba must run before mj_aba_accel_delta");

    let nv = model.nv;
    let mut dqacc = DVector::zeros(nv);

    for dof in 0..nv {
        data.aba_pa[dof] = SpatialVector::zeros();
    }
    for body_id in 1..model.nbody {
        if let Some(leaf) = model.body_dof_leaf[body_id] {
            data.aba_pa[leaf] -= cfrc[body_id];
        }
    }

    for dof in (0..nv).rev() {
        let tau = -data.cdof[dof].dot(&data.aba_pa[dof]);
        data.aba_tau[dof] = tau;
        if let Some(parent) = model.dof_parent[dof] {
            let pa = data.aba_pa[dof] + data.aba_u[dof] * (tau / data.aba_d[dof]);
            data.aba_pa[parent] += pa;
        }
    }

    for dof in 0..nv {
        let acc = model.dof_parent[dof].map_or_else(SpatialVector::zeros, |p| data.aba_acc[p]);
        let qacc = (data.aba_tau[dof] - data.aba_u[dof].dot(&acc)) / data.aba_d[dof];
        dqacc[dof] = qacc;
        data.aba_acc[dof] = acc + data.cdof[dof] * qacc;
    }

    dqacc
}
