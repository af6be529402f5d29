//! Point and body Jacobians, and force projection into joint space.
//!
//! Every column is read straight off the world-frame motion subspace: for
//! DOF `d` moving body `b`, the velocity of a world point `p` rigidly
//! attached to `b` is `lin(cdof[d]) + ang(cdof[d]) × p` per unit `qvel[d]`.
//! Only DOFs on `b`'s `dof_parent` chain contribute, so the walk starts at
//! `body_dof_leaf[b]` and never touches other branches.

use crate::dynamics::{angular, linear};
use crate::types::{Data, Model};
use nalgebra::{DMatrix, DVector, Vector3};

/// Compute the full body Jacobian at a world-frame point: 3×nv translational
/// and 3×nv rotational.
///
/// | Joint type | `jacp` column  | `jacr` column |
/// |------------|----------------|---------------|
/// | Hinge      | `axis × r`     | `axis`        |
/// | Slide      | `axis`         | `0`           |
///
/// where `r = point − anchor` and `axis` is the world-frame joint axis.
/// Requires position kinematics.
#[must_use]
#[allow(clippy::similar_names)] // jacp/jacr
pub fn mj_jac(
    model: &Model,
    data: &Data,
    body_id: usize,
    point: &Vector3<f64>,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let mut jacp = DMatrix::zeros(3, model.nv);
    let mut jacr = DMatrix::zeros(3, model.nv);

    let mut dof = model.body_dof_leaf[body_id];
    while let Some(d) = dof {
        let omega = angular(&data.cdof[d]);
        let vel = linear(&data.cdof[d]) + omega.cross(point);
        jacp.fixed_view_mut::<3, 1>(0, d).copy_from(&vel);
        jacr.fixed_view_mut::<3, 1>(0, d).copy_from(&omega);
        dof = model.dof_parent[d];
    }

    (jacp, jacr)
}

/// Translational 3×nv Jacobian of a world point attached to `body_id`.
#[must_use]
pub fn mj_jac_point(model: &Model, data: &Data, body_id: usize, point: &Vector3<f64>) -> DMatrix<f64> {
    let mut jacp = DMatrix::zeros(3, model.nv);
    let mut dof = model.body_dof_leaf[body_id];
    while let Some(d) = dof {
        let vel = linear(&data.cdof[d]) + angular(&data.cdof[d]).cross(point);
        jacp.fixed_view_mut::<3, 1>(0, d).copy_from(&vel);
        dof = model.dof_parent[d];
    }
    jacp
}

/// Jacobian at the body frame origin.
#[must_use]
pub fn mj_jac_body(model: &Model, data: &Data, body_id: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    mj_jac(model, data, body_id, &data.xpos[body_id])
}

/// Project a world-frame force and torque applied at `point` on `body_id`
/// into joint space: `qfrc += jacpᵀ·force + jacrᵀ·torque`.
pub fn mj_apply_ft(
    model: &Model,
    data: &Data,
    force: &Vector3<f64>,
    torque: &Vector3<f64>,
    point: &Vector3<f64>,
    body_id: usize,
    qfrc: &mut DVector<f64>,
) {
    let mut dof = model.body_dof_leaf[body_id];
    while let Some(d) = dof {
        let omega = angular(&data.cdof[d]);
        let vel = linear(&data.cdof[d]) + omega.cross(point);
        qfrc[d] += vel.dot(force) + omega.dot(torque);
        dof = model.dof_parent[d];
    }
}
