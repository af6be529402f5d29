//! Kinematics of body-fixed points.
//!
//! A point is given by its body id and its offset in body coordinates. The
//! world-frame spatial quantities in [`Data`] are about the origin, so the
//! velocity of a world point `p` on body `b` is `lin(cvel[b]) + ω × p`, and
//! its classical acceleration adds the `ω × v` transport term.

use nalgebra::{DVector, Vector3};

use crate::dynamics::{SpatialVector, angular, linear, mj_body_accel};
use crate::types::{Data, Model};

/// World position of a body-fixed point. Requires position kinematics.
#[must_use]
pub fn point_position(model: &Model, data: &Data, body_id: usize, local: &Vector3<f64>) -> Vector3<f64> {
    debug_assert!(body_id < model.nbody);
    data.xpos[body_id] + data.xquat[body_id] * local
}

/// World velocity of a body-fixed point. Requires velocity kinematics.
#[must_use]
pub fn point_velocity(model: &Model, data: &Data, body_id: usize, local: &Vector3<f64>) -> Vector3<f64> {
    let point = point_position(model, data, body_id, local);
    velocity_at(&data.cvel[body_id], &point)
}

/// Classical world acceleration of a body-fixed point, gravity excluded.
///
/// Reads `cacc`, so [`mj_body_accel`] must have run for the current `qacc`.
#[must_use]
pub fn point_acceleration(
    model: &Model,
    data: &Data,
    body_id: usize,
    local: &Vector3<f64>,
) -> Vector3<f64> {
    let point = point_position(model, data, body_id, local);
    acceleration_at(&data.cvel[body_id], &data.cacc[body_id], &point)
}

/// Point acceleration at zero joint acceleration (`J̇·qvel`), gravity
/// excluded, for a world point `point` attached to `body_id`.
///
/// Walks the body's DOF chain instead of reading `cacc`, so it only needs
/// velocity kinematics.
#[must_use]
pub fn point_bias_acceleration(
    model: &Model,
    data: &Data,
    body_id: usize,
    point: &Vector3<f64>,
) -> Vector3<f64> {
    let mut bias = SpatialVector::zeros();
    let mut dof = model.body_dof_leaf[body_id];
    while let Some(d) = dof {
        bias += data.cdof_dot[d] * data.qvel[d];
        dof = model.dof_parent[d];
    }
    acceleration_at(&data.cvel[body_id], &bias, point)
}

/// Load `qpos`/`qvel` into `data`, update kinematics, and return the point
/// velocity.
///
/// # Panics
///
/// Panics if the state vectors do not match the model dimensions.
#[must_use]
pub fn point_velocity_at(
    model: &Model,
    data: &mut Data,
    qpos: &DVector<f64>,
    qvel: &DVector<f64>,
    body_id: usize,
    local: &Vector3<f64>,
) -> Vector3<f64> {
    data.set_state(model, qpos, qvel);
    point_velocity(model, data, body_id, local)
}

/// Load a full state including `qacc`, update kinematics and body
/// accelerations, and return the point acceleration.
///
/// # Panics
///
/// Panics if the state vectors do not match the model dimensions.
#[must_use]
pub fn point_acceleration_at(
    model: &Model,
    data: &mut Data,
    qpos: &DVector<f64>,
    qvel: &DVector<f64>,
    qacc: &DVector<f64>,
    body_id: usize,
    local: &Vector3<f64>,
) -> Vector3<f64> {
    assert_eq!(qacc.len(), model.nv, "qacc length must equal nv");
    data.set_state(model, qpos, qvel);
    data.qacc.copy_from(qacc);
    mj_body_accel(model, data);
    point_acceleration(model, data, body_id, local)
}

fn velocity_at(vel: &SpatialVector, point: &Vector3<f64>) -> Vector3<f64> {
    linear(vel) + angular(vel).cross(point)
}

fn acceleration_at(vel: &SpatialVector, acc: &SpatialVector, point: &Vector3<f64>) -> Vector3<f64> {
    let omega = angular(vel);
    let v_point = linear(vel) + omega.cross(point);
    linear(acc) + angular(acc).cross(point) + omega.cross(&v_point)
}
