//! Forward kinematics and position-stage computations.
//!
//! Computes body poses, joint anchors/axes, per-DOF motion subspaces and
//! body spatial inertias from joint positions. Corresponds to the position
//! stage of MuJoCo's `engine_core_smooth.c` (`mj_kinematics` + `mj_comPos`),
//! except that spatial quantities are taken about the world origin rather
//! than the subtree center of mass.

use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};

use crate::dynamics::{SpatialVector, compute_body_spatial_inertia};
use crate::types::{Data, MjJointType, Model};

/// Forward kinematics: compute body poses, `cdof` and `cinert` from qpos.
///
/// Traverses the kinematic tree from root to leaves (bodies are stored in
/// topological order). Joints of one body are applied in declaration order,
/// each about its axis expressed in the frame produced by the previous ones.
pub fn mj_fwd_position(model: &Model, data: &mut Data) {
    // Body 0 (world) is always at origin
    data.xpos[0] = Vector3::zeros();
    data.xquat[0] = UnitQuaternion::identity();
    data.xmat[0] = Matrix3::identity();
    data.xipos[0] = Vector3::zeros();
    data.ximat[0] = Matrix3::identity();

    for body_id in 1..model.nbody {
        let parent_id = model.body_parent[body_id];

        // Parent frame + body offset
        let mut pos = data.xpos[parent_id] + data.xquat[parent_id] * model.body_pos[body_id];
        let mut quat = data.xquat[parent_id] * model.body_quat[body_id];

        let jnt_start = model.body_jnt_adr[body_id];
        let jnt_end = jnt_start + model.body_jnt_num[body_id];

        for jnt_id in jnt_start..jnt_end {
            let qpos = data.qpos[model.jnt_qpos_adr[jnt_id]];
            let world_axis = quat * model.jnt_axis[jnt_id];
            let world_anchor = pos + quat * model.jnt_pos[jnt_id];
            data.xaxis[jnt_id] = world_axis;
            data.xanchor[jnt_id] = world_anchor;

            match model.jnt_type[jnt_id] {
                MjJointType::Hinge => {
                    // Axis is unit length by construction (normalized in push_body).
                    let rot = UnitQuaternion::from_axis_angle(
                        &Unit::new_unchecked(world_axis),
                        qpos,
                    );
                    quat = rot * quat;
                    // Rotating about an off-origin anchor also moves the frame origin.
                    pos = world_anchor + rot * (pos - world_anchor);
                }
                MjJointType::Slide => {
                    pos += world_axis * qpos;
                }
            }

            let dof = model.jnt_dof_adr[jnt_id];
            data.cdof[dof] = motion_subspace(model.jnt_type[jnt_id], &world_axis, &world_anchor);
        }

        // Renormalize to keep drift from accumulating over long chains.
        let quat = UnitQuaternion::new_normalize(quat.into_inner());
        data.xpos[body_id] = pos;
        data.xquat[body_id] = quat;
        data.xmat[body_id] = quat.to_rotation_matrix().into_inner();

        data.xipos[body_id] = pos + quat * model.body_ipos[body_id];
        data.ximat[body_id] = (quat * model.body_iquat[body_id])
            .to_rotation_matrix()
            .into_inner();

        data.cinert[body_id] = compute_body_spatial_inertia(
            model.body_mass[body_id],
            model.body_inertia[body_id],
            &data.ximat[body_id],
            data.xipos[body_id],
        );
    }

    data.qLD_valid = false;
    data.aba_valid = false;
}

/// Motion subspace of a single-axis joint about the world origin.
///
/// | Joint | angular | linear          |
/// |-------|---------|-----------------|
/// | Hinge | `a`     | `anchor × a`    |
/// | Slide | `0`     | `a`             |
#[must_use]
pub fn motion_subspace(
    jnt_type: MjJointType,
    axis: &Vector3<f64>,
    anchor: &Vector3<f64>,
) -> SpatialVector {
    match jnt_type {
        MjJointType::Hinge => {
            let lin = anchor.cross(axis);
            SpatialVector::new(axis.x, axis.y, axis.z, lin.x, lin.y, lin.z)
        }
        MjJointType::Slide => SpatialVector::new(0.0, 0.0, 0.0, axis.x, axis.y, axis.z),
    }
}
