//! Contact row kinematics: Jacobian, acceleration targets, errors and
//! force recovery.

use nalgebra::{DVector, Vector3};
use sim_core::dynamics::{angular, linear, spatial};
use sim_core::forward::mj_fwd_position;
use sim_core::{Model, SpatialVector, point_bias_acceleration, point_position, point_velocity};
use tracing::trace;

use crate::constraint_set::{ConstraintSet, stabilization_force};
use crate::error::{ConstraintError, check_len};
use crate::types::{GroupForces, SpatialFrame};

impl ConstraintSet {
    /// Fill `G`, `gamma`, `stabilization` and the world contact points from
    /// the current kinematics in the workspace.
    ///
    /// Row `i` of `G` is `nᵢᵀ·J(pᵢ)`; `γᵢ = -nᵢ·(J̇·q̇)(pᵢ) + sᵢ` where `sᵢ`
    /// is the Baumgarte term of the row's group (zero when disabled).
    pub(crate) fn compute_contact_rows(&mut self, model: &Model) -> Result<(), ConstraintError> {
        let Self {
            rows,
            groups,
            binding,
            ..
        } = self;
        let ws = &mut binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
        let data = &ws.data;

        ws.G.fill(0.0);
        for (i, row) in rows.iter().enumerate() {
            let point = point_position(model, data, row.body_id, &row.point);
            ws.points[i] = point;

            let mut dof = model.body_dof_leaf[row.body_id];
            while let Some(d) = dof {
                let vel = linear(&data.cdof[d]) + angular(&data.cdof[d]).cross(&point);
                ws.G[(i, d)] = row.normal.dot(&vel);
                dof = model.dof_parent[d];
            }

            let group = &groups[row.group];
            let stab = if group.baumgarte_enabled {
                // Contacts have no position-level error.
                let velocity_error = row.normal.dot(&point_velocity(model, data, row.body_id, &row.point));
                stabilization_force(&group.baumgarte, 0.0, velocity_error)
            } else {
                0.0
            };
            ws.stabilization[i] = stab;
            ws.gamma[i] = -row.normal.dot(&point_bias_acceleration(model, data, row.body_id, &point)) + stab;
            trace!(row = i, body = row.body_id, gamma = ws.gamma[i], "contact row");
        }
        Ok(())
    }

    /// Forces of one group from the multipliers of the last solve.
    ///
    /// Index 0 is the contact point frame on the body (`r` = body-local
    /// point) carrying the force on the body in body coordinates; index 1
    /// is the base frame carrying the reaction on the ground, including its
    /// moment about the base origin. With `resolve_in_base_frame`, index 0
    /// is reported on body 0 at the world contact point in base
    /// coordinates instead.
    ///
    /// `q`/`qdot` are only read when `update_kinematics` is set; otherwise
    /// the kinematics of the last solver call are used.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`], [`ConstraintError::InvalidGroupIndex`]
    /// or [`ConstraintError::DimensionMismatch`].
    pub fn calc_forces(
        &mut self,
        group: usize,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        update_kinematics: bool,
        resolve_in_base_frame: bool,
    ) -> Result<GroupForces, ConstraintError> {
        let group_rows = self.group(group)?.rows.clone();
        if update_kinematics {
            self.prepare_state(model, q, qdot)?;
        } else {
            self.check_model(model)?;
        }
        let binding = self.binding()?;
        let data = &binding.workspace.data;
        let body_id = self.groups[group].body_id;
        let local = self.groups[group].point;
        let world = point_position(model, data, body_id, &local);
        let to_body = data.xquat[body_id].inverse();

        let split = |force: Vector3<f64>| -> [SpatialVector; 2] {
            let on_body = if resolve_in_base_frame {
                force
            } else {
                to_body * force
            };
            let reaction = -force;
            [
                spatial(&Vector3::zeros(), &on_body),
                spatial(&world.cross(&reaction), &reaction),
            ]
        };

        let mut total = Vector3::zeros();
        let mut row_forces = Vec::with_capacity(group_rows.len());
        for r in group_rows {
            let force = self.rows[r].normal * self.force[r];
            total += force;
            row_forces.push(split(force));
        }

        let (body_ids, frame0) = if resolve_in_base_frame {
            ([0, 0], SpatialFrame::at(world))
        } else {
            ([body_id, 0], SpatialFrame::at(local))
        };
        Ok(GroupForces {
            body_ids,
            frames: [frame0, SpatialFrame::at(Vector3::zeros())],
            forces: split(total),
            row_forces,
        })
    }

    /// Position-level error of each row of a group.
    ///
    /// A contact only restricts how its point moves, not where it is, so
    /// the error is identically zero. The configuration is still validated
    /// (and loaded when `update_kinematics` is set).
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`], [`ConstraintError::InvalidGroupIndex`]
    /// or [`ConstraintError::DimensionMismatch`].
    pub fn calc_position_error(
        &mut self,
        group: usize,
        model: &Model,
        q: &DVector<f64>,
        update_kinematics: bool,
    ) -> Result<DVector<f64>, ConstraintError> {
        let nrows = self.group(group)?.len();
        self.check_model(model)?;
        check_len("q", model.nq, q.len())?;
        if update_kinematics {
            let binding = self.binding.as_mut().ok_or(ConstraintError::NotBound)?;
            binding.workspace.data.qpos.copy_from(q);
            mj_fwd_position(model, &mut binding.workspace.data);
        }
        Ok(DVector::zeros(nrows))
    }

    /// Velocity-level error of each row of a group: `nᵢ·v(pᵢ)`.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`], [`ConstraintError::InvalidGroupIndex`]
    /// or [`ConstraintError::DimensionMismatch`].
    pub fn calc_velocity_error(
        &mut self,
        group: usize,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        update_kinematics: bool,
    ) -> Result<DVector<f64>, ConstraintError> {
        let group_rows = self.group(group)?.rows.clone();
        if update_kinematics {
            self.prepare_state(model, q, qdot)?;
        } else {
            self.check_model(model)?;
        }
        let data = &self.binding()?.workspace.data;
        Ok(DVector::from_iterator(
            group_rows.len(),
            self.rows[group_rows].iter().map(|row| {
                row.normal.dot(&point_velocity(model, data, row.body_id, &row.point))
            }),
        ))
    }
}
