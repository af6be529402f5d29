//! Model construction: empty model, body/joint assembly, and `make_data`.
//!
//! Bodies are appended one at a time with [`Model::add_body`]; every call
//! keeps the derived arrays (`dof_parent`, `body_dof_leaf`, the LDL sparsity
//! layout, `qpos0`) consistent, so a model is usable after each addition.

use nalgebra::{DMatrix, DVector, Matrix3, Matrix6, UnitQuaternion, Vector3};

use super::data::Data;
use super::enums::{MjJointType, ModelError};
use super::model::Model;
use crate::dynamics::SpatialVector;

/// Axes shorter than this are rejected.
const MIN_AXIS_NORM: f64 = 1e-12;

/// Inertial and placement description of a body to be added.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    /// Body mass.
    pub mass: f64,
    /// Center of mass in the body frame.
    pub com: Vector3<f64>,
    /// Principal moments of inertia about the center of mass.
    pub inertia: Vector3<f64>,
    /// Principal inertia frame orientation in the body frame.
    pub iquat: UnitQuaternion<f64>,
    /// Body frame offset in the parent frame.
    pub pos: Vector3<f64>,
    /// Body frame orientation relative to the parent frame.
    pub quat: UnitQuaternion<f64>,
    /// Optional name.
    pub name: Option<String>,
}

impl BodySpec {
    /// Body with the given mass, center of mass and principal inertia,
    /// placed at the parent frame origin.
    #[must_use]
    pub fn new(mass: f64, com: Vector3<f64>, inertia: Vector3<f64>) -> Self {
        Self {
            mass,
            com,
            inertia,
            iquat: UnitQuaternion::identity(),
            pos: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            name: None,
        }
    }

    /// Set the body frame offset in the parent frame.
    #[must_use]
    pub fn at(mut self, pos: Vector3<f64>) -> Self {
        self.pos = pos;
        self
    }

    /// Set the body frame orientation relative to the parent frame.
    #[must_use]
    pub fn oriented(mut self, quat: UnitQuaternion<f64>) -> Self {
        self.quat = quat;
        self
    }

    /// Set the principal inertia frame orientation.
    #[must_use]
    pub fn with_inertia_frame(mut self, iquat: UnitQuaternion<f64>) -> Self {
        self.iquat = iquat;
        self
    }

    /// Set the body name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Single-axis joint description, in the frame of the body it moves.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSpec {
    /// Joint type.
    pub jnt_type: MjJointType,
    /// Joint axis (normalized on insertion).
    pub axis: Vector3<f64>,
    /// Anchor in the body frame (hinges only).
    pub pos: Vector3<f64>,
    /// Optional name.
    pub name: Option<String>,
}

impl JointSpec {
    /// Hinge about `axis` through the body origin.
    #[must_use]
    pub fn hinge(axis: Vector3<f64>) -> Self {
        Self {
            jnt_type: MjJointType::Hinge,
            axis,
            pos: Vector3::zeros(),
            name: None,
        }
    }

    /// Slide along `axis`.
    #[must_use]
    pub fn slide(axis: Vector3<f64>) -> Self {
        Self {
            jnt_type: MjJointType::Slide,
            axis,
            pos: Vector3::zeros(),
            name: None,
        }
    }

    /// Move the hinge anchor to `pos` (body frame).
    #[must_use]
    pub fn at(mut self, pos: Vector3<f64>) -> Self {
        self.pos = pos;
        self
    }

    /// Set the joint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Euler ZYX rotation: hinges about z, then y, then x.
    #[must_use]
    pub fn rotation_zyx() -> [Self; 3] {
        [
            Self::hinge(Vector3::z()),
            Self::hinge(Vector3::y()),
            Self::hinge(Vector3::x()),
        ]
    }

    /// Translation along x, y and z.
    #[must_use]
    pub fn translation_xyz() -> [Self; 3] {
        [
            Self::slide(Vector3::x()),
            Self::slide(Vector3::y()),
            Self::slide(Vector3::z()),
        ]
    }

    /// Floating base: translation xyz followed by rotation zyx.
    #[must_use]
    pub fn floating() -> [Self; 6] {
        let [tx, ty, tz] = Self::translation_xyz();
        let [rz, ry, rx] = Self::rotation_zyx();
        [tx, ty, tz, rz, ry, rx]
    }

    /// Planar joint in the xy-plane: slides along x and y, hinge about z.
    #[must_use]
    pub fn planar_xy() -> [Self; 3] {
        [
            Self::slide(Vector3::x()),
            Self::slide(Vector3::y()),
            Self::hinge(Vector3::z()),
        ]
    }
}

impl Model {
    /// Create an empty model containing only the world body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            nq: 0,
            nv: 0,
            nbody: 1,
            njnt: 0,

            body_parent: vec![0],
            body_jnt_adr: vec![0],
            body_jnt_num: vec![0],
            body_dof_adr: vec![0],
            body_dof_num: vec![0],
            body_dof_leaf: vec![None],
            body_pos: vec![Vector3::zeros()],
            body_quat: vec![UnitQuaternion::identity()],
            body_ipos: vec![Vector3::zeros()],
            body_iquat: vec![UnitQuaternion::identity()],
            body_mass: vec![0.0],
            body_inertia: vec![Vector3::zeros()],
            body_name: vec![Some("world".to_string())],

            jnt_type: Vec::new(),
            jnt_body: Vec::new(),
            jnt_qpos_adr: Vec::new(),
            jnt_dof_adr: Vec::new(),
            jnt_pos: Vec::new(),
            jnt_axis: Vec::new(),
            jnt_name: Vec::new(),

            dof_body: Vec::new(),
            dof_jnt: Vec::new(),
            dof_parent: Vec::new(),

            qLD_rowadr: Vec::new(),
            qLD_rownnz: Vec::new(),
            qLD_colind: Vec::new(),
            qLD_nnz: 0,

            qpos0: DVector::zeros(0),
            gravity: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Append a body below `parent`, moved by `joints` applied in order.
    ///
    /// Returns the new body id.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidParent`] if `parent` is not an existing body
    /// - [`ModelError::ZeroJointAxis`] if a joint axis has zero length
    /// - [`ModelError::InvalidInertia`] for negative or non-finite mass/inertia
    /// - [`ModelError::DuplicateBodyName`] if the name is already taken
    pub fn add_body(
        &mut self,
        parent: usize,
        body: BodySpec,
        joints: &[JointSpec],
    ) -> Result<usize, ModelError> {
        if parent >= self.nbody {
            return Err(ModelError::InvalidParent {
                parent,
                nbody: self.nbody,
            });
        }
        if let Some(index) = joints
            .iter()
            .position(|j| j.axis.norm() < MIN_AXIS_NORM)
        {
            return Err(ModelError::ZeroJointAxis { index });
        }
        if !(body.mass.is_finite() && body.mass >= 0.0) {
            return Err(ModelError::invalid_inertia(format!(
                "mass must be finite and non-negative, got {}",
                body.mass
            )));
        }
        if body.inertia.iter().any(|&i| !(i.is_finite() && i >= 0.0)) {
            return Err(ModelError::invalid_inertia(format!(
                "principal inertia must be finite and non-negative, got {:?}",
                body.inertia
            )));
        }
        if let Some(name) = &body.name {
            if self.body_id(name).is_some() {
                return Err(ModelError::DuplicateBodyName(name.clone()));
            }
        }

        let body_id = self.push_body(parent, body, joints);
        tracing::debug!(body_id, parent, ndof = self.body_dof_num[body_id], nv = self.nv, "added body");
        Ok(body_id)
    }

    /// Append a body without validation. Callers guarantee valid input.
    pub(crate) fn push_body(&mut self, parent: usize, body: BodySpec, joints: &[JointSpec]) -> usize {
        let body_id = self.nbody;

        self.body_parent.push(parent);
        self.body_jnt_adr.push(self.njnt);
        self.body_jnt_num.push(joints.len());
        self.body_dof_adr.push(self.nv);
        self.body_pos.push(body.pos);
        self.body_quat.push(body.quat);
        self.body_ipos.push(body.com);
        self.body_iquat.push(body.iquat);
        self.body_mass.push(body.mass);
        self.body_inertia.push(body.inertia);
        self.body_name.push(body.name);

        // The first DOF of this body hangs off the deepest DOF above it;
        // later DOFs on the same body chain onto each other.
        let mut parent_dof = self.body_dof_leaf[parent];
        let mut ndof = 0;
        for joint in joints {
            let jnt_id = self.njnt;
            self.jnt_type.push(joint.jnt_type);
            self.jnt_body.push(body_id);
            self.jnt_qpos_adr.push(self.nq);
            self.jnt_dof_adr.push(self.nv);
            self.jnt_pos.push(joint.pos);
            self.jnt_axis.push(joint.axis.normalize());
            self.jnt_name.push(joint.name.clone());

            for _ in 0..joint.jnt_type.nv() {
                let dof = self.nv;
                self.dof_body.push(body_id);
                self.dof_jnt.push(jnt_id);
                self.dof_parent.push(parent_dof);
                parent_dof = Some(dof);
                self.nv += 1;
                ndof += 1;
            }
            self.nq += joint.jnt_type.nq();
            self.njnt += 1;
        }
        self.body_dof_num.push(ndof);
        self.body_dof_leaf.push(parent_dof);
        self.nbody += 1;

        self.qpos0 = DVector::zeros(self.nq);
        self.compute_qld_csr_metadata();
        body_id
    }

    /// Create initial Data struct for this model with all arrays pre-allocated.
    #[must_use]
    pub fn make_data(&self) -> Data {
        let nbody = self.nbody;
        let nv = self.nv;
        Data {
            qpos: self.qpos0.clone(),
            qvel: DVector::zeros(nv),
            qacc: DVector::zeros(nv),

            qfrc_applied: DVector::zeros(nv),
            qfrc_bias: DVector::zeros(nv),
            qfrc_inverse: DVector::zeros(nv),
            cfrc_ext: vec![SpatialVector::zeros(); nbody],

            xpos: vec![Vector3::zeros(); nbody],
            xquat: vec![UnitQuaternion::identity(); nbody],
            xmat: vec![Matrix3::identity(); nbody],
            xipos: vec![Vector3::zeros(); nbody],
            ximat: vec![Matrix3::identity(); nbody],

            xanchor: vec![Vector3::zeros(); self.njnt],
            xaxis: vec![Vector3::zeros(); self.njnt],

            cinert: vec![Matrix6::zeros(); nbody],
            crb_inertia: vec![Matrix6::zeros(); nbody],
            cdof: vec![SpatialVector::zeros(); nv],
            cdof_dot: vec![SpatialVector::zeros(); nv],
            cvel: vec![SpatialVector::zeros(); nbody],
            cacc: vec![SpatialVector::zeros(); nbody],
            cfrc: vec![SpatialVector::zeros(); nbody],

            qM: DMatrix::zeros(nv, nv),
            qLD_data: vec![0.0; self.qLD_nnz],
            qLD_diag_inv: vec![0.0; nv],
            qLD_valid: false,

            aba_ia: vec![Matrix6::zeros(); nv],
            aba_u: vec![SpatialVector::zeros(); nv],
            aba_d: vec![0.0; nv],
            aba_pa: vec![SpatialVector::zeros(); nv],
            aba_tau: vec![0.0; nv],
            aba_acc: vec![SpatialVector::zeros(); nv],
            aba_valid: false,
        }
    }
}
