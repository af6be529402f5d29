//! Data struct definition and pipeline entry points.
//!
//! [`Data`] is the dynamic state of one model evaluation: generalized
//! coordinates (qpos, qvel, qacc), everything computed from them (body poses,
//! motion subspaces, spatial inertias, mass matrix and its factor) and the
//! articulated-body scratch reused by acceleration-delta passes. One `Data`
//! is created per evaluation context via `model.make_data()`.

use nalgebra::{DMatrix, DVector, Matrix3, Matrix6, UnitQuaternion, Vector3};

use super::enums::StepError;
use super::model::Model;
use crate::dynamics::{
    SpatialVector, mj_aba, mj_body_accel, mj_crba, mj_inverse, mj_rne, mj_xfrc_accumulate,
};
use crate::forward::{mj_fwd_position, mj_fwd_velocity};
use crate::linalg::mj_solve_m;

/// Dynamic simulation state (like mjData).
///
/// # Key Invariant
///
/// `qpos` and `qvel` are the only state variables. Everything else is
/// computed from them by the pipeline stages. All spatial quantities
/// (`cdof`, `cvel`, `cacc`, `cinert`, `cfrc_*`) are expressed in the world
/// frame about the world origin, so they can be summed across bodies
/// without any frame shift.
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // qM / qLD_* match MuJoCo naming convention
pub struct Data {
    // ==================== Generalized Coordinates ====================
    /// Joint positions (length `nq`).
    pub qpos: DVector<f64>,
    /// Joint velocities (length `nv`).
    pub qvel: DVector<f64>,
    /// Joint accelerations (length `nv`).
    pub qacc: DVector<f64>,

    // ==================== Forces ====================
    /// Applied generalized force (length `nv`).
    pub qfrc_applied: DVector<f64>,
    /// Bias force `C(q, qdot)`: gravity, Coriolis and centrifugal (length `nv`).
    pub qfrc_bias: DVector<f64>,
    /// Output of inverse dynamics: `M·qacc + qfrc_bias` (length `nv`).
    pub qfrc_inverse: DVector<f64>,
    /// External spatial force on each body, world frame about the origin.
    pub cfrc_ext: Vec<SpatialVector>,

    // ==================== Body poses ====================
    /// Body frame position.
    pub xpos: Vec<Vector3<f64>>,
    /// Body frame orientation.
    pub xquat: Vec<UnitQuaternion<f64>>,
    /// Body frame rotation matrix.
    pub xmat: Vec<Matrix3<f64>>,
    /// Center of mass position.
    pub xipos: Vec<Vector3<f64>>,
    /// Inertial frame rotation matrix.
    pub ximat: Vec<Matrix3<f64>>,

    // ==================== Joints ====================
    /// Joint anchor in the world frame (per joint).
    pub xanchor: Vec<Vector3<f64>>,
    /// Joint axis in the world frame (per joint).
    pub xaxis: Vec<Vector3<f64>>,

    // ==================== Spatial quantities ====================
    /// Body spatial inertia about the world origin.
    pub cinert: Vec<Matrix6<f64>>,
    /// Composite (subtree) spatial inertia, filled by CRBA.
    pub crb_inertia: Vec<Matrix6<f64>>,
    /// Motion subspace of each DOF.
    pub cdof: Vec<SpatialVector>,
    /// Time derivative of `cdof`.
    pub cdof_dot: Vec<SpatialVector>,
    /// Body spatial velocity.
    pub cvel: Vec<SpatialVector>,
    /// Body spatial acceleration. `mj_body_accel` leaves it gravity-free;
    /// RNE overwrites it with gravity as a base acceleration.
    pub cacc: Vec<SpatialVector>,
    /// Subtree spatial force, filled by RNE.
    pub cfrc: Vec<SpatialVector>,

    // ==================== Mass matrix ====================
    /// Joint-space inertia matrix (nv × nv).
    pub qM: DMatrix<f64>,
    /// Sparse LᵀDL factor values (layout from `Model::qLD_*`).
    pub qLD_data: Vec<f64>,
    /// Inverse diagonal of the factor.
    pub qLD_diag_inv: Vec<f64>,
    /// Whether the factor matches the current `qM`.
    pub qLD_valid: bool,

    // ==================== Articulated-body scratch (per DOF) ====================
    /// Articulated inertia of the subtree rooted at each DOF.
    pub aba_ia: Vec<Matrix6<f64>>,
    /// `IA·cdof`.
    pub aba_u: Vec<SpatialVector>,
    /// `cdofᵀ·IA·cdof`.
    pub aba_d: Vec<f64>,
    /// Articulated bias force.
    pub aba_pa: Vec<SpatialVector>,
    /// `τ − cdofᵀ·pA`.
    pub aba_tau: Vec<f64>,
    /// Spatial acceleration of each DOF link.
    pub aba_acc: Vec<SpatialVector>,
    /// Whether `aba_ia`, `aba_u` and `aba_d` match the current configuration.
    pub aba_valid: bool,
}

impl Data {
    /// Position and velocity kinematics: poses, `cdof`, `cinert`, `cvel`
    /// and `cdof_dot` from the current `qpos` / `qvel`.
    pub fn kinematics(&mut self, model: &Model) {
        mj_fwd_position(model, self);
        mj_fwd_velocity(model, self);
    }

    /// Load a state and run [`Data::kinematics`].
    ///
    /// # Panics
    ///
    /// Panics if `qpos` or `qvel` does not match the model dimensions.
    pub fn set_state(&mut self, model: &Model, qpos: &DVector<f64>, qvel: &DVector<f64>) {
        assert_eq!(qpos.len(), model.nq, "qpos length must equal nq");
        assert_eq!(qvel.len(), model.nv, "qvel length must equal nv");
        self.qpos.copy_from(qpos);
        self.qvel.copy_from(qvel);
        self.kinematics(model);
    }

    /// Unconstrained forward dynamics via CRBA + RNE + sparse solve.
    ///
    /// Computes `qacc = M⁻¹(qfrc_applied + Jᵀ·cfrc_ext − qfrc_bias)`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::MassMatrixSingular`] if the mass matrix cannot be
    /// factored.
    pub fn forward(&mut self, model: &Model) -> Result<(), StepError> {
        self.kinematics(model);
        mj_crba(model, self)?;
        mj_rne(model, self);

        let mut qacc = &self.qfrc_applied + mj_xfrc_accumulate(model, self) - &self.qfrc_bias;
        mj_solve_m(model, self, &mut qacc);
        self.qacc = qacc;
        mj_body_accel(model, self);
        Ok(())
    }

    /// Unconstrained forward dynamics via the articulated-body algorithm.
    ///
    /// Produces the same `qacc` as [`Data::forward`] without forming the
    /// mass matrix, and leaves the articulated inertias in place for
    /// [`mj_aba_accel_delta`](crate::dynamics::mj_aba_accel_delta).
    pub fn forward_aba(&mut self, model: &Model) {
        self.kinematics(model);
        mj_aba(model, self);
        mj_body_accel(model, self);
    }

    /// Inverse dynamics for the current `qacc`.
    ///
    /// Fills `qfrc_inverse = M·qacc + qfrc_bias`. Kinematics must be current.
    pub fn inverse(&mut self, model: &Model) {
        mj_inverse(model, self);
    }
}
