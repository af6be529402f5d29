//! Articulated rigid-body dynamics primitives.
//!
//! This crate provides the MuJoCo-aligned Model/Data architecture for
//! kinematic trees of rigid bodies connected by single-axis joints, plus the
//! joint-space dynamics algorithms that constrained solvers build on. It
//! follows Todorov's design where:
//!
//! - [`Model`] is static (immutable after construction)
//! - [`Data`] is dynamic (qpos/qvel are the source of truth)
//! - Body poses are computed via forward kinematics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Model                               │
//! │  Static: kinematic tree, joints, inertias, DOF tree, CSR    │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Data                               │
//! │  Dynamic: qpos, qvel → FK → xpos, cdof, cinert, cvel        │
//! │  CRBA → qM, qLD   RNE → qfrc_bias   ABA → qacc, IA          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All spatial vectors are `[angular; linear]`, in the world frame, about the
//! world origin.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless training loops
//! - Hardware control code
//! - Analysis tools
//! - Other engines
//!
//! # Quick Start
//!
//! ```
//! use sim_core::Model;
//!
//! let model = Model::n_link_pendulum(3, 1.0, 0.5);
//! let mut data = model.make_data();
//! data.qpos[0] = 0.3;
//! data.forward(&model).unwrap();
//!
//! assert!(data.qacc[0] < 0.0);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-core/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x > 0.0) is intentional for NaN rejection
    clippy::option_if_let_else,         // if-let is often more readable than map_or_else
    clippy::too_many_lines,             // Physics functions naturally have many steps
    clippy::doc_markdown,               // Not all technical terms need backticks
    clippy::many_single_char_names,     // Featherstone notation (u, d, s, ...)
)]

// Core type definitions (enums, Model, Data, construction)
pub mod types;

// Linear algebra utilities (Cholesky, LU, sparse solve)
pub mod linalg;

// Dynamics computations (spatial algebra, CRBA, RNE, ABA, factorization)
pub mod dynamics;

// Position and velocity kinematics
pub mod forward;

// Jacobians and force projection
pub mod jacobian;

// Body-fixed point kinematics
pub mod point;

pub use types::{BodySpec, Data, JointSpec, MjJointType, Model, ModelError, StepError};

pub use dynamics::{
    SpatialVector, mj_aba, mj_aba_accel_delta, mj_body_accel, mj_crba, mj_factor_sparse,
    mj_inverse, mj_rne, mj_xfrc_accumulate, point_force,
};
pub use forward::{mj_fwd_position, mj_fwd_velocity};
pub use jacobian::{mj_apply_ft, mj_jac, mj_jac_body, mj_jac_point};
pub use linalg::{mj_solve_m, mj_solve_m_batch, mj_solve_sparse, mj_solve_sparse_batch};
pub use point::{
    point_acceleration, point_acceleration_at, point_bias_acceleration, point_position,
    point_velocity, point_velocity_at,
};

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, Vector3};

    #[test]
    fn test_model_data_basic() {
        let model = Model::n_link_pendulum(1, 1.0, 0.1);
        let mut data = model.make_data();

        // Initial position should be zero (equilibrium)
        assert_relative_eq!(data.qpos[0], 0.0, epsilon = 1e-6);
        data.forward(&model).expect("forward failed");
        assert_relative_eq!(data.qacc[0], 0.0, epsilon = 1e-12);

        // At 45 degrees gravity pulls back towards zero.
        data.qpos[0] = std::f64::consts::FRAC_PI_4;
        data.forward(&model).expect("forward failed");
        assert!(data.qacc[0] < 0.0, "pendulum should swing back");
    }

    #[test]
    fn test_aba_and_crba_paths_agree() {
        let model = Model::n_link_pendulum(5, 0.4, 0.7);
        let mut data = model.make_data();
        data.qpos = DVector::from_fn(5, |i, _| 0.2 * i as f64 - 0.3);
        data.qvel = DVector::from_fn(5, |i, _| 1.0 - 0.5 * i as f64);
        data.qfrc_applied = DVector::from_element(5, 0.25);

        data.forward(&model).unwrap();
        let crba_qacc = data.qacc.clone();
        data.forward_aba(&model);
        assert_relative_eq!(data.qacc, crba_qacc, epsilon = 1e-10, max_relative = 1e-10);
    }

    #[test]
    fn test_inverse_recovers_applied_force() {
        let model = Model::floating_body(2.0, Vector3::new(0.1, 0.0, 0.2), Vector3::new(0.3, 0.4, 0.5));
        let mut data = model.make_data();
        data.qpos = DVector::from_fn(6, |i, _| 0.1 * i as f64);
        data.qvel = DVector::from_fn(6, |i, _| 0.5 - 0.2 * i as f64);
        data.qfrc_applied = DVector::from_fn(6, |i, _| (i as f64).sin());

        data.forward(&model).unwrap();
        data.inverse(&model);
        assert_relative_eq!(data.qfrc_inverse, data.qfrc_applied, epsilon = 1e-10);
    }

    #[test]
    fn test_external_force_balances_gravity() {
        let model = Model::floating_body(2.0, Vector3::zeros(), Vector3::repeat(0.1));
        let mut data = model.make_data();
        data.kinematics(&model);
        let com = data.xipos[1];
        data.cfrc_ext[1] = point_force(&com, &Vector3::new(0.0, 0.0, 2.0 * 9.81));

        data.forward(&model).unwrap();
        assert_relative_eq!(data.qacc.norm(), 0.0, epsilon = 1e-12);
        data.forward_aba(&model);
        assert_relative_eq!(data.qacc.norm(), 0.0, epsilon = 1e-12);
    }
}
