//! Dynamics computations: spatial algebra, CRBA, RNE, ABA, sparse factorization.
//!
//! This module groups the joint-space dynamics algorithms that operate on
//! the articulated rigid body tree. All of them consume the kinematics
//! produced by [`crate::forward`].

pub(crate) mod aba;
pub(crate) mod crba;
pub(crate) mod factor;
pub(crate) mod rne;
pub(crate) mod spatial;

pub use aba::{mj_aba, mj_aba_accel_delta};
pub use crba::mj_crba;
pub use factor::mj_factor_sparse;
pub use rne::{mj_body_accel, mj_inverse, mj_rne, mj_xfrc_accumulate};
pub use spatial::{
    SpatialVector, angular, compute_body_spatial_inertia, linear, point_force, spatial,
    spatial_cross_force, spatial_cross_motion,
};
