//! Forward kinematics pipeline stages.
//!
//! Position stage (poses, motion subspaces, spatial inertias) and velocity
//! stage (body velocities, subspace derivatives). Dynamics stages that build
//! on these live in [`crate::dynamics`].

mod position;
mod velocity;

pub use position::{mj_fwd_position, motion_subspace};
pub use velocity::mj_fwd_velocity;
