//! Contact constraints and constrained forward dynamics for articulated
//! rigid-body trees.
//!
//! A [`ConstraintSet`] holds point-contact rows: each row forbids relative
//! acceleration (or velocity) of one body-fixed point along one world
//! direction. Rows sharing a body and point form a named group, the unit of
//! force reporting and Baumgarte stabilization.
//!
//! # Solvers
//!
//! Every acceleration-level method returns the same `q̈` and row forces `λ`:
//!
//! ```text
//! H·q̈ = τ − C + Gᵀ·λ
//! G·q̈ = γ
//! ```
//!
//! | Method | Entry point | Cost |
//! |--------|-------------|------|
//! | Direct | [`forward_dynamics_constraints_direct`] | dense `(nv + m)³` |
//! | Range space | [`forward_dynamics_constraints_range_space_sparse`] | sparse `H`, dense `m³` |
//! | Kokkevis | [`forward_dynamics_contacts_kokkevis`] | `O(m·nv + m³)`, no `H` |
//!
//! The same three are available behind the [`ConstrainedDynamics`] trait
//! and the [`SolverKind`] selector. Velocity jumps at impact are computed
//! by [`compute_constraint_impulses_direct`] and
//! [`compute_constraint_impulses_range_space_sparse`].
//!
//! # Quick Start
//!
//! ```
//! use nalgebra::{DVector, Vector3};
//! use sim_constraint::{ConstrainedDynamics, ConstraintSet, SolverKind};
//! use sim_core::Model;
//!
//! let model = Model::floating_body(2.0, Vector3::zeros(), Vector3::repeat(0.1));
//! let mut cs = ConstraintSet::new();
//! cs.add_contact_group(
//!     1,
//!     Vector3::new(0.0, 0.0, -0.5),
//!     &[Vector3::x(), Vector3::y(), Vector3::z()],
//!     Some("foot"),
//!     None,
//! )?;
//! cs.bind(&model)?;
//!
//! let zero = DVector::zeros(model.nv);
//! for kind in SolverKind::ALL {
//!     let qddot = kind.forward_dynamics(&model, &zero, &zero, &zero, &mut cs)?;
//!     assert!(qddot.norm() < 1e-9);
//!     assert!((cs.force()[2] - 2.0 * 9.81).abs() < 1e-9);
//! }
//! # Ok::<(), sim_constraint::ConstraintError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Logging goes
//! through `tracing`; no subscriber is installed.

#![doc(html_root_url = "https://docs.rs/sim-constraint/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::suboptimal_flops,
    clippy::neg_cmp_op_on_partial_ord,
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::needless_range_loop
)]

mod assembly;
mod config;
mod constraint_set;
mod contact;
mod direct;
mod error;
mod impulse;
mod kokkevis;
mod range_space;
mod solver;
mod types;

pub use assembly::{AssemblyResult, calc_assembly_q, calc_assembly_qdot};
pub use config::{BaumgarteParameters, ConstraintSetConfig, LinearSolver};
pub use constraint_set::{ConstraintSet, ConstraintWorkspace};
pub use direct::forward_dynamics_constraints_direct;
pub use error::ConstraintError;
pub use impulse::{compute_constraint_impulses_direct, compute_constraint_impulses_range_space_sparse};
pub use kokkevis::forward_dynamics_contacts_kokkevis;
pub use range_space::forward_dynamics_constraints_range_space_sparse;
pub use solver::{ConstrainedDynamics, DirectSolver, KokkevisSolver, RangeSpaceSparseSolver, SolverKind};
pub use types::{ConstraintGroup, ContactRow, GroupForces, SpatialFrame};
