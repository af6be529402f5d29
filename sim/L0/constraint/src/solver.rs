//! Shared solver interface and dense linear solves.
//!
//! The three acceleration-level methods solve the same problem: find `q̈`
//! and row forces `λ` such that
//!
//! ```text
//! H·q̈ = τ − C + Gᵀ·λ        (equations of motion)
//! G·q̈ = γ                   (no acceleration along any row)
//! ```
//!
//! They differ only in how the system is factored, so they are exposed as
//! interchangeable implementors of [`ConstrainedDynamics`], with
//! [`SolverKind`] for configuration-driven selection.

use nalgebra::{DMatrix, DVector};
use sim_core::linalg::{lu_factor_in_place, lu_solve_factored};
use sim_core::{Data, Model, SpatialVector, mj_crba, mj_rne};
use tracing::warn;

use crate::config::LinearSolver;
use crate::constraint_set::ConstraintSet;
use crate::direct::forward_dynamics_constraints_direct;
use crate::error::{ConstraintError, check_len};
use crate::kokkevis::forward_dynamics_contacts_kokkevis;
use crate::range_space::forward_dynamics_constraints_range_space_sparse;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A constrained forward dynamics method.
///
/// Implementors take the state `(q, q̇, τ)` and a bound constraint set,
/// return `q̈`, and store the row forces in [`ConstraintSet::force`].
pub trait ConstrainedDynamics {
    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Solve for the constrained joint acceleration.
    ///
    /// # Errors
    ///
    /// Whatever the method reports: unbound set, dimension mismatch, or a
    /// singular system.
    fn forward_dynamics(
        &self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        tau: &DVector<f64>,
        cs: &mut ConstraintSet,
    ) -> Result<DVector<f64>, ConstraintError>;
}

/// Dense augmented-system method, the numerical reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSolver;

/// Range-space method on the sparse mass-matrix factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSpaceSparseSolver;

/// Kokkevis recursive method on articulated-body inertias.
#[derive(Debug, Clone, Copy, Default)]
pub struct KokkevisSolver;

impl ConstrainedDynamics for DirectSolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn forward_dynamics(
        &self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        tau: &DVector<f64>,
        cs: &mut ConstraintSet,
    ) -> Result<DVector<f64>, ConstraintError> {
        forward_dynamics_constraints_direct(model, q, qdot, tau, cs)
    }
}

impl ConstrainedDynamics for RangeSpaceSparseSolver {
    fn name(&self) -> &'static str {
        "range-space sparse"
    }

    fn forward_dynamics(
        &self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        tau: &DVector<f64>,
        cs: &mut ConstraintSet,
    ) -> Result<DVector<f64>, ConstraintError> {
        forward_dynamics_constraints_range_space_sparse(model, q, qdot, tau, cs)
    }
}

impl ConstrainedDynamics for KokkevisSolver {
    fn name(&self) -> &'static str {
        "kokkevis"
    }

    fn forward_dynamics(
        &self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        tau: &DVector<f64>,
        cs: &mut ConstraintSet,
    ) -> Result<DVector<f64>, ConstraintError> {
        forward_dynamics_contacts_kokkevis(model, q, qdot, tau, cs)
    }
}

/// Selector over the built-in methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverKind {
    /// [`DirectSolver`].
    #[default]
    Direct,
    /// [`RangeSpaceSparseSolver`].
    RangeSpaceSparse,
    /// [`KokkevisSolver`].
    Kokkevis,
}

impl SolverKind {
    /// All built-in methods.
    pub const ALL: [Self; 3] = [Self::Direct, Self::RangeSpaceSparse, Self::Kokkevis];

    /// The method as a trait object.
    #[must_use]
    pub fn solver(self) -> &'static dyn ConstrainedDynamics {
        match self {
            Self::Direct => &DirectSolver,
            Self::RangeSpaceSparse => &RangeSpaceSparseSolver,
            Self::Kokkevis => &KokkevisSolver,
        }
    }
}

impl ConstrainedDynamics for SolverKind {
    fn name(&self) -> &'static str {
        self.solver().name()
    }

    fn forward_dynamics(
        &self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
        tau: &DVector<f64>,
        cs: &mut ConstraintSet,
    ) -> Result<DVector<f64>, ConstraintError> {
        self.solver().forward_dynamics(model, q, qdot, tau, cs)
    }
}

/// Load the state and fill everything the mass-matrix methods share: `H`
/// and its sparse factor (in the workspace `Data`), `C`, `G` and `γ`.
pub(crate) fn prepare_joint_space(
    model: &Model,
    q: &DVector<f64>,
    qdot: &DVector<f64>,
    tau: &DVector<f64>,
    cs: &mut ConstraintSet,
) -> Result<(), ConstraintError> {
    cs.prepare_state(model, q, qdot)?;
    check_len("tau", model.nv, tau.len())?;
    {
        let ws = &mut cs.binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
        ws.data.cfrc_ext.fill(SpatialVector::zeros());
        ws.data.qfrc_applied.copy_from(tau);
        compute_mass_matrix(model, &mut ws.data)?;
        mj_rne(model, &mut ws.data);
        ws.bias.copy_from(&ws.data.qfrc_bias);
    }
    cs.compute_contact_rows(model)
}

/// `H` and its sparse factor for the kinematics already in `data`.
pub(crate) fn compute_mass_matrix(model: &Model, data: &mut Data) -> Result<(), ConstraintError> {
    mj_crba(model, data).map_err(|err| {
        warn!(%err, "mass matrix factorization failed");
        ConstraintError::SingularSystem { stage: "mass matrix" }
    })
}

/// Solve `a·x = b` with the selected dense method.
///
/// # Errors
///
/// [`ConstraintError::SingularSystem`] tagged with `stage` when the
/// factorization breaks down.
pub(crate) fn solve_dense(
    method: LinearSolver,
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    stage: &'static str,
) -> Result<DVector<f64>, ConstraintError> {
    let solution = match method {
        LinearSolver::HouseholderQr => a.clone().qr().solve(b),
        LinearSolver::FullPivLu => a.clone().full_piv_lu().solve(b),
        LinearSolver::PartialPivLu => {
            let mut lu = a.clone();
            let mut piv = vec![0; a.nrows()];
            lu_factor_in_place(&mut lu, &mut piv).ok().map(|()| {
                let mut x = b.clone();
                lu_solve_factored(&lu, &piv, &mut x);
                x
            })
        }
    };
    match solution {
        Some(x) if x.iter().all(|v| v.is_finite()) => Ok(x),
        _ => {
            warn!(stage, ?method, n = a.nrows(), "dense solve failed");
            Err(ConstraintError::SingularSystem { stage })
        }
    }
}
