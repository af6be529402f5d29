//! Range-space method on the sparse `LᵀDL` factor of the mass matrix.
//!
//! Eliminates `q̈` from the augmented system instead of factoring it:
//!
//! ```text
//! q̈₀ = H⁻¹(τ − C)
//! X  = H⁻¹Gᵀ
//! K  = G·X
//! K·λ = γ − G·q̈₀
//! q̈  = q̈₀ + X·λ
//! ```
//!
//! Every application of `H⁻¹` goes through the tree-sparse factor, so the
//! only dense factorization is of the small `K` (rows × rows).

use nalgebra::DVector;
use sim_core::linalg::{cholesky_in_place, cholesky_solve_in_place};
use sim_core::{Model, mj_solve_m, mj_solve_m_batch};
use tracing::{debug, warn};

use crate::config::LinearSolver;
use crate::constraint_set::{ConstraintSet, ConstraintWorkspace};
use crate::error::ConstraintError;
use crate::solver::{prepare_joint_space, solve_dense};

/// Constrained forward dynamics by the range-space method.
///
/// Returns `q̈`; the row forces are stored in [`ConstraintSet::force`].
/// Matches [`forward_dynamics_constraints_direct`](crate::forward_dynamics_constraints_direct)
/// to numerical precision.
///
/// # Errors
///
/// [`ConstraintError::NotBound`], [`ConstraintError::DimensionMismatch`] for
/// mis-sized inputs, or [`ConstraintError::SingularSystem`].
pub fn forward_dynamics_constraints_range_space_sparse(
    model: &Model,
    q: &DVector<f64>,
    qdot: &DVector<f64>,
    tau: &DVector<f64>,
    cs: &mut ConstraintSet,
) -> Result<DVector<f64>, ConstraintError> {
    prepare_joint_space(model, q, qdot, tau, cs)?;
    let method = cs.config.linear_solver;
    let ConstraintSet { binding, force, .. } = cs;
    let ws = &mut binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
    debug!(nv = model.nv, rows = ws.G.nrows(), "range-space constrained forward dynamics");

    let mut qddot0 = tau - &ws.bias;
    mj_solve_m(model, &ws.data, &mut qddot0);
    ws.qddot0.copy_from(&qddot0);

    let rhs = &ws.gamma - &ws.G * &qddot0;
    let lambda = solve_range_space(model, ws, &rhs, method)?;

    let qddot = qddot0 + &ws.minv_gt * &lambda;
    force.copy_from(&lambda);
    ws.data.qacc.copy_from(&qddot);
    Ok(qddot)
}

/// Form `X = H⁻¹Gᵀ` and `K = G·X` in the workspace and solve `K·x = rhs`.
///
/// `K` is symmetric positive definite for independent rows, so Cholesky is
/// tried first; dependent rows fall back to the configured dense solver.
pub(crate) fn solve_range_space(
    model: &Model,
    ws: &mut ConstraintWorkspace,
    rhs: &DVector<f64>,
    fallback: LinearSolver,
) -> Result<DVector<f64>, ConstraintError> {
    ws.minv_gt.tr_copy_from(&ws.G);
    mj_solve_m_batch(model, &ws.data, &mut ws.minv_gt);
    ws.K.copy_from(&(&ws.G * &ws.minv_gt));

    let mut factor = ws.K.clone();
    match cholesky_in_place(&mut factor) {
        Ok(()) => {
            let mut x = rhs.clone();
            cholesky_solve_in_place(&factor, &mut x);
            Ok(x)
        }
        Err(err) => {
            warn!(%err, ?fallback, "constraint coupling matrix not positive definite");
            solve_dense(fallback, &ws.K, rhs, "range-space coupling system")
        }
    }
}
