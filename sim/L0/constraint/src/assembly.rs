//! Projection of initial states onto the constraint manifold.
//!
//! Both utilities solve a weighted least-change problem with the rows as
//! equality constraints, using the diagonal weight matrix `W`:
//!
//! ```text
//! [ W   Gᵀ ] [ x ]   [ W·x_target ]
//! [ G   0  ] [ λ ] = [     c      ]
//! ```
//!
//! Heavier weights keep the corresponding coordinates closer to their
//! initial values.

use nalgebra::{DMatrix, DVector};
use sim_core::Model;
use tracing::{debug, trace, warn};

use crate::config::LinearSolver;
use crate::constraint_set::{ConstraintSet, ConstraintWorkspace};
use crate::direct::fill_kkt_matrix;
use crate::error::{ConstraintError, check_len};
use crate::solver::solve_dense;

/// Outcome of [`calc_assembly_q`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyResult {
    /// Assembled configuration.
    pub q: DVector<f64>,
    /// Newton steps taken.
    pub iterations_used: usize,
    /// Norm of the position error at `q`.
    pub constraint_error: f64,
    /// Whether the error dropped to the tolerance.
    pub converged: bool,
}

/// Newton projection of `q_init` onto the zero position-error manifold,
/// each step minimizing `‖W·Δq‖` subject to `G·Δq = −e(q)`.
///
/// Contact rows carry no position error, so for contact-only sets the
/// result is `q_init` after zero steps.
///
/// # Errors
///
/// [`ConstraintError::NotBound`], [`ConstraintError::DimensionMismatch`] for
/// mis-sized `q_init` or `weights`, or [`ConstraintError::SingularSystem`].
pub fn calc_assembly_q(
    model: &Model,
    q_init: &DVector<f64>,
    cs: &mut ConstraintSet,
    weights: &DVector<f64>,
    tolerance: f64,
    max_iter: usize,
) -> Result<AssemblyResult, ConstraintError> {
    cs.check_model(model)?;
    check_len("weights", model.nv, weights.len())?;
    let method = cs.config.linear_solver;
    let qdot = DVector::zeros(model.nv);
    let no_target = DVector::zeros(model.nv);

    let mut q = q_init.clone();
    let mut error = position_errors(cs, model, &q)?;
    let mut iterations_used = 0;
    while error.norm() > tolerance && iterations_used < max_iter {
        cs.prepare_state(model, &q, &qdot)?;
        cs.compute_contact_rows(model)?;
        let ws = &mut cs.binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
        let step = solve_weighted_projection(ws, weights, &no_target, &(-&error), method)?;
        // Hinge and slide coordinates map one to one onto DOFs.
        q += step;
        iterations_used += 1;
        error = position_errors(cs, model, &q)?;
        trace!(iteration = iterations_used, error = error.norm(), "assembly step");
    }

    let constraint_error = error.norm();
    let converged = constraint_error <= tolerance;
    if converged {
        debug!(iterations_used, constraint_error, "assembled configuration");
    } else {
        warn!(iterations_used, constraint_error, tolerance, "configuration assembly did not converge");
    }
    Ok(AssemblyResult {
        q,
        iterations_used,
        constraint_error,
        converged,
    })
}

/// Weighted-nearest velocity to `qdot_init` with zero velocity along every
/// row at configuration `q`.
///
/// # Errors
///
/// [`ConstraintError::NotBound`], [`ConstraintError::DimensionMismatch`] or
/// [`ConstraintError::SingularSystem`].
pub fn calc_assembly_qdot(
    model: &Model,
    q: &DVector<f64>,
    qdot_init: &DVector<f64>,
    cs: &mut ConstraintSet,
    weights: &DVector<f64>,
) -> Result<DVector<f64>, ConstraintError> {
    cs.prepare_state(model, q, qdot_init)?;
    check_len("weights", model.nv, weights.len())?;
    cs.compute_contact_rows(model)?;
    let method = cs.config.linear_solver;
    let ws = &mut cs.binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
    let rows = DVector::zeros(ws.G.nrows());
    let qdot = solve_weighted_projection(ws, weights, qdot_init, &rows, method)?;
    debug!(correction = (&qdot - qdot_init).norm(), "assembled velocity");
    Ok(qdot)
}

/// Every row's position error, groups in order. Loads `q` once.
fn position_errors(cs: &mut ConstraintSet, model: &Model, q: &DVector<f64>) -> Result<DVector<f64>, ConstraintError> {
    let mut errors = Vec::with_capacity(cs.len());
    for group in 0..cs.group_count() {
        errors.extend(cs.calc_position_error(group, model, q, group == 0)?.iter());
    }
    Ok(DVector::from_vec(errors))
}

/// Solve the weighted projection system with `G` from the workspace and
/// return the joint-space part.
fn solve_weighted_projection(
    ws: &mut ConstraintWorkspace,
    weights: &DVector<f64>,
    target: &DVector<f64>,
    row_rhs: &DVector<f64>,
    method: LinearSolver,
) -> Result<DVector<f64>, ConstraintError> {
    let nv = weights.len();
    let nrows = row_rhs.len();
    fill_kkt_matrix(ws, nv);
    ws.kkt_matrix
        .view_mut((0, 0), (nv, nv))
        .copy_from(&DMatrix::from_diagonal(weights));
    ws.kkt_rhs.rows_mut(0, nv).copy_from(&weights.component_mul(target));
    ws.kkt_rhs.rows_mut(nv, nrows).copy_from(row_rhs);

    let x = solve_dense(method, &ws.kkt_matrix, &ws.kkt_rhs, "assembly projection")?;
    ws.kkt_solution.copy_from(&x);
    Ok(x.rows(0, nv).into_owned())
}
