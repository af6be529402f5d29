//! Direct method: one dense solve of the full augmented system.
//!
//! ```text
//! [ H   Gᵀ ] [  q̈ ]   [ τ − C ]
//! [ G   0  ] [ −λ ] = [   γ   ]
//! ```
//!
//! Cost is cubic in `nv + rows`; the result is the reference the other
//! methods are checked against.

use nalgebra::DVector;
use sim_core::Model;
use tracing::debug;

use crate::constraint_set::{ConstraintSet, ConstraintWorkspace};
use crate::error::ConstraintError;
use crate::solver::{prepare_joint_space, solve_dense};

/// Constrained forward dynamics by a dense solve of the augmented system.
///
/// Returns `q̈`; the row forces are stored in [`ConstraintSet::force`].
///
/// # Errors
///
/// [`ConstraintError::NotBound`], [`ConstraintError::DimensionMismatch`] for
/// mis-sized inputs, or [`ConstraintError::SingularSystem`].
pub fn forward_dynamics_constraints_direct(
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
    let nv = model.nv;
    let nrows = ws.G.nrows();
    debug!(nv, rows = nrows, ?method, "direct constrained forward dynamics");

    fill_kkt_matrix(ws, nv);
    ws.kkt_rhs.rows_mut(0, nv).copy_from(&(tau - &ws.bias));
    ws.kkt_rhs.rows_mut(nv, nrows).copy_from(&ws.gamma);

    let x = solve_dense(method, &ws.kkt_matrix, &ws.kkt_rhs, "direct augmented system")?;
    ws.kkt_solution.copy_from(&x);

    let qddot = x.rows(0, nv).into_owned();
    for i in 0..nrows {
        force[i] = -x[nv + i];
    }
    ws.data.qacc.copy_from(&qddot);
    Ok(qddot)
}

/// `[H Gᵀ; G 0]` from the workspace's mass matrix and Jacobian.
pub(crate) fn fill_kkt_matrix(ws: &mut ConstraintWorkspace, nv: usize) {
    let nrows = ws.G.nrows();
    ws.kkt_matrix.fill(0.0);
    ws.kkt_matrix.view_mut((0, 0), (nv, nv)).copy_from(&ws.data.qM);
    ws.kkt_matrix.view_mut((0, nv), (nv, nrows)).tr_copy_from(&ws.G);
    ws.kkt_matrix.view_mut((nv, 0), (nrows, nv)).copy_from(&ws.G);
}
