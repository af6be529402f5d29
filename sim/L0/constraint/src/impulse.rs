//! Velocity-level contact impulses.
//!
//! An instantaneous collision changes `q̇` by `H⁻¹GᵀΛ` so that every row's
//! relative velocity vanishes afterwards:
//!
//! ```text
//! [ H   Gᵀ ] [ q̇⁺ ]   [ H·q̇⁻ ]
//! [ G   0  ] [ −Λ ] = [   0   ]
//! ```

use nalgebra::DVector;
use sim_core::Model;
use tracing::debug;

use crate::constraint_set::ConstraintSet;
use crate::direct::fill_kkt_matrix;
use crate::error::ConstraintError;
use crate::range_space::solve_range_space;
use crate::solver::{compute_mass_matrix, solve_dense};

/// Post-impulse velocity by a dense solve of the augmented system.
///
/// Returns `q̇⁺` and stores it in [`ConstraintSet::qdot_plus`]; the impulses
/// go to [`ConstraintSet::impulse`].
///
/// # Errors
///
/// [`ConstraintError::NotBound`], [`ConstraintError::DimensionMismatch`] or
/// [`ConstraintError::SingularSystem`].
pub fn compute_constraint_impulses_direct(
    model: &Model,
    q: &DVector<f64>,
    qdot_minus: &DVector<f64>,
    cs: &mut ConstraintSet,
) -> Result<DVector<f64>, ConstraintError> {
    prepare_impulse(model, q, qdot_minus, cs)?;
    let method = cs.config.linear_solver;
    let ConstraintSet {
        binding,
        impulse,
        qdot_plus,
        ..
    } = cs;
    let ws = &mut binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
    let nv = model.nv;
    let nrows = ws.G.nrows();
    debug!(nv, rows = nrows, ?method, "direct contact impulses");

    fill_kkt_matrix(ws, nv);
    ws.kkt_rhs.rows_mut(0, nv).copy_from(&(&ws.data.qM * qdot_minus));
    ws.kkt_rhs.rows_mut(nv, nrows).fill(0.0);

    let x = solve_dense(method, &ws.kkt_matrix, &ws.kkt_rhs, "direct impulse system")?;
    ws.kkt_solution.copy_from(&x);

    qdot_plus.copy_from(&x.rows(0, nv));
    for i in 0..nrows {
        impulse[i] = -x[nv + i];
    }
    Ok(qdot_plus.clone())
}

/// Post-impulse velocity by the range-space method:
/// `K·Λ = −G·q̇⁻`, `q̇⁺ = q̇⁻ + H⁻¹GᵀΛ`.
///
/// # Errors
///
/// As for [`compute_constraint_impulses_direct`].
pub fn compute_constraint_impulses_range_space_sparse(
    model: &Model,
    q: &DVector<f64>,
    qdot_minus: &DVector<f64>,
    cs: &mut ConstraintSet,
) -> Result<DVector<f64>, ConstraintError> {
    prepare_impulse(model, q, qdot_minus, cs)?;
    let method = cs.config.linear_solver;
    let ConstraintSet {
        binding,
        impulse,
        qdot_plus,
        ..
    } = cs;
    let ws = &mut binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
    debug!(nv = model.nv, rows = ws.G.nrows(), "range-space contact impulses");

    let rhs = -(&ws.G * qdot_minus);
    let lambda = solve_range_space(model, ws, &rhs, method)?;

    qdot_plus.copy_from(&(qdot_minus + &ws.minv_gt * &lambda));
    impulse.copy_from(&lambda);
    Ok(qdot_plus.clone())
}

/// Kinematics, `H` with its factor, and `G` at the pre-impulse state.
fn prepare_impulse(
    model: &Model,
    q: &DVector<f64>,
    qdot_minus: &DVector<f64>,
    cs: &mut ConstraintSet,
) -> Result<(), ConstraintError> {
    cs.prepare_state(model, q, qdot_minus)?;
    {
        let ws = &mut cs.binding.as_mut().ok_or(ConstraintError::NotBound)?.workspace;
        compute_mass_matrix(model, &mut ws.data)?;
    }
    cs.compute_contact_rows(model)
}
