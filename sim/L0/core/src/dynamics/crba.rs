//! Composite Rigid Body Algorithm for mass matrix computation.
//!
//! Implements CRBA (Featherstone Chapter 6) to build the joint-space mass
//! matrix `qM` from body spatial inertias, then factors it along the DOF
//! tree.

use crate::types::{Data, Model, StepError};

use super::factor::mj_factor_sparse;

/// Composite Rigid Body Algorithm: build joint-space mass matrix from body inertias.
///
/// ## Algorithm Overview
///
/// 1. Initialize composite inertias from body spatial inertias (`cinert`)
/// 2. Backward pass: `Ic[parent] += Ic[child]`
/// 3. For each DOF, walk the `dof_parent` chain: `M[i,j] = cdof[j]ᵀ·Ic[body(i)]·cdof[i]`
/// 4. Sparse LᵀDL factorization into `qLD_*`
///
/// Because `cinert` and `cdof` are expressed about the world origin, step 2
/// needs no parallel-axis shift and step 3 no force transform when the
/// walk crosses a body boundary.
///
/// Requires [`mj_fwd_position`](crate::forward::mj_fwd_position).
///
/// # Errors
///
/// Propagates [`StepError::MassMatrixSingular`] from the factorization.
///
/// Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 6
pub fn mj_crba(model: &Model, data: &mut Data) -> Result<(), StepError> {
    data.qM.fill(0.0);
    data.qLD_valid = false;

    if model.nv == 0 {
        return Ok(());
    }

    // Phase 1: composite inertias start as the body inertias.
    data.crb_inertia.copy_from_slice(&data.cinert);

    // Phase 2: leaves to root. Body 0 accumulates too but has no DOFs.
    for body_id in (1..model.nbody).rev() {
        let parent_id = model.body_parent[body_id];
        let child = data.crb_inertia[body_id];
        data.crb_inertia[parent_id] += child;
    }

    // Phase 3: per-DOF dof_parent walk (MuJoCo-style). Same-body DOFs are
    // chained by dof_parent, so cross entries between joints of one body
    // are covered.
    for dof_i in 0..model.nv {
        let body_i = model.dof_body[dof_i];
        let force = data.crb_inertia[body_i] * data.cdof[dof_i];

        data.qM[(dof_i, dof_i)] = data.cdof[dof_i].dot(&force);

        let mut ancestor = model.dof_parent[dof_i];
        while let Some(dof_j) = ancestor {
            let m_ji = data.cdof[dof_j].dot(&force);
            data.qM[(dof_j, dof_i)] = m_ji;
            data.qM[(dof_i, dof_j)] = m_ji;
            ancestor = model.dof_parent[dof_j];
        }
    }

    // Phase 4: sparse LᵀDL factorization, reused by every solve against M.
    mj_factor_sparse(model, data)
}
