//! Sparse LᵀDL factorization of the mass matrix.
//!
//! Exploits the tree sparsity structure (from `dof_parent` chains) for
//! factorization and solve in time proportional to the sum of DOF depths.
//! Also holds the CSR metadata precomputation for the sparse layout.
//! Corresponds to `mj_factorI` in MuJoCo's `engine_util_sparse.c`.

use crate::types::{Data, Model, StepError};

impl Model {
    /// Compute CSR metadata for sparse LDL factorization from `dof_parent` chains.
    ///
    /// Called by body insertion whenever `dof_parent` grows. Each row stores
    /// its ancestors (root first) followed by the diagonal, so
    /// `rownnz[i] - 1` is the off-diagonal count.
    pub(crate) fn compute_qld_csr_metadata(&mut self) {
        let nv = self.nv;
        self.qLD_rownnz.clear();
        self.qLD_rowadr.clear();
        self.qLD_colind.clear();

        let mut ancestors = Vec::new();
        for i in 0..nv {
            ancestors.clear();
            let mut p = self.dof_parent[i];
            while let Some(j) = p {
                ancestors.push(j);
                p = self.dof_parent[j];
            }

            self.qLD_rowadr.push(self.qLD_colind.len());
            self.qLD_rownnz.push(ancestors.len() + 1);
            self.qLD_colind.extend(ancestors.iter().rev());
            self.qLD_colind.push(i);
        }
        self.qLD_nnz = self.qLD_colind.len();
    }
}

/// Sparse LᵀDL factorization of `qM` into `qLD_data` / `qLD_diag_inv`.
///
/// ## Sparsity Layout
///
/// Row `i` has `rownnz[i]` entries: off-diagonal ancestors followed by the
/// diagonal. Row `i`'s entries before ancestor `j` are exactly the
/// ancestors of `j`, so the rank-1 update of row `j` is an element-wise
/// scaled addition of a prefix of row `i`.
///
/// # Errors
///
/// Returns [`StepError::MassMatrixSingular`] if a pivot is not positive.
pub fn mj_factor_sparse(model: &Model, data: &mut Data) -> Result<(), StepError> {
    let nv = model.nv;
    let (rowadr, rownnz, colind) = model.qld_csr();
    data.qLD_valid = false;

    // Gather M's sparse entries (diagonal last).
    for i in 0..nv {
        let start = rowadr[i];
        for k in 0..rownnz[i] {
            data.qLD_data[start + k] = data.qM[(i, colind[start + k])];
        }
    }

    // Eliminate leaves to root.
    for i in (0..nv).rev() {
        let start_i = rowadr[i];
        let offdiag = rownnz[i] - 1;
        let di = data.qLD_data[start_i + offdiag];
        if !(di > 0.0) {
            tracing::warn!(dof = i, pivot = di, "mass matrix is not positive definite");
            return Err(StepError::MassMatrixSingular { dof: i });
        }
        let inv_di = 1.0 / di;
        data.qLD_diag_inv[i] = inv_di;

        for k in 0..offdiag {
            data.qLD_data[start_i + k] *= inv_di;
        }

        // Rank-1 update of every ancestor j (deepest first):
        //   D[j]        -= L[i,j]² · D[i]
        //   row_j[0..a] -= L[i,j] · D[i] · row_i[0..a]
        // where a is j's position in row i (== rownnz[j] - 1).
        for a in (0..offdiag).rev() {
            let j = colind[start_i + a];
            let lij = data.qLD_data[start_i + a];
            let start_j = rowadr[j];
            debug_assert_eq!(a, rownnz[j] - 1, "ancestor rows must be prefixes");

            data.qLD_data[start_j + a] -= lij * lij * di;

            let scale = -lij * di;
            // j < i, so row j lies entirely before row i.
            let (lo, hi) = data.qLD_data.split_at_mut(start_i);
            for (dst, src) in lo[start_j..start_j + a].iter_mut().zip(&hi[..a]) {
                *dst += scale * src;
            }
        }
    }

    data.qLD_valid = true;
    Ok(())
}
