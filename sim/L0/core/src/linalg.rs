//! Linear algebra kernels: dense Cholesky, partial-pivot LU, and the tree
//! sparse `LᵀDL` solve.
//!
//! Pure math routines with no pipeline state. The constrained solvers use
//! the dense factorizations for their small per-constraint systems and the
//! sparse solve for every application of `M⁻¹`.

use crate::types::{Data, Model, StepError};
use nalgebra::{DMatrix, DVector};

// ============================================================================
// Dense Cholesky
// ============================================================================

/// In-place Cholesky (LLᵀ) factorization. Overwrites the lower triangle of
/// `m` with L and leaves the upper triangle untouched.
///
/// # Errors
///
/// Returns [`StepError::CholeskyFailed`] if `m` is not positive definite.
pub fn cholesky_in_place(m: &mut DMatrix<f64>) -> Result<(), StepError> {
    let n = m.nrows();
    for j in 0..n {
        let mut diag = m[(j, j)];
        for k in 0..j {
            diag -= m[(j, k)] * m[(j, k)];
        }
        if !(diag > 0.0) {
            return Err(StepError::CholeskyFailed);
        }
        let ljj = diag.sqrt();
        m[(j, j)] = ljj;

        for i in (j + 1)..n {
            let mut sum = m[(i, j)];
            for k in 0..j {
                sum -= m[(i, k)] * m[(j, k)];
            }
            m[(i, j)] = sum / ljj;
        }
    }
    Ok(())
}

/// Solve `L·Lᵀ·x = b` in place, where L is the lower triangle of `l`.
pub fn cholesky_solve_in_place(l: &DMatrix<f64>, x: &mut DVector<f64>) {
    let n = l.nrows();

    // L·y = b
    for j in 0..n {
        for k in 0..j {
            x[j] -= l[(j, k)] * x[k];
        }
        x[j] /= l[(j, j)];
    }

    // Lᵀ·z = y
    for j in (0..n).rev() {
        for k in (j + 1)..n {
            x[j] -= l[(k, j)] * x[k];
        }
        x[j] /= l[(j, j)];
    }
}

// ============================================================================
// Sparse Triangular Solve
// ============================================================================

/// Solve `LᵀDL x = b` using the sparse factorization from `mj_factor_sparse`.
///
/// Off-diagonal entries of row `i` sit at positions `0..rownnz[i]-1`; the
/// diagonal phase multiplies by the precomputed `qld_diag_inv[i]`.
///
/// On entry `x` contains `b`; on exit `x` contains the solution.
pub fn mj_solve_sparse(
    rowadr: &[usize],
    rownnz: &[usize],
    colind: &[usize],
    qld_data: &[f64],
    qld_diag_inv: &[f64],
    x: &mut DVector<f64>,
) {
    let nv = x.len();

    // Phase 1: Lᵀ y = b, scattering each DOF into its ancestors.
    for i in (0..nv).rev() {
        let nnz_offdiag = rownnz[i] - 1;
        if nnz_offdiag == 0 {
            continue;
        }
        let xi = x[i];
        if xi == 0.0 {
            continue;
        }
        let start = rowadr[i];
        for k in 0..nnz_offdiag {
            x[colind[start + k]] -= qld_data[start + k] * xi;
        }
    }

    // Phase 2: D z = y.
    for i in 0..nv {
        x[i] *= qld_diag_inv[i];
    }

    // Phase 3: L w = z, gathering from ancestors.
    for i in 0..nv {
        let nnz_offdiag = rownnz[i] - 1;
        if nnz_offdiag == 0 {
            continue;
        }
        let start = rowadr[i];
        for k in 0..nnz_offdiag {
            x[i] -= qld_data[start + k] * x[colind[start + k]];
        }
    }
}

/// Batch solve `LᵀDL X = B` for several right-hand sides at once.
///
/// The outer loop sweeps the CSR metadata once per DOF and the inner loop
/// runs across the columns of `x` (nv × n). Each column is an independent
/// right-hand side and holds its solution on exit.
pub fn mj_solve_sparse_batch(
    rowadr: &[usize],
    rownnz: &[usize],
    colind: &[usize],
    qld_data: &[f64],
    qld_diag_inv: &[f64],
    x: &mut DMatrix<f64>,
) {
    let nv = x.nrows();
    let n = x.ncols();

    // Phase 1: Lᵀ Y = B.
    for i in (0..nv).rev() {
        let nnz_offdiag = rownnz[i] - 1;
        if nnz_offdiag == 0 {
            continue;
        }
        let start = rowadr[i];
        for v in 0..n {
            let xi = x[(i, v)];
            if xi == 0.0 {
                continue;
            }
            for k in 0..nnz_offdiag {
                x[(colind[start + k], v)] -= qld_data[start + k] * xi;
            }
        }
    }

    // Phase 2: D Z = Y.
    for i in 0..nv {
        let inv_di = qld_diag_inv[i];
        for v in 0..n {
            x[(i, v)] *= inv_di;
        }
    }

    // Phase 3: L W = Z.
    for i in 0..nv {
        let nnz_offdiag = rownnz[i] - 1;
        if nnz_offdiag == 0 {
            continue;
        }
        let start = rowadr[i];
        for v in 0..n {
            let mut acc = 0.0;
            for k in 0..nnz_offdiag {
                acc += qld_data[start + k] * x[(colind[start + k], v)];
            }
            x[(i, v)] -= acc;
        }
    }
}

/// Apply `M⁻¹` to `x` in place using the factorization held in `data`.
///
/// Requires [`mj_crba`](crate::dynamics::mj_crba) at the current configuration.
pub fn mj_solve_m(model: &Model, data: &Data, x: &mut DVector<f64>) {
    debug_assert!(data.qLD_valid, "mass matrix factorization is stale");
    let (rowadr, rownnz, colind) = model.qld_csr();
    mj_solve_sparse(rowadr, rownnz, colind, &data.qLD_data, &data.qLD_diag_inv, x);
}

/// Apply `M⁻¹` to every column of `x` in place.
pub fn mj_solve_m_batch(model: &Model, data: &Data, x: &mut DMatrix<f64>) {
    debug_assert!(data.qLD_valid, "mass matrix factorization is stale");
    let (rowadr, rownnz, colind) = model.qld_csr();
    mj_solve_sparse_batch(rowadr, rownnz, colind, &data.qLD_data, &data.qLD_diag_inv, x);
}

// ============================================================================
// LU Factorization
// ============================================================================

/// Smallest pivot magnitude accepted by [`lu_factor_in_place`].
pub const LU_PIVOT_MIN: f64 = 1e-30;

/// Factor `A = P·L·U` in place with partial pivoting. L (unit lower) and U
/// share `a`; row swaps are recorded in `piv`.
///
/// # Errors
///
/// Returns [`StepError::LuSingular`] if a pivot magnitude falls below
/// [`LU_PIVOT_MIN`].
pub fn lu_factor_in_place(a: &mut DMatrix<f64>, piv: &mut [usize]) -> Result<(), StepError> {
    let n = a.nrows();
    for k in 0..n {
        // Partial pivot: find max |a[i,k]| for i in k..n
        let mut max_val = a[(k, k)].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let v = a[(i, k)].abs();
            if v > max_val {
                max_val = v;
                max_row = i;
            }
        }
        if !(max_val >= LU_PIVOT_MIN) {
            return Err(StepError::LuSingular);
        }
        piv[k] = max_row;

        if max_row != k {
            a.swap_rows(k, max_row);
        }

        for i in (k + 1)..n {
            a[(i, k)] /= a[(k, k)];
            for j in (k + 1)..n {
                a[(i, j)] -= a[(i, k)] * a[(k, j)];
            }
        }
    }
    Ok(())
}

/// Solve `P·L·U·x = b` with factors from [`lu_factor_in_place`].
#[allow(clippy::needless_range_loop)]
pub fn lu_solve_factored(a: &DMatrix<f64>, piv: &[usize], x: &mut DVector<f64>) {
    let n = a.nrows();

    // P·b
    for k in 0..n {
        if piv[k] != k {
            x.swap_rows(k, piv[k]);
        }
    }

    // L·y = P·b
    for i in 1..n {
        for k in 0..i {
            x[i] -= a[(i, k)] * x[k];
        }
    }

    // U·x = y
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            x[i] -= a[(i, k)] * x[k];
        }
        x[i] /= a[(i, i)];
    }
}

// ============================================================================
// Tests
// ============================================================================
