//! Independent dense LU solve based on faer.
//!
//! Not part of the elimination engine. Used by `--check` and by tests to
//! cross-validate Gauss-Jordan results against a different factorization.

use faer::prelude::*;

use crate::error::{Result, RowReduceError};
use crate::matrix::AugmentedMatrix;

/// Solve `[A | b]` with faer's partial-pivot LU.
pub fn solve_dense_lu(matrix: &AugmentedMatrix) -> Result<Vec<f64>> {
    let n = matrix.n();
    if matrix.as_slice().iter().any(|v| !v.is_finite()) {
        return Err(RowReduceError::Solve("dense LU input contains NaN/Inf".into()));
    }

    let a = faer::Mat::<f64>::from_fn(n, n, |i, j| matrix.row(i)[j]);
    let rhs = faer::Mat::<f64>::from_fn(n, 1, |i, _| matrix.rhs(i));
    let lu = a.partial_piv_lu();
    let x = lu.solve(rhs);

    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        let xi = x[(i, 0)];
        if !xi.is_finite() {
            return Err(RowReduceError::Solve(
                "dense LU produced NaN/Inf solution".into(),
            ));
        }
        *slot = xi;
    }
    Ok(out)
}

/// Largest absolute component of `A x - b`.
pub fn residual_norm(matrix: &AugmentedMatrix, x: &[f64]) -> f64 {
    let n = matrix.n();
    (0..n)
        .map(|i| {
            let row = matrix.row(i);
            let ax: f64 = row[..n].iter().zip(x).map(|(a, xj)| a * xj).sum();
            (ax - row[n]).abs()
        })
        .fold(0.0, f64::max)
}
