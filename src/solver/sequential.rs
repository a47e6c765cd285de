//! Sequential Gauss-Jordan elimination with partial pivoting.
//!
//! Used directly as the single-process solver and as the fast path of the
//! distributed solver when the worker group has one member. With no other
//! workers to coordinate with, pivot rows are swapped physically. The input
//! row id of every position is carried along so pivot ties are settled the
//! same way as in the distributed solver.

use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::AugmentedMatrix;
use crate::stats::Stats;

use super::eliminate::{eliminate_row, normalize_row};
use super::pivot::{check_pivot, PivotCandidate};

/// Single-process Gauss-Jordan solver.
pub struct SequentialSolver;

impl SequentialSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl super::LinearSolver for SequentialSolver {
    fn solve(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut matrix = AugmentedMatrix::from_flat(input.to_vec())?;
        solve_in_place(&mut matrix, None)
    }
}

/// Largest-magnitude entry of column `step` among positions `step..n`.
///
/// Candidates carry their input row id, so equal maxima go to the lowest
/// input row regardless of where earlier swaps moved it. Returns the
/// winning candidate and its current position.
fn find_pivot(matrix: &AugmentedMatrix, origin: &[usize], step: usize) -> (PivotCandidate, usize) {
    let mut best = PivotCandidate::NONE;
    let mut best_pos = step;
    for pos in step..matrix.n() {
        let candidate = PivotCandidate::new(matrix.row(pos)[step].abs(), origin[pos]);
        let merged = best.combine(candidate);
        if merged.owner_row != best.owner_row {
            best_pos = pos;
        }
        best = merged;
    }
    (best, best_pos)
}

/// Reduce `matrix` to `[I | x]` and return `x`.
///
/// On a singular system the matrix is left partially reduced.
pub fn solve_in_place(matrix: &mut AugmentedMatrix, stats: Option<&mut Stats>) -> Result<Vec<f64>> {
    reduce(matrix, stats)?;
    Ok((0..matrix.n()).map(|i| matrix.rhs(i)).collect())
}

/// Run every elimination round in place, returning the input row id
/// elected as pivot at each step.
fn reduce(matrix: &mut AugmentedMatrix, mut stats: Option<&mut Stats>) -> Result<Vec<usize>> {
    let n = matrix.n();
    let cols = matrix.cols();
    let _span = tracing::debug_span!("sequential_gauss_jordan", n).entered();

    let mut origin: Vec<usize> = (0..n).collect();
    let mut pivot = vec![0.0; cols];
    for step in 0..n {
        let (candidate, pos) = find_pivot(matrix, &origin, step);
        check_pivot(candidate, step).inspect_err(|e| {
            tracing::warn!(step, error = %e, "elimination stopped");
        })?;
        if pos != step {
            tracing::trace!(step, pivot_row = origin[pos], "swapping pivot row into place");
            matrix.swap_rows(step, pos);
            origin.swap(step, pos);
            if let Some(ref mut s) = stats {
                s.pivot_swaps += 1;
            }
        }

        normalize_row(matrix.row_mut(step), step);
        pivot.copy_from_slice(matrix.row(step));

        // Rows are independent once the pivot row is copied out.
        matrix
            .as_mut_slice()
            .par_chunks_mut(cols)
            .enumerate()
            .filter(|&(row, _)| row != step)
            .for_each(|(_, row)| eliminate_row(row, &pivot, step));

        if let Some(ref mut s) = stats {
            s.rounds += 1;
        }
    }

    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowReduceError;
    use crate::solver::LinearSolver;
    use approx::assert_abs_diff_eq;

    fn solver() -> SequentialSolver {
        SequentialSolver::new()
    }

    #[test]
    fn solve_identity_2x2() {
        let x = solver().solve(&[1.0, 0.0, 3.0, 0.0, 1.0, 7.0]).unwrap();
        assert_abs_diff_eq!(x[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_known_2x2() {
        // [[2, 1], [5, 7]] x = [11, 13]
        let x = solver().solve(&[2.0, 1.0, 11.0, 5.0, 7.0, 13.0]).unwrap();
        assert_abs_diff_eq!(x[0], 64.0 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], -29.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_3x3_needs_pivoting() {
        // [[0, 2, 1], [1, 1, 1], [2, 1, 0]] x = [5, 4, 4], x = [1, 2, 1]
        let input = [
            0.0, 2.0, 1.0, 5.0, //
            1.0, 1.0, 1.0, 4.0, //
            2.0, 1.0, 0.0, 4.0,
        ];
        let x = solver().solve(&input).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_reduces_matrix_to_identity() {
        let mut m = AugmentedMatrix::from_flat(vec![4.0, 1.0, 9.0, 2.0, 3.0, 7.0]).unwrap();
        solve_in_place(&mut m, None).unwrap();
        assert_abs_diff_eq!(m.row(0)[0], 1.0, epsilon = 1e-15);
        assert_eq!(m.row(0)[1], 0.0);
        assert_eq!(m.row(1)[0], 0.0);
        assert_abs_diff_eq!(m.row(1)[1], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn singular_matrix_reports_step() {
        // row1 = 2 * row0
        let err = solver().solve(&[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]).unwrap_err();
        match err {
            RowReduceError::Singular { step, .. } => assert_eq!(step, 1),
            other => panic!("expected singular error, got {other}"),
        }
    }

    #[test]
    fn zero_matrix_is_singular_at_first_step() {
        let err = solver().solve(&[0.0; 12]).unwrap_err();
        assert!(matches!(err, RowReduceError::Singular { step: 0, .. }));
    }

    #[test]
    fn malformed_length_is_rejected() {
        let err = solver().solve(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, RowReduceError::MalformedInput { len: 4 }));
        assert!(!solver().validate(&[1.0, 2.0, 3.0, 4.0]));
        assert!(!solver().validate(&[]));
        assert!(solver().validate(&[4.0, 20.0]));
    }

    fn reverse_diagonal(n: usize) -> Vec<f64> {
        let cols = n + 1;
        let mut input = vec![0.0; n * cols];
        for i in 0..n {
            input[i * cols + (n - 1 - i)] = 2.0 + i as f64;
            input[i * cols + n] = (2.0 + i as f64) * (n - 1 - i) as f64;
        }
        input
    }

    #[test]
    fn stats_count_rounds_and_swaps() {
        // Steps 0..3 each pull a row up from the bottom half; the rest are
        // already in place by then.
        let mut m = AugmentedMatrix::from_flat(reverse_diagonal(6)).unwrap();
        let mut stats = Stats::new();
        let x = solve_in_place(&mut m, Some(&mut stats)).unwrap();
        assert_eq!(stats.rounds, 6);
        assert_eq!(stats.pivot_swaps, 3);
        for (j, v) in x.iter().enumerate() {
            assert_abs_diff_eq!(*v, j as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_solve_counts_completed_rounds() {
        let mut m = AugmentedMatrix::from_flat(vec![1.0, 2.0, 3.0, 2.0, 4.0, 6.0]).unwrap();
        let mut stats = Stats::new();
        assert!(solve_in_place(&mut m, Some(&mut stats)).is_err());
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.pivot_swaps, 1);
    }

    #[test]
    fn pivot_ties_go_to_lowest_input_row() {
        // Step 0 elects row 2. At step 1 rows 0 and 1 tie on |1|, and row 0
        // has been swapped below row 1 by then.
        let input = [
            1.0, 1.0, 0.0, 1.0, //
            1.0, -1.0, 1.0, 1.0, //
            2.0, 0.0, 0.0, 2.0,
        ];
        let mut m = AugmentedMatrix::from_flat(input.to_vec()).unwrap();
        assert_eq!(reduce(&mut m, None).unwrap(), vec![2, 0, 1]);
    }
}
