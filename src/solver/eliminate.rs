//! Row kernels shared by the sequential and distributed solvers.

use crate::matrix::RowBlock;

use super::pivot::SINGULARITY_THRESHOLD;

/// Scale `row` so that `row[step] == 1.0`.
///
/// Columns before `step` are already zero and are left alone.
pub fn normalize_row(row: &mut [f64], step: usize) {
    let pivot = row[step];
    for v in &mut row[step..] {
        *v /= pivot;
    }
}

/// Subtract `row[step]` times the normalized pivot row from `row`.
///
/// Entries already below the singularity threshold are flushed to zero
/// instead. Column `step` always ends exactly `0.0`.
pub fn eliminate_row(row: &mut [f64], pivot: &[f64], step: usize) {
    let factor = row[step];
    if factor.abs() < SINGULARITY_THRESHOLD {
        row[step] = 0.0;
        return;
    }
    for (v, &p) in row[step..].iter_mut().zip(&pivot[step..]) {
        *v -= factor * p;
    }
    row[step] = 0.0;
}

/// Clear column `step` in every owned row except the pivot row itself.
pub fn eliminate_block(block: &mut RowBlock, pivot_row: usize, pivot: &[f64], step: usize) {
    for (row_id, row) in block.rows_mut() {
        if row_id != pivot_row {
            eliminate_row(row, pivot, step);
        }
    }
}
