//! Augmented matrix storage.
//!
//! `AugmentedMatrix` holds the full n x (n+1) system `[A | b]` as one flat
//! row-major buffer. `RowBlock` is the contiguous slice of rows owned by a
//! single worker in the distributed solver; rows keep their global ids so
//! elimination never needs to move data between workers.

use crate::error::{Result, RowReduceError};
use crate::solver::partition::RowRange;

/// Recover `n` from a flat augmented-matrix length.
///
/// Returns the unique positive `n` with `n * (n + 1) == len`, or `None` when
/// no such `n` exists (including `len == 0`).
pub fn dimension_for_len(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let estimate = ((1.0 + 4.0 * len as f64).sqrt() - 1.0) / 2.0;
    let base = estimate.floor() as usize;
    // The float estimate can land one off in either direction for huge lengths.
    (base.saturating_sub(1)..=base + 1).find(|&n| n > 0 && n.checked_mul(n + 1) == Some(len))
}

/// Shape check performed before any numeric work.
///
/// Says nothing about singularity, which only elimination can detect.
pub fn is_well_formed(input: &[f64]) -> bool {
    dimension_for_len(input.len()).is_some()
}

/// Dense augmented matrix `[A | b]`, row-major, `n` rows by `n + 1` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedMatrix {
    n: usize,
    data: Vec<f64>,
}

impl AugmentedMatrix {
    /// Take ownership of a flat input buffer after validating its shape.
    pub fn from_flat(data: Vec<f64>) -> Result<Self> {
        let n = dimension_for_len(data.len())
            .ok_or(RowReduceError::MalformedInput { len: data.len() })?;
        Ok(Self { n, data })
    }

    /// Number of equations (and unknowns).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Row width, `n + 1`.
    pub fn cols(&self) -> usize {
        self.n + 1
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let cols = self.cols();
        &self.data[i * cols..(i + 1) * cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let cols = self.cols();
        &mut self.data[i * cols..(i + 1) * cols]
    }

    /// Right-hand side entry of row `i`.
    pub fn rhs(&self, i: usize) -> f64 {
        self.data[i * self.cols() + self.n]
    }

    /// Physically exchange two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let cols = self.cols();
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * cols);
        head[lo * cols..(lo + 1) * cols].swap_with_slice(&mut tail[..cols]);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Copy out the rows in `range` as a worker-owned block.
    pub fn block(&self, range: RowRange) -> RowBlock {
        let cols = self.cols();
        RowBlock::new(range, cols, self.data[range.start * cols..range.end * cols].to_vec())
    }
}

/// The rows `[range.start, range.end)` of an augmented matrix, owned by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    range: RowRange,
    cols: usize,
    data: Vec<f64>,
}

impl RowBlock {
    pub fn new(range: RowRange, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), range.len() * cols);
        Self { range, cols, data }
    }

    /// Block of zeros, filled later by a scatter.
    pub fn zeroed(range: RowRange, cols: usize) -> Self {
        Self::new(range, cols, vec![0.0; range.len() * cols])
    }

    pub fn range(&self) -> RowRange {
        self.range
    }

    /// Whether global row `row` lives in this block.
    pub fn owns(&self, row: usize) -> bool {
        self.range.contains(row)
    }

    /// Row by global id. Panics if the row is not owned here.
    pub fn row(&self, global: usize) -> &[f64] {
        let local = global - self.range.start;
        &self.data[local * self.cols..(local + 1) * self.cols]
    }

    pub fn row_mut(&mut self, global: usize) -> &mut [f64] {
        let local = global - self.range.start;
        &mut self.data[local * self.cols..(local + 1) * self.cols]
    }

    /// Owned rows paired with their global ids.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [f64])> {
        let start = self.range.start;
        self.data
            .chunks_exact_mut(self.cols)
            .enumerate()
            .map(move |(i, row)| (start + i, row))
    }

    /// Last-column values of every owned row, in global row order.
    pub fn rhs_values(&self) -> Vec<f64> {
        self.data
            .chunks_exact(self.cols)
            .map(|row| row[self.cols - 1])
            .collect()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
