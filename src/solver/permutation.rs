//! Step-to-row bookkeeping for pivoting without moving rows.
//!
//! Position `step` in the permutation names the global row that serves as
//! the pivot for elimination step `step`. Promoting a pivot swaps two labels
//! in both directions of the bijection; the matrix data itself stays put.

/// Bijection between elimination steps and global row ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPermutation {
    step_to_row: Vec<usize>,
    row_to_step: Vec<usize>,
}

impl RowPermutation {
    pub fn identity(n: usize) -> Self {
        Self {
            step_to_row: (0..n).collect(),
            row_to_step: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.step_to_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_to_row.is_empty()
    }

    /// Global row currently assigned to position `step`.
    pub fn row_at(&self, step: usize) -> usize {
        self.step_to_row[step]
    }

    /// Position currently holding global row `row`.
    pub fn step_of(&self, row: usize) -> usize {
        self.row_to_step[row]
    }

    /// Rows not yet used as a pivot when entering `step`.
    pub fn pending(&self, step: usize) -> &[usize] {
        &self.step_to_row[step..]
    }

    /// Make `row` the pivot of `step`.
    ///
    /// `row` must currently sit at a position `>= step`; positions before
    /// `step` are frozen. Returns true when a swap was needed.
    pub fn promote(&mut self, step: usize, row: usize) -> bool {
        let current = self.step_to_row[step];
        if current == row {
            return false;
        }
        let pos = self.row_to_step[row];
        assert!(
            pos > step,
            "row {row} already served as pivot for step {pos} (promoting into step {step})"
        );

        self.step_to_row.swap(step, pos);
        self.row_to_step[row] = step;
        self.row_to_step[current] = pos;
        true
    }

    /// Steps in order, each mapped to its pivot row.
    pub fn as_slice(&self) -> &[usize] {
        &self.step_to_row
    }
}
