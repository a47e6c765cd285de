//! Partial-pivot selection.
//!
//! Each worker scans its own not-yet-pivoted rows for the largest magnitude
//! in the active column. Worker-local winners are merged with
//! [`PivotCandidate::combine`], a max-with-argmax that is associative and
//! commutative, so any reduction order elects the same row.

use crate::error::{Result, RowReduceError};
use crate::matrix::RowBlock;

use super::permutation::RowPermutation;

/// Pivot magnitudes below this are treated as zero.
pub const SINGULARITY_THRESHOLD: f64 = 1e-10;

/// Best pivot seen so far: a magnitude and the global row it came from.
///
/// `owner_row == None` means no eligible row was seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotCandidate {
    pub magnitude: f64,
    pub owner_row: Option<usize>,
}

impl PivotCandidate {
    pub const NONE: Self = Self {
        magnitude: 0.0,
        owner_row: None,
    };

    pub fn new(magnitude: f64, row: usize) -> Self {
        Self {
            magnitude,
            owner_row: Some(row),
        }
    }

    /// Max-with-argmax.
    ///
    /// Larger magnitude wins. Equal magnitudes go to the lower row id. An
    /// empty candidate always loses.
    pub fn combine(self, other: Self) -> Self {
        match (self.owner_row, other.owner_row) {
            (None, _) => other,
            (_, None) => self,
            (Some(a), Some(b)) => {
                let better = other.magnitude > self.magnitude
                    || (other.magnitude == self.magnitude && b < a);
                if better {
                    other
                } else {
                    self
                }
            }
        }
    }
}

/// Best candidate among the rows of `block` still awaiting a pivot at `step`.
///
/// The active column is `step`.
pub fn select_local(block: &RowBlock, perm: &RowPermutation, step: usize) -> PivotCandidate {
    let range = block.range();
    (range.start..range.end)
        .filter(|&row| perm.step_of(row) >= step)
        .map(|row| PivotCandidate::new(block.row(row)[step].abs(), row))
        .fold(PivotCandidate::NONE, PivotCandidate::combine)
}

/// Accept a globally reduced candidate or report the system singular.
///
/// NaN magnitudes fail the check.
pub fn check_pivot(candidate: PivotCandidate, step: usize) -> Result<usize> {
    match candidate.owner_row {
        Some(row) if candidate.magnitude >= SINGULARITY_THRESHOLD => Ok(row),
        _ => Err(RowReduceError::Singular {
            step,
            magnitude: candidate.magnitude,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AugmentedMatrix;
    use crate::solver::partition::RowRange;

    #[test]
    fn combine_prefers_larger_magnitude() {
        let a = PivotCandidate::new(2.0, 5);
        let b = PivotCandidate::new(3.0, 7);
        assert_eq!(a.combine(b), b);
        assert_eq!(b.combine(a), b);
    }

    #[test]
    fn combine_breaks_ties_by_lower_row() {
        let a = PivotCandidate::new(4.0, 3);
        let b = PivotCandidate::new(4.0, 1);
        assert_eq!(a.combine(b).owner_row, Some(1));
        assert_eq!(b.combine(a).owner_row, Some(1));
    }

    #[test]
    fn combine_ignores_empty_candidates() {
        let a = PivotCandidate::new(0.0, 2);
        assert_eq!(PivotCandidate::NONE.combine(a), a);
        assert_eq!(a.combine(PivotCandidate::NONE), a);
        assert_eq!(
            PivotCandidate::NONE.combine(PivotCandidate::NONE),
            PivotCandidate::NONE
        );
    }

    #[test]
    fn combine_is_associative() {
        let xs = [
            PivotCandidate::new(1.0, 0),
            PivotCandidate::new(5.0, 4),
            PivotCandidate::NONE,
            PivotCandidate::new(5.0, 2),
        ];
        let left = xs.iter().copied().fold(PivotCandidate::NONE, PivotCandidate::combine);
        let right = xs
            .iter()
            .rev()
            .copied()
            .fold(PivotCandidate::NONE, PivotCandidate::combine);
        assert_eq!(left, right);
        assert_eq!(left.owner_row, Some(2));
    }

    #[test]
    fn select_local_skips_rows_already_pivoted() {
        // Column 0 magnitudes by row: 1, 9, 3
        let m = AugmentedMatrix::from_flat(vec![
            1.0, 0.0, 0.0, 0.0, //
            -9.0, 0.0, 0.0, 0.0, //
            3.0, 0.0, 0.0, 0.0,
        ])
        .unwrap();
        let block = m.block(RowRange { start: 0, end: 3 });
        let mut perm = RowPermutation::identity(3);
        let c = select_local(&block, &perm, 0);
        assert_eq!(c, PivotCandidate::new(9.0, 1));

        perm.promote(0, 1);
        let c = select_local(&block, &perm, 1);
        assert_eq!(c.owner_row, Some(0), "column 1 is all zeros, lowest row wins the tie");
        assert_eq!(c.magnitude, 0.0);
    }

    #[test]
    fn select_local_on_empty_block_is_none() {
        let m = AugmentedMatrix::from_flat(vec![1.0, 2.0]).unwrap();
        let block = m.block(RowRange { start: 1, end: 1 });
        let perm = RowPermutation::identity(1);
        assert_eq!(select_local(&block, &perm, 0), PivotCandidate::NONE);
    }

    #[test]
    fn check_pivot_rejects_small_and_missing() {
        assert_eq!(check_pivot(PivotCandidate::new(1.0, 3), 0).unwrap(), 3);
        assert!(check_pivot(PivotCandidate::new(1e-12, 3), 0).is_err());
        assert!(check_pivot(PivotCandidate::NONE, 0).is_err());
        assert!(check_pivot(PivotCandidate::new(f64::NAN, 0), 0).is_err());
    }
}
