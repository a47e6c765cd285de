//! Linear system solvers.

pub mod comm;
pub mod comm_local;
#[cfg(feature = "distributed")]
pub mod comm_mpi;
pub mod distributed;
pub mod eliminate;
pub mod partition;
pub mod permutation;
pub mod pivot;
pub mod reference;
pub mod sequential;

use crate::error::Result;
use crate::matrix::is_well_formed;

/// A solver for dense systems given as a flat augmented matrix `[A | b]`.
pub trait LinearSolver {
    /// Shape check, run before any numeric work.
    fn validate(&self, input: &[f64]) -> bool {
        is_well_formed(input)
    }

    /// Solve for `x`, returned in unknown order.
    fn solve(&self, input: &[f64]) -> Result<Vec<f64>>;
}
