//! Row-distributed Gauss-Jordan elimination.
//!
//! SPMD driver: every worker of a group calls [`solve`] with the same
//! communicator. Rank 0 holds the input; rows are scattered once into
//! contiguous per-worker blocks and never move again. Pivoting is tracked
//! in a `RowPermutation` replicated on every worker.
//!
//! Each of the `n` rounds runs two collectives in a fixed order:
//!
//! 1. max-with-argmax reduction of the worker-local pivot candidates, and
//! 2. broadcast of the normalized pivot row from the worker that owns it.
//!
//! Every worker then eliminates the pivot column from its own rows. The
//! singularity decision is taken from the reduced candidate, so all workers
//! abort together.

use crate::error::{Result, RowReduceError};
use crate::matrix::{dimension_for_len, AugmentedMatrix, RowBlock};
use crate::stats::Stats;

use super::comm::CommunicationBackend;
use super::eliminate::{eliminate_block, normalize_row};
use super::partition::{counts, owner_of, plan_rows, RowRange};
use super::permutation::RowPermutation;
use super::pivot::{check_pivot, select_local};
use super::sequential;

/// Rank that validates, disseminates the problem size and scatters rows.
pub const ROOT: usize = 0;

/// Distributed solver bound to one worker's communicator.
pub struct DistributedSolver<'a> {
    comm: &'a dyn CommunicationBackend,
}

impl<'a> DistributedSolver<'a> {
    pub fn new(comm: &'a dyn CommunicationBackend) -> Self {
        Self { comm }
    }
}

impl super::LinearSolver for DistributedSolver<'_> {
    /// Collective: the root's verdict is broadcast to every worker.
    fn validate(&self, input: &[f64]) -> bool {
        let len = self.comm.broadcast_len(ROOT, input.len());
        dimension_for_len(len).is_some()
    }

    fn solve(&self, input: &[f64]) -> Result<Vec<f64>> {
        solve(input, self.comm, None)
    }
}

/// Solve `[A | b]` across the group behind `comm`.
///
/// Only the root's `input` is read for matrix data; other workers may pass
/// an empty slice. A non-empty input on a non-root worker must have the same
/// shape as the root's, or every worker returns `ShapeMismatch`.
///
/// Round and swap counters in `stats` are identical on every worker.
pub fn solve(
    input: &[f64],
    comm: &dyn CommunicationBackend,
    mut stats: Option<&mut Stats>,
) -> Result<Vec<f64>> {
    let rank = comm.rank();
    let workers = comm.num_ranks();

    let root_len = comm.broadcast_len(ROOT, input.len());
    let n = dimension_for_len(root_len).ok_or(RowReduceError::MalformedInput { len: root_len })?;
    check_shape_agreement(input, n, comm)?;

    let _span = tracing::info_span!("gauss_jordan", n, workers, rank).entered();

    if workers == 1 {
        let mut matrix = AugmentedMatrix::from_flat(input.to_vec())?;
        return sequential::solve_in_place(&mut matrix, stats);
    }

    let cols = n + 1;
    let ranges = plan_rows(n, workers);
    let mut block = RowBlock::zeroed(ranges[rank], cols);
    comm.scatter_varcount(ROOT, input, &counts(&ranges, cols), block.as_mut_slice());
    tracing::debug!(start = ranges[rank].start, end = ranges[rank].end, "received row block");

    let mut perm = RowPermutation::identity(n);
    let mut pivot = vec![0.0; cols];
    for step in 0..n {
        let _round = tracing::trace_span!("round", step).entered();

        let candidate = comm.all_reduce_max_loc(select_local(&block, &perm, step));
        let pivot_row = check_pivot(candidate, step).inspect_err(|e| {
            tracing::warn!(step, error = %e, "elimination stopped");
        })?;

        if perm.promote(step, pivot_row) {
            tracing::trace!(step, pivot_row, "promoted pivot row");
            if let Some(ref mut s) = stats {
                s.pivot_swaps += 1;
            }
        }

        let owner = pivot_owner(&ranges, pivot_row)?;
        if rank == owner {
            debug_assert!(block.owns(pivot_row));
            let row = block.row_mut(pivot_row);
            normalize_row(row, step);
            pivot.copy_from_slice(row);
        }
        comm.broadcast(owner, &mut pivot);

        eliminate_block(&mut block, pivot_row, &pivot, step);
        if let Some(ref mut s) = stats {
            s.rounds += 1;
        }
    }

    Ok(gather_solution(&block, &perm, &ranges, comm))
}

/// Every worker checks the `n` its own input implies against the root's.
///
/// Workers without input agree by default; malformed input counts as
/// `n = 0`. The largest disagreement is all-reduced so a single
/// disagreeing worker fails the whole group.
fn check_shape_agreement(input: &[f64], n: usize, comm: &dyn CommunicationBackend) -> Result<()> {
    let local = if input.is_empty() {
        n
    } else {
        dimension_for_len(input.len()).unwrap_or(0)
    };
    let deviation = comm.all_reduce_max(local.abs_diff(n) as f64) as usize;
    if deviation != 0 {
        return Err(RowReduceError::ShapeMismatch { expected: n, deviation });
    }
    Ok(())
}

/// Worker whose block holds global row `row`.
fn pivot_owner(ranges: &[RowRange], row: usize) -> Result<usize> {
    owner_of(ranges, row).ok_or(RowReduceError::UnownedRow {
        row,
        rows: ranges.last().map_or(0, |r| r.end),
    })
}

/// Collect the right-hand-side column from all workers and order it by
/// elimination step.
fn gather_solution(
    block: &RowBlock,
    perm: &RowPermutation,
    ranges: &[RowRange],
    comm: &dyn CommunicationBackend,
) -> Vec<f64> {
    let n = perm.len();
    let mut by_row = vec![0.0; n];
    comm.all_gather_varcount(&block.rhs_values(), &counts(ranges, 1), &mut by_row);
    perm.as_slice().iter().map(|&row| by_row[row]).collect()
}
