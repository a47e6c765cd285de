//! Communication backend abstraction for the distributed solver.
//!
//! Provides a trait for the collectives a Gauss-Jordan round needs (pivot
//! reduction, pivot-row broadcast, row scatter, solution gather) and a
//! no-op single-process implementation.
//!
//! Every method is collective: all ranks of a group must call the same
//! methods in the same order, or the group deadlocks.

use super::pivot::PivotCandidate;

/// Abstraction over inter-process communication for the distributed solver.
///
/// Implementations: `SingleProcessComm` (no-op), `LocalComm` (in-process
/// worker threads over channels), `MpiComm` (via mpi crate).
pub trait CommunicationBackend: Send + Sync {
    /// This process's rank.
    fn rank(&self) -> usize;

    /// Total number of ranks.
    fn num_ranks(&self) -> usize;

    /// Max of a local scalar across all ranks.
    fn all_reduce_max(&self, local: f64) -> f64;

    /// Max-with-argmax of pivot candidates across all ranks.
    ///
    /// Must combine with [`PivotCandidate::combine`] so every backend
    /// elects the same row.
    fn all_reduce_max_loc(&self, local: PivotCandidate) -> PivotCandidate;

    /// Overwrite `data` on every rank with the contents held by `root`.
    fn broadcast(&self, root: usize, data: &mut [f64]);

    /// Broadcast a single length value from `root`.
    fn broadcast_len(&self, root: usize, value: usize) -> usize;

    /// Split `send` (only read on `root`) into consecutive pieces of
    /// `counts[r]` values and deliver piece `r` into rank `r`'s `recv`.
    fn scatter_varcount(&self, root: usize, send: &[f64], counts: &[usize], recv: &mut [f64]);

    /// Concatenate every rank's `local` (of length `counts[r]`) in rank
    /// order into `out` on every rank.
    fn all_gather_varcount(&self, local: &[f64], counts: &[usize], out: &mut [f64]);
}

/// No-op communication backend for a one-worker group.
///
/// All operations pass through unchanged.
pub struct SingleProcessComm;

impl CommunicationBackend for SingleProcessComm {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn all_reduce_max(&self, local: f64) -> f64 {
        local
    }

    fn all_reduce_max_loc(&self, local: PivotCandidate) -> PivotCandidate {
        local
    }

    fn broadcast(&self, _root: usize, _data: &mut [f64]) {
        // Single process: data is already where it needs to be.
    }

    fn broadcast_len(&self, _root: usize, value: usize) -> usize {
        value
    }

    fn scatter_varcount(&self, _root: usize, send: &[f64], _counts: &[usize], recv: &mut [f64]) {
        recv.copy_from_slice(&send[..recv.len()]);
    }

    fn all_gather_varcount(&self, local: &[f64], _counts: &[usize], out: &mut [f64]) {
        out.copy_from_slice(local);
    }
}

/// Start offset of each rank's piece for the given counts.
pub fn displacements(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0, |offset, &c| {
            let start = *offset;
            *offset += c;
            Some(start)
        })
        .collect()
}
