//! MPI communication backend for the distributed solver.
//!
//! Requires the `distributed` feature flag and an MPI installation.
//! Implements `CommunicationBackend` on the MPI world communicator.
//!
//! # Usage
//!
//! The caller must initialize MPI before constructing `MpiComm`:
//!
//! ```ignore
//! let universe = mpi::initialize().expect("MPI init failed");
//! let comm = MpiComm::new();
//! ```
//!
//! # Pivot reduction
//!
//! The mpi crate has no portable `MPI_DOUBLE_INT`/`MPI_MAXLOC` pair type,
//! so candidates are all-gathered and folded locally with
//! `PivotCandidate::combine`. Every rank folds the same list in rank order
//! and therefore elects the same row.

use mpi::collective::SystemOperation;
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;

use super::comm::{displacements, CommunicationBackend};
use super::pivot::PivotCandidate;

/// MPI-based communication backend.
///
/// Wraps the MPI world communicator. Requires `mpi::initialize()` to have
/// been called before construction.
pub struct MpiComm;

impl MpiComm {
    /// Create a new MPI communication backend.
    pub fn new() -> Self {
        Self
    }
}

impl Default for MpiComm {
    fn default() -> Self {
        Self::new()
    }
}

fn to_counts(values: &[usize]) -> Vec<Count> {
    values.iter().map(|&v| v as Count).collect()
}

impl CommunicationBackend for MpiComm {
    fn rank(&self) -> usize {
        let world = SimpleCommunicator::world();
        world.rank() as usize
    }

    fn num_ranks(&self) -> usize {
        let world = SimpleCommunicator::world();
        world.size() as usize
    }

    fn all_reduce_max(&self, local: f64) -> f64 {
        let world = SimpleCommunicator::world();
        let mut global = 0.0f64;
        world.all_reduce_into(&local, &mut global, SystemOperation::max());
        global
    }

    fn all_reduce_max_loc(&self, local: PivotCandidate) -> PivotCandidate {
        let world = SimpleCommunicator::world();
        let size = world.size() as usize;

        let mut magnitudes = vec![0.0f64; size];
        world.all_gather_into(&local.magnitude, &mut magnitudes[..]);

        let local_row: i64 = local.owner_row.map_or(-1, |r| r as i64);
        let mut rows = vec![0i64; size];
        world.all_gather_into(&local_row, &mut rows[..]);

        magnitudes
            .into_iter()
            .zip(rows)
            .map(|(magnitude, row)| PivotCandidate {
                magnitude,
                owner_row: usize::try_from(row).ok(),
            })
            .fold(PivotCandidate::NONE, PivotCandidate::combine)
    }

    fn broadcast(&self, root: usize, data: &mut [f64]) {
        let world = SimpleCommunicator::world();
        world.process_at_rank(root as i32).broadcast_into(data);
    }

    fn broadcast_len(&self, root: usize, value: usize) -> usize {
        let world = SimpleCommunicator::world();
        let mut wire = value as u64;
        world.process_at_rank(root as i32).broadcast_into(&mut wire);
        wire as usize
    }

    fn scatter_varcount(&self, root: usize, send: &[f64], counts: &[usize], recv: &mut [f64]) {
        let world = SimpleCommunicator::world();
        let root_process = world.process_at_rank(root as i32);
        if world.rank() as usize == root {
            let partition = Partition::new(send, to_counts(counts), to_counts(&displacements(counts)));
            root_process.scatter_varcount_into_root(&partition, recv);
        } else {
            root_process.scatter_varcount_into(recv);
        }
    }

    fn all_gather_varcount(&self, local: &[f64], counts: &[usize], out: &mut [f64]) {
        let world = SimpleCommunicator::world();
        let mut partition = PartitionMut::new(out, to_counts(counts), to_counts(&displacements(counts)));
        world.all_gather_varcount_into(local, &mut partition);
    }
}
