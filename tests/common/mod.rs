//! Shared helpers for integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rowreduce::error::Result;
use rowreduce::solver::comm::CommunicationBackend;
use rowreduce::solver::comm_local::run_group;
use rowreduce::solver::distributed::{DistributedSolver, ROOT};
use rowreduce::solver::LinearSolver;

pub const WORKER_COUNTS: [usize; 5] = [1, 2, 3, 5, 7];

/// Random well-conditioned system with a known solution.
///
/// Returns the flat augmented matrix and the solution it was built from.
pub fn system_with_solution(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();

    let cols = n + 1;
    let mut input = vec![0.0f64; n * cols];
    for i in 0..n {
        for j in 0..n {
            input[i * cols + j] = rng.gen_range(-10.0..10.0);
        }
        // Diagonal boost keeps the condition number small.
        let sign = input[i * cols + i].signum();
        input[i * cols + i] += sign * 10.0 * n as f64;
        input[i * cols + n] = (0..n).map(|j| input[i * cols + j] * x[j]).sum();
    }
    (input, x)
}

/// Solve on an in-process group, returning every worker's outcome.
pub fn solve_on_group(workers: usize, input: &[f64]) -> Vec<Result<Vec<f64>>> {
    run_group(workers, |comm| {
        let local: &[f64] = if comm.rank() == ROOT { input } else { &[] };
        DistributedSolver::new(comm).solve(local)
    })
}
