use clap::Parser;
use rowreduce::error::Result;
use rowreduce::loader;
use rowreduce::matrix::{self, AugmentedMatrix};
use rowreduce::output;
use rowreduce::solver::comm::CommunicationBackend;
use rowreduce::solver::comm_local::run_group;
use rowreduce::solver::distributed::{self, ROOT};
use rowreduce::solver::reference;
use rowreduce::solver::sequential;
use rowreduce::stats::Stats;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

/// Dense linear system solver (Gauss-Jordan with partial pivoting)
#[derive(Parser)]
#[command(name = "rowreduce", version)]
struct Cli {
    /// Augmented matrix file: n rows of n coefficients followed by the right-hand side
    matrix: PathBuf,

    /// Number of workers sharing the rows
    #[arg(long, default_value = "1")]
    workers: NonZeroUsize,

    /// Use the sequential solver, ignoring --workers
    #[arg(long)]
    seq: bool,

    /// Run as one rank of an MPI job (launch with mpirun)
    #[cfg(feature = "distributed")]
    #[arg(long, conflicts_with_all = ["seq", "workers"])]
    mpi: bool,

    /// Cross-check the result against a dense LU solve and report the residual
    #[arg(long)]
    check: bool,

    /// Print performance stats to stderr
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stats = if cli.stats { Some(Stats::new()) } else { None };

    let input = Stats::time(stats.as_mut(), "Load", || loader::load(&cli.matrix)).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.matrix.display(), e);
        std::process::exit(1);
    });

    if !matrix::is_well_formed(&input) {
        eprintln!(
            "Malformed input: {} values do not form an n x (n+1) augmented matrix",
            input.len()
        );
        std::process::exit(1);
    }

    let workers = if cli.seq { 1 } else { cli.workers.get() };
    if let Some(stats) = stats.as_mut() {
        stats.unknowns = matrix::dimension_for_len(input.len()).unwrap_or(0);
        stats.workers = workers;
    }

    #[cfg(feature = "distributed")]
    {
        if cli.mpi {
            let universe = mpi::initialize().unwrap_or_else(|| {
                eprintln!("MPI initialization failed");
                std::process::exit(1);
            });
            let comm = rowreduce::solver::comm_mpi::MpiComm::new();
            if let Some(stats) = stats.as_mut() {
                stats.workers = comm.num_ranks();
            }
            let start = Instant::now();
            let result = distributed::solve(&input, &comm, stats.as_mut());
            if let Some(stats) = stats.as_mut() {
                stats.add_phase("Solve", start.elapsed());
            }
            if comm.rank() == ROOT {
                report(&input, result, cli.check, stats.as_mut());
            }
            drop(universe);
            return;
        }
    }

    let start = Instant::now();
    let result = solve_local(&input, workers, cli.seq, stats.as_mut());
    if let Some(stats) = stats.as_mut() {
        stats.add_phase("Solve", start.elapsed());
    }
    report(&input, result, cli.check, stats.as_mut());
}

fn solve_local(input: &[f64], workers: usize, seq: bool, stats: Option<&mut Stats>) -> Result<Vec<f64>> {
    if seq {
        let mut matrix = AugmentedMatrix::from_flat(input.to_vec())?;
        return sequential::solve_in_place(&mut matrix, stats);
    }
    // Every worker ends with the same outcome and counters; keep the root's.
    let counting = stats.is_some();
    let (result, root_stats) = run_group(workers, |comm| {
        let local: &[f64] = if comm.rank() == ROOT { input } else { &[] };
        let mut worker_stats = counting.then(Stats::new);
        let result = distributed::solve(local, comm, worker_stats.as_mut());
        (result, worker_stats)
    })
    .swap_remove(ROOT);
    if let (Some(stats), Some(root_stats)) = (stats, root_stats) {
        stats.rounds = root_stats.rounds;
        stats.pivot_swaps = root_stats.pivot_swaps;
    }
    result
}

fn report(input: &[f64], result: Result<Vec<f64>>, check: bool, stats: Option<&mut Stats>) {
    let solution = result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if check {
        cross_check(input, &solution);
    }

    let mut stdout = io::stdout();
    output::write_solution_csv(&solution, &mut stdout).unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });

    if let Some(stats) = stats {
        stats.display();
    }
}

fn cross_check(input: &[f64], solution: &[f64]) {
    let Ok(system) = AugmentedMatrix::from_flat(input.to_vec()) else {
        return;
    };
    eprintln!("Residual max |Ax - b|: {:e}", reference::residual_norm(&system, solution));
    match reference::solve_dense_lu(&system) {
        Ok(lu) => {
            let max_diff = lu
                .iter()
                .zip(solution)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            eprintln!("Max deviation from dense LU: {:e}", max_diff);
        }
        Err(e) => eprintln!("Dense LU check failed: {}", e),
    }
}
