//! Performance statistics collection for `--stats` output.

use std::time::{Duration, Instant};

/// Collects phase timings and elimination counters for one run.
///
/// Created when `--stats` is passed, threaded as `Option<&mut Stats>`.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    pub unknowns: usize,
    pub workers: usize,
    /// Elimination rounds completed (equals `unknowns` on success).
    pub rounds: usize,
    /// Rounds whose pivot row was not already in place.
    pub pivot_swaps: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            unknowns: 0,
            workers: 1,
            rounds: 0,
            pivot_swaps: 0,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    /// Run `f`, recording its wall time under `name` when stats are enabled.
    pub fn time<T>(stats: Option<&mut Stats>, name: &'static str, f: impl FnOnce() -> T) -> T {
        match stats {
            Some(stats) => {
                let start = Instant::now();
                let out = f();
                stats.add_phase(name, start.elapsed());
                out
            }
            None => f(),
        }
    }

    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== rowreduce stats ===");
        eprintln!("  Unknowns:               {}", self.unknowns);
        eprintln!("  Workers:                {}", self.workers);
        eprintln!("  Rounds:                 {}", self.rounds);
        eprintln!("  Pivot swaps:            {}", self.pivot_swaps);

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}s", name, dur.as_secs_f64());
        }

        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}s", total.as_secs_f64());
    }
}
