//! CVRP solver configuration

use std::time::Duration;

/// Configuration for the CVRP solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget for the whole solve
    pub time_limit: Duration,
    /// Upper bound on ruin-and-recreate iterations
    pub max_iterations: u64,
    /// Iterations without a new best before the search stops early
    pub max_stagnation: u64,
    /// Iterations without a new best before the search restarts from the best
    pub restart_after: u64,
    /// Share of assigned stops removed per ruin step (0-1)
    pub ruin_fraction: f64,
    /// Seed for tie-breaking and ruin choices
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_millis(2000),
            max_iterations: 100_000,
            max_stagnation: 5_000,
            restart_after: 200,
            ruin_fraction: 0.3,
            seed: 42,
        }
    }
}

impl SolverConfig {
    /// Instant configuration for very fast response
    /// - Minimal solve time (~200 ms)
    /// - May not find a good solution
    pub fn instant() -> Self {
        Self {
            time_limit: Duration::from_millis(200),
            max_iterations: 2_000,
            max_stagnation: 500,
            ..Self::default()
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
