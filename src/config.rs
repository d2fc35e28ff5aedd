//! Configuration management

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::services::planner::PlanSettings;
use crate::services::vrp::SolverConfig;
use crate::defaults::{
    DEFAULT_FLEET_SIZE, DEFAULT_MATRIX_TIMEOUT_SECONDS, DEFAULT_SOLVER_TIME_LIMIT_MS,
    DEFAULT_VEHICLE_CAPACITY_PALLETS,
};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// OSRM routing engine URL (optional, analytical distances when unset)
    pub osrm_url: Option<String>,

    /// Upper bound on waiting for a distance matrix
    pub matrix_timeout: Duration,

    /// Vehicles available per plan
    pub fleet_size: usize,

    /// Per-vehicle capacity in pallets
    pub vehicle_capacity: f64,

    /// Solver wall-clock budget
    pub solver_time_limit: Duration,

    /// Fixed solver seed; the solver default is used when unset
    pub solver_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let nats_url = lookup("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string());

        let osrm_url = lookup("OSRM_URL").filter(|url| !url.trim().is_empty());

        let matrix_timeout_seconds: u64 =
            parse_or(&lookup, "MATRIX_TIMEOUT_SECONDS", DEFAULT_MATRIX_TIMEOUT_SECONDS)?;

        let fleet_size: usize = parse_or(&lookup, "FLEET_SIZE", DEFAULT_FLEET_SIZE)?;

        let vehicle_capacity: f64 =
            parse_or(&lookup, "VEHICLE_CAPACITY_PALLETS", DEFAULT_VEHICLE_CAPACITY_PALLETS)?;
        if !vehicle_capacity.is_finite() || vehicle_capacity < 0.0 {
            anyhow::bail!(
                "VEHICLE_CAPACITY_PALLETS must be a non-negative number, got {}",
                vehicle_capacity
            );
        }

        let solver_time_limit_ms: u64 =
            parse_or(&lookup, "SOLVER_TIME_LIMIT_MS", DEFAULT_SOLVER_TIME_LIMIT_MS)?;

        let solver_seed = match lookup("SOLVER_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("SOLVER_SEED must be an integer, got '{}'", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            nats_url,
            osrm_url,
            matrix_timeout: Duration::from_secs(matrix_timeout_seconds),
            fleet_size,
            vehicle_capacity,
            solver_time_limit: Duration::from_millis(solver_time_limit_ms),
            solver_seed,
        })
    }

    /// Planner settings for requests that do not override anything
    pub fn plan_settings(&self) -> PlanSettings {
        let mut solver = SolverConfig::default().with_time_limit(self.solver_time_limit);
        if let Some(seed) = self.solver_seed {
            solver = solver.with_seed(seed);
        }

        PlanSettings {
            fleet_size: self.fleet_size,
            vehicle_capacity: self.vehicle_capacity,
            solver,
            matrix_timeout: self.matrix_timeout,
            ..PlanSettings::default()
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
