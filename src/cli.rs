//! CLI argument parsing for the loadplan-worker binary.

use clap::{Parser, Subcommand};

use crate::defaults::{DEFAULT_MOCK_ORDER_COUNT, DEFAULT_MOCK_SEED};

#[derive(Parser)]
#[command(
    name = "loadplan-worker",
    about = "Load planning worker: pallet estimates, fleet routes, container layouts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Plan a batch of mock orders offline and print the solution as JSON
    Plan {
        /// Number of mock orders
        #[arg(long, default_value_t = DEFAULT_MOCK_ORDER_COUNT)]
        orders: usize,
        /// Seed for the mock order generator
        #[arg(long, default_value_t = DEFAULT_MOCK_SEED)]
        seed: u64,
        /// Fleet size (defaults to FLEET_SIZE)
        #[arg(long)]
        vehicles: Option<usize>,
        /// Per-vehicle capacity in pallets (defaults to VEHICLE_CAPACITY_PALLETS)
        #[arg(long)]
        capacity: Option<f64>,
        /// Solver time budget in milliseconds (defaults to SOLVER_TIME_LIMIT_MS)
        #[arg(long)]
        time_limit_ms: Option<u64>,
    },
}
