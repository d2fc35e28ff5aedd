//! Planning defaults shared by configuration, CLI and request handling

/// Depot position on the planning grid
pub const DEFAULT_DEPOT_X: f64 = 50.0;
pub const DEFAULT_DEPOT_Y: f64 = 50.0;

pub const DEFAULT_FLEET_SIZE: usize = 5;

/// A 53 ft trailer takes roughly 26 pallets
pub const DEFAULT_VEHICLE_CAPACITY_PALLETS: f64 = 26.0;

pub const DEFAULT_SOLVER_TIME_LIMIT_MS: u64 = 2_000;

pub const DEFAULT_MATRIX_TIMEOUT_SECONDS: u64 = 5;

/// Mock orders generated when a plan request carries none
pub const DEFAULT_MOCK_ORDER_COUNT: usize = 20;

/// Seed for mock orders when the request does not pick one
pub const DEFAULT_MOCK_SEED: u64 = 42;
