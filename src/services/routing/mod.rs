//! Distance matrices for the routing engine
//!
//! Uses OSRM when configured, the analytical grid distance otherwise.

mod osrm;

pub use osrm::{MatrixError, OsrmClient, OsrmConfig};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::services::geo::{self, DISTANCE_SCALE};
use crate::types::Location;

/// Name reported for matrices computed from grid coordinates
pub const ANALYTICAL_SOURCE: &str = "analytical";

/// Pairwise travel distances between locations, index 0 being the depot
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// Distance in integer units [i][j] from location i to location j
    pub distances: Vec<Vec<i64>>,
    /// Travel time in seconds, when the source provides it
    pub durations: Option<Vec<Vec<i64>>>,
    /// Integer units per reported distance unit
    pub scale: f64,
    /// Where the numbers came from
    pub source: String,
}

impl DistanceMatrix {
    /// Create an empty matrix
    pub fn empty() -> Self {
        Self {
            distances: vec![],
            durations: None,
            scale: DISTANCE_SCALE,
            source: ANALYTICAL_SOURCE.to_string(),
        }
    }

    /// Euclidean matrix over grid locations
    pub fn analytical(locations: &[Location]) -> Self {
        Self {
            distances: geo::distance_matrix(locations),
            durations: None,
            scale: DISTANCE_SCALE,
            source: ANALYTICAL_SOURCE.to_string(),
        }
    }

    /// Wrap a matrix supplied by the caller, keeping its units
    pub fn from_supplied(values: &[Vec<f64>]) -> Self {
        Self {
            distances: values
                .iter()
                .map(|row| row.iter().map(|v| (v * DISTANCE_SCALE).round() as i64).collect())
                .collect(),
            durations: None,
            scale: DISTANCE_SCALE,
            source: "supplied".to_string(),
        }
    }

    pub fn size(&self) -> usize {
        self.distances.len()
    }

    /// Get distance from location i to location j in integer units
    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[from][to]
    }

    /// Convert integer units back to reported units
    pub fn unscale(&self, value: i64) -> f64 {
        value as f64 / self.scale
    }

    /// True when the matrix is square with `n` rows and no negative entries
    pub fn is_valid_for(&self, n: usize) -> bool {
        self.distances.len() == n
            && self
                .distances
                .iter()
                .all(|row| row.len() == n && row.iter().all(|&d| d >= 0))
    }
}

/// External distance provider, such as OSRM
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Get the distance matrix for a list of locations.
    /// The first location is the depot.
    async fn get_matrix(&self, locations: &[Location]) -> Result<DistanceMatrix>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Where the engine gets its distances from
#[derive(Clone)]
pub enum DistanceSource {
    /// Compute from coordinates
    Analytical,
    /// Use a matrix handed in by the caller
    Supplied(DistanceMatrix),
    /// Ask an external provider
    Provider(Arc<dyn DistanceProvider>),
}

impl std::fmt::Debug for DistanceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceSource::Analytical => write!(f, "Analytical"),
            DistanceSource::Supplied(m) => write!(f, "Supplied({}x{})", m.size(), m.size()),
            DistanceSource::Provider(p) => write!(f, "Provider({})", p.name()),
        }
    }
}

/// Turn a distance source into a concrete matrix for `locations`.
///
/// Never fails: provider errors, timeouts and mis-shaped matrices all fall
/// back to the analytical matrix.
pub async fn resolve_matrix(
    source: &DistanceSource,
    locations: &[Location],
    timeout: Duration,
) -> DistanceMatrix {
    let n = locations.len();

    match source {
        DistanceSource::Analytical => {}
        DistanceSource::Supplied(matrix) => {
            if matrix.is_valid_for(n) {
                return matrix.clone();
            }
            warn!(
                "Supplied matrix has {} rows for {} locations, using analytical distances",
                matrix.size(),
                n
            );
        }
        DistanceSource::Provider(provider) => {
            match tokio::time::timeout(timeout, provider.get_matrix(locations)).await {
                Ok(Ok(matrix)) if matrix.is_valid_for(n) => {
                    debug!("Matrix {}x{} from {}", n, n, provider.name());
                    return matrix;
                }
                Ok(Ok(matrix)) => {
                    warn!(
                        "{} returned a {}-row matrix for {} locations, falling back to analytical",
                        provider.name(),
                        matrix.size(),
                        n
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        "{} failed: {}. Falling back to analytical distances.",
                        provider.name(),
                        e
                    );
                }
                Err(_) => {
                    warn!(
                        "{} timed out after {:?}, falling back to analytical distances",
                        provider.name(),
                        timeout
                    );
                }
            }
        }
    }

    DistanceMatrix::analytical(locations)
}

/// Create the distance source based on configuration
pub fn create_distance_source(osrm_url: Option<String>, timeout: Duration) -> DistanceSource {
    match osrm_url {
        Some(url) => match OsrmClient::new(OsrmConfig::new(url).with_timeout(timeout)) {
            Ok(client) => {
                info!("Using OSRM distance provider at {}", client.base_url());
                DistanceSource::Provider(Arc::new(client))
            }
            Err(e) => {
                warn!("Could not build OSRM client: {}. Using analytical distances.", e);
                DistanceSource::Analytical
            }
        },
        None => {
            info!("Using analytical distances (OSRM not configured)");
            DistanceSource::Analytical
        }
    }
}
