//! OSRM table service client
//!
//! OSRM API documentation:
//! https://project-osrm.org/docs/v5.24.0/api/#table-service

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::services::geo::GeoProjection;
use crate::types::{Coordinates, Location};
use super::{DistanceMatrix, DistanceProvider};

/// Metres per reported kilometre
const METRES_PER_KM: f64 = 1000.0;

/// Stand-in distance for unreachable pairs; large but safe to sum over a route
const UNREACHABLE_METRES: i64 = 1_000_000_000;

/// Failures talking to OSRM
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to OSRM failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OSRM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("OSRM answered with code '{0}'")]
    Code(String),
    #[error("OSRM matrix has {got} rows, expected {expected}")]
    Shape { expected: usize, got: usize },
}

/// OSRM client configuration
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server (e.g., "http://osrm:5000")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Profile segment of the URL
    pub profile: String,
    /// Grid-to-geographic mapping applied before querying
    pub projection: GeoProjection,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://osrm:5000".to_string(),
            timeout: Duration::from_secs(5),
            profile: "driving".to_string(),
            projection: GeoProjection::default(),
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OSRM table client
pub struct OsrmClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> std::result::Result<Self, MatrixError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MatrixError::Client)?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build the table URL; OSRM wants `lng,lat` pairs separated by `;`
    fn build_table_url(&self, coordinates: &[Coordinates]) -> String {
        let coords = coordinates
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=distance,duration",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    async fn fetch_table(
        &self,
        locations: &[Location],
    ) -> std::result::Result<DistanceMatrix, MatrixError> {
        let n = locations.len();
        let coordinates = self.config.projection.project_all(locations);
        let url = self.build_table_url(&coordinates);

        debug!("Requesting OSRM table for {} points", n);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MatrixError::Status { status, body });
        }

        let table: TableResponse = response.json().await?;
        table_to_matrix(table, n)
    }
}

#[async_trait]
impl DistanceProvider for OsrmClient {
    async fn get_matrix(&self, locations: &[Location]) -> Result<DistanceMatrix> {
        if locations.is_empty() {
            return Ok(DistanceMatrix {
                source: self.name().to_string(),
                scale: METRES_PER_KM,
                ..DistanceMatrix::empty()
            });
        }

        Ok(self.fetch_table(locations).await?)
    }

    fn name(&self) -> &str {
        "OSRM"
    }
}

/// Convert an OSRM table answer into an integer matrix in metres
fn table_to_matrix(
    table: TableResponse,
    n: usize,
) -> std::result::Result<DistanceMatrix, MatrixError> {
    if table.code != "Ok" {
        return Err(MatrixError::Code(table.code));
    }

    let raw_distances = table.distances.unwrap_or_default();
    if raw_distances.len() != n || raw_distances.iter().any(|row| row.len() != n) {
        return Err(MatrixError::Shape { expected: n, got: raw_distances.len() });
    }

    let distances = raw_distances
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, cell)| match cell {
                    Some(d) => d.round() as i64,
                    None => {
                        warn!("No OSRM distance for {} -> {}", i, j);
                        UNREACHABLE_METRES
                    }
                })
                .collect()
        })
        .collect();

    let durations = table.durations.filter(|rows| rows.len() == n).map(|rows| {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|t| t.map(|t| t.round() as i64).unwrap_or(i64::MAX / 4))
                    .collect()
            })
            .collect()
    });

    Ok(DistanceMatrix {
        distances,
        durations,
        scale: METRES_PER_KM,
        source: "OSRM".to_string(),
    })
}

// OSRM API types

#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    /// Metres
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
    /// Seconds
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OsrmClient {
        OsrmClient::new(OsrmConfig::new("http://localhost:5000/")).unwrap()
    }

    #[test]
    fn test_osrm_config_default() {
        let config = OsrmConfig::default();
        assert_eq!(config.base_url, "http://osrm:5000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.profile, "driving");
    }

    #[test]
    fn test_build_table_url_uses_lng_lat_order() {
        let url = client().build_table_url(&[
            Coordinates { lat: 34.0, lng: -118.0 },
            Coordinates { lat: 35.5, lng: -117.25 },
        ]);

        assert_eq!(
            url,
            "http://localhost:5000/table/v1/driving/-118,34;-117.25,35.5?annotations=distance,duration"
        );
    }

    #[test]
    fn test_table_to_matrix_ok() {
        let json = r#"{
            "code": "Ok",
            "distances": [[0, 1234.6], [1200.2, 0]],
            "durations": [[0, 100.4], [98.0, 0]]
        }"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let matrix = table_to_matrix(table, 2).unwrap();

        assert_eq!(matrix.distance(0, 1), 1235);
        assert_eq!(matrix.distance(1, 0), 1200);
        assert_eq!(matrix.durations.as_ref().unwrap()[0][1], 100);
        assert!((matrix.unscale(1235) - 1.235).abs() < 1e-9);
    }

    #[test]
    fn test_table_to_matrix_null_is_unreachable() {
        let json = r#"{"code": "Ok", "distances": [[0, null], [5, 0]]}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let matrix = table_to_matrix(table, 2).unwrap();
        assert_eq!(matrix.distance(0, 1), UNREACHABLE_METRES);
        assert!(matrix.durations.is_none());
    }

    #[test]
    fn test_table_to_matrix_error_code() {
        let json = r#"{"code": "NoTable"}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let err = table_to_matrix(table, 2).unwrap_err();
        assert!(matches!(err, MatrixError::Code(ref c) if c == "NoTable"));
    }

    #[test]
    fn test_table_to_matrix_shape_mismatch() {
        let json = r#"{"code": "Ok", "distances": [[0]]}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let err = table_to_matrix(table, 2).unwrap_err();
        assert!(matches!(err, MatrixError::Shape { expected: 2, got: 1 }));
    }

    #[test]
    fn test_osrm_client_name() {
        assert_eq!(client().name(), "OSRM");
    }

    #[tokio::test]
    async fn test_osrm_unreachable_is_error() {
        let client = OsrmClient::new(
            OsrmConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        let result = client
            .get_matrix(&[Location::new(20.0, 20.0), Location::new(30.0, 30.0)])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires running OSRM server"]
    async fn test_osrm_integration_two_points() {
        let client = OsrmClient::new(OsrmConfig::new("http://localhost:5000")).unwrap();
        let matrix = client
            .get_matrix(&[Location::new(20.0, 20.0), Location::new(25.0, 25.0)])
            .await
            .unwrap();
        assert_eq!(matrix.size(), 2);
        assert!(matrix.distance(0, 1) > 0);
    }
}
