//! Routing provider for drive routes (C2's `route` operation).
//!
//! Uses OSRM for production, a haversine-based mock for tests.

mod osrm;

pub use osrm::{OsrmClient, RouteGeometry};

use async_trait::async_trait;
use anyhow::Result;

use crate::types::geo::GeoPoint;
use crate::types::route::haversine_meters;

/// Routing provider trait for abstraction (OSRM, mock, etc.).
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<RouteGeometry>;
    fn name(&self) -> &'static str;
}

/// Mock routing provider for tests. Uses haversine distance x a road
/// coefficient and a fixed average speed.
pub struct MockRoutingProvider {
    road_coefficient: f64,
    average_speed_mph: f64,
}

impl Default for MockRoutingProvider {
    fn default() -> Self {
        Self {
            road_coefficient: 1.2,
            average_speed_mph: 55.0,
        }
    }
}

impl MockRoutingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(road_coefficient: f64, average_speed_mph: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_mph,
        }
    }
}

#[async_trait]
impl RoutingProvider for MockRoutingProvider {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<RouteGeometry> {
        if waypoints.len() < 2 {
            anyhow::bail!("route requires at least two waypoints");
        }

        let mut distance_meters = 0.0;
        for pair in waypoints.windows(2) {
            distance_meters += haversine_meters(pair[0], pair[1]) * self.road_coefficient;
        }

        let miles = distance_meters / 1609.344;
        let duration_seconds = (miles / self.average_speed_mph) * 3600.0;

        Ok(RouteGeometry {
            distance_meters,
            duration_seconds,
            points: waypoints.to_vec(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Create a routing provider based on configuration, falling back to mock
/// when no OSRM instance is reachable.
pub async fn create_routing_provider_with_fallback(osrm_url: Option<String>) -> Box<dyn RoutingProvider> {
    use tracing::{info, warn};

    if let Some(url) = osrm_url {
        match osrm::check_osrm_health(&url).await {
            Ok(()) => {
                info!("OSRM routing provider available at {url}");
                return Box::new(OsrmClient::new(&url));
            }
            Err(e) => {
                warn!("OSRM not available at {url}: {e}. Falling back to mock routing.");
            }
        }
    }

    info!("using mock routing provider (OSRM not configured or unavailable)");
    Box::new(MockRoutingProvider::new())
}
