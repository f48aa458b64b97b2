//! The composed geo provider (C2): geocoding + routing behind a TTL
//! cache and timeout policy. This is the only collaborator the planner
//! orchestrator (C7) talks to for geo data.

use std::time::Duration;

use crate::types::error::PlannerError;
use crate::types::geo::{GeoPoint, Place};
use crate::types::route::Route;

use super::cache::TtlCache;
use super::geocoding::Geocoder;
use super::routing::RoutingProvider;

const GEOCODE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const ROUTE_TTL: Duration = Duration::from_secs(3600);
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
const ROUTE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GeoProvider {
    geocoder: Box<dyn Geocoder>,
    router: Box<dyn RoutingProvider>,
    geocode_cache: TtlCache<String, Place>,
    reverse_cache: TtlCache<String, (String, String)>,
    route_cache: TtlCache<String, RouteResult>,
}

#[derive(Clone)]
struct RouteResult {
    distance_meters: f64,
    duration_seconds: f64,
    geometry: Vec<GeoPoint>,
}

impl GeoProvider {
    pub fn new(geocoder: Box<dyn Geocoder>, router: Box<dyn RoutingProvider>) -> Self {
        Self {
            geocoder,
            router,
            geocode_cache: TtlCache::new(GEOCODE_TTL),
            reverse_cache: TtlCache::new(GEOCODE_TTL),
            route_cache: TtlCache::new(ROUTE_TTL),
        }
    }

    fn geocode_key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    fn reverse_key(point: GeoPoint) -> String {
        format!("{:.4},{:.4}", point.lat, point.lng)
    }

    fn route_key(waypoints: &[GeoPoint]) -> String {
        waypoints
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `geocode(query) -> Place`, US-biased, cached for 7 days.
    pub async fn geocode(&self, query: &str) -> Result<Place, PlannerError> {
        let key = Self::geocode_key(query);
        if let Some(place) = self.geocode_cache.get(&key) {
            return Ok(place);
        }

        let place = tokio::time::timeout(GEOCODE_TIMEOUT, self.geocoder.geocode(query))
            .await
            .map_err(|_| PlannerError::TransientProvider {
                message: format!("geocode timed out after {GEOCODE_TIMEOUT:?}"),
            })?
            .map_err(|e| PlannerError::Geocoding {
                message: e.to_string(),
            })?;

        self.geocode_cache.put(key, place.clone());
        Ok(place)
    }

    /// `reverse_geocode(lat, lng) -> (city, state)`. Never fails for valid
    /// coordinates; a provider error degrades to `("Unknown", "")`.
    pub async fn reverse_geocode(&self, point: GeoPoint) -> (String, String) {
        let bucketed = GeoPoint::new(
            (point.lat * 10_000.0).round() / 10_000.0,
            (point.lng * 10_000.0).round() / 10_000.0,
        );
        let key = Self::reverse_key(bucketed);
        if let Some(result) = self.reverse_cache.get(&key) {
            return result;
        }

        let result = match tokio::time::timeout(GEOCODE_TIMEOUT, self.geocoder.reverse_geocode(bucketed)).await {
            Ok(result) => result,
            Err(_) => ("Unknown".to_string(), String::new()),
        };

        self.reverse_cache.put(key, result.clone());
        result
    }

    /// `route(origin, destination, waypoints?) -> Route`, cached for 1
    /// hour keyed on the semicolon-joined waypoint list.
    pub async fn route(&self, origin: Place, destination: Place) -> Result<Route, PlannerError> {
        let waypoints = vec![origin.point, destination.point];
        let key = Self::route_key(&waypoints);

        let cached = self.route_cache.get(&key);
        let result = if let Some(cached) = cached {
            cached
        } else {
            let geometry = tokio::time::timeout(ROUTE_TIMEOUT, self.router.route(&waypoints))
                .await
                .map_err(|_| PlannerError::TransientProvider {
                    message: format!("route timed out after {ROUTE_TIMEOUT:?}"),
                })?
                .map_err(|e| PlannerError::Routing {
                    message: e.to_string(),
                })?;

            let result = RouteResult {
                distance_meters: geometry.distance_meters,
                duration_seconds: geometry.duration_seconds,
                geometry: geometry.points,
            };
            self.route_cache.put(key, result.clone());
            result
        };

        Ok(Route {
            distance_meters: result.distance_meters,
            duration_seconds: result.duration_seconds,
            geometry: result.geometry,
            origin,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geocoding::MockGeocoder;
    use crate::services::routing::MockRoutingProvider;

    fn provider() -> GeoProvider {
        GeoProvider::new(Box::new(MockGeocoder::new()), Box::new(MockRoutingProvider::new()))
    }

    #[tokio::test]
    async fn geocode_cache_miss_then_hit_returns_equivalent_value() {
        let provider = provider();
        let first = provider.geocode("Dallas, TX").await.unwrap();
        assert_eq!(provider.geocode_cache.len(), 1);
        let second = provider.geocode("Dallas, TX").await.unwrap();
        assert_eq!(first.point.lat, second.point.lat);
        assert_eq!(first.point.lng, second.point.lng);
    }

    #[tokio::test]
    async fn reverse_geocode_never_errors() {
        let provider = provider();
        let (city, _) = provider.reverse_geocode(GeoPoint::new(40.0, -90.0)).await;
        assert_eq!(city, "En Route");
    }

    #[tokio::test]
    async fn route_is_cached_by_waypoint_key() {
        let provider = provider();
        let origin = provider.geocode("Dallas, TX").await.unwrap();
        let destination = provider.geocode("Miami, FL").await.unwrap();
        let route = provider.route(origin.clone(), destination.clone()).await.unwrap();
        assert!(route.distance_meters > 0.0);
        assert_eq!(provider.route_cache.len(), 1);
    }
}
