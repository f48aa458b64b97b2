//! OSRM-wire HTTP client.
//!
//! `GET {base}/route/v1/driving/{lng,lat;lng,lat;...}
//!   ?overview=full&geometries=geojson&steps=false`
//! Response: `code == "Ok"`, `routes[0].{distance,duration,geometry.coordinates}`.
//! No polyline decoding is needed here since `geometries=geojson` delivers
//! a plain `[lng, lat]` coordinate list directly.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::geo::GeoPoint;

use super::RoutingProvider;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

pub struct RouteGeometry {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub points: Vec<GeoPoint>,
}

pub struct OsrmClient {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub async fn route(&self, waypoints: &[GeoPoint]) -> Result<RouteGeometry> {
        let coords = waypoints
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson&steps=false",
            self.base_url, coords
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to send routing request")?;

        let parsed: OsrmResponse = response
            .json()
            .await
            .context("failed to parse routing response")?;

        if parsed.code != "Ok" {
            bail!("routing provider returned code '{}'", parsed.code);
        }
        let Some(route) = parsed.routes.into_iter().next() else {
            bail!("routing provider returned no routes");
        };

        Ok(RouteGeometry {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            points: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| GeoPoint::new(lat, lng))
                .collect(),
        })
    }
}

#[async_trait]
impl RoutingProvider for OsrmClient {
    async fn route(&self, waypoints: &[GeoPoint]) -> Result<RouteGeometry> {
        OsrmClient::route(self, waypoints).await
    }

    fn name(&self) -> &'static str {
        "osrm"
    }
}

pub async fn check_osrm_health(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let response = client.get(&url).send().await?;
    if response.status().is_success() {
        Ok(())
    } else {
        bail!("OSRM returned status {}", response.status())
    }
}
