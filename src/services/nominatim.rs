//! Nominatim-wire HTTP client for forward/reverse geocoding. US-biased
//! (`countrycodes=us`), with a state-name fallback chain and a `zoom=10`
//! reverse lookup.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::geo::{normalize_state, GeoPoint};

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
}

impl NominatimAddress {
    fn city_or_fallback(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.hamlet.as_deref())
            .or(self.municipality.as_deref())
            .or(self.county.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct NominatimSearchResult {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimReverseResult {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

pub struct GeocodeResult {
    pub point: GeoPoint,
    pub city: String,
    pub state: String,
}

pub struct ReverseGeocodeResult {
    pub city: String,
    pub state: String,
}

/// Nominatim geocoding client.
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("hos-trip-planner/0.1 (+https://example.invalid/hos-planner)")
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    /// `GET /search?q=..&format=json&limit=1&countrycodes=us&addressdetails=1`
    pub async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1&countrycodes=us&addressdetails=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to send geocoding request")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let results: Vec<NominatimSearchResult> = response
            .json()
            .await
            .context("failed to parse geocoding response")?;

        let Some(result) = results.into_iter().next() else {
            return Ok(None);
        };

        let lat: f64 = result.lat.parse().context("invalid latitude")?;
        let lng: f64 = result.lon.parse().context("invalid longitude")?;
        let address = result.address.unwrap_or(NominatimAddress {
            city: None,
            town: None,
            village: None,
            hamlet: None,
            municipality: None,
            county: None,
            state: None,
        });

        Ok(Some(GeocodeResult {
            point: GeoPoint::new(lat, lng),
            city: address.city_or_fallback().unwrap_or("Unknown").to_string(),
            state: address
                .state
                .as_deref()
                .map(normalize_state)
                .unwrap_or_default(),
        }))
    }

    /// `GET /reverse?lat=..&lon=..&format=json&addressdetails=1&zoom=10`
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<ReverseGeocodeResult>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&addressdetails=1&zoom=10",
            self.base_url, lat, lng
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to send reverse geocoding request")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let result: NominatimReverseResult = response
            .json()
            .await
            .context("failed to parse reverse geocoding response")?;

        let address = result.address.unwrap_or(NominatimAddress {
            city: None,
            town: None,
            village: None,
            hamlet: None,
            municipality: None,
            county: None,
            state: None,
        });

        Ok(Some(ReverseGeocodeResult {
            city: address.city_or_fallback().unwrap_or("Unknown").to_string(),
            state: address
                .state
                .as_deref()
                .map(normalize_state)
                .unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hits the public Nominatim API; ignored by default.
    #[tokio::test]
    #[ignore]
    async fn test_geocode_austin() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org");
        let result = client.geocode("Austin, TX").await.unwrap();
        assert!(result.is_some());
    }
}
