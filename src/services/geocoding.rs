//! Geocoding abstraction layer (C2 forward/reverse geocode).
//!
//! - `MockGeocoder` for tests (deterministic, no network).
//! - `NominatimGeocoder` for production, circuit-breaker protected.
//!
//! Backend selected via `GEOCODER_BACKEND`: "mock" | "nominatim".

use anyhow::Result;
use async_trait::async_trait;

use crate::types::geo::{GeoPoint, Place};

/// Geocoder trait - abstraction for all geocoding implementations.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward geocode a free-text query to a place. US-biased; normalizes
    /// full state names to two-letter codes.
    async fn geocode(&self, query: &str) -> Result<Place>;

    /// Reverse geocode coordinates to city/state. Must never fail for
    /// valid coordinates: on provider failure it returns `("Unknown", "")`
    /// rather than propagating an error.
    async fn reverse_geocode(&self, point: GeoPoint) -> (String, String);

    fn name(&self) -> &'static str;
}

// ============================================================================
// MockGeocoder
// ============================================================================

/// Deterministic fake geocoder: same query always maps to the same point,
/// different queries to different points, all within continental-US
/// bounds via a hash-of-input technique.
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_point(query: &str) -> GeoPoint {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        query.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = 26.0; // south Texas
        const LAT_MAX: f64 = 47.0; // northern border states
        const LNG_MIN: f64 = -122.0; // Pacific coast
        const LNG_MAX: f64 = -75.0; // Atlantic coast

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        GeoPoint::new(
            LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        )
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Place> {
        let point = Self::hash_to_point(query);
        let city = query.split(',').next().unwrap_or(query).trim().to_string();
        let state = query
            .split(',')
            .nth(1)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "TX".to_string());
        Ok(Place { point, city, state })
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> (String, String) {
        let key = format!("{:.4},{:.4}", point.lat, point.lng);
        ("En Route".to_string(), {
            let _ = key;
            String::new()
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// CircuitBreaker
// ============================================================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Circuit breaker preventing repeated calls to a failing provider.
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    threshold: u32,
    last_failure: Arc<Mutex<Option<Instant>>>,
    recovery_time: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            threshold,
            last_failure: Arc::new(Mutex::new(None)),
            recovery_time,
        }
    }

    pub fn is_open(&self) -> bool {
        let count = self.failure_count.load(Ordering::Relaxed);
        if count >= self.threshold {
            if let Ok(last) = self.last_failure.try_lock() {
                if let Some(last_time) = *last {
                    if last_time.elapsed() >= self.recovery_time {
                        return false;
                    }
                }
            }
            return true;
        }
        false
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_failure.try_lock() {
            *last = Some(Instant::now());
        }
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

// ============================================================================
// NominatimGeocoder
// ============================================================================

use crate::services::nominatim::NominatimClient;

const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 3;
const DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS: u64 = 300;

/// Production geocoder: wraps `NominatimClient` with circuit-breaker
/// protection.
pub struct NominatimGeocoder {
    client: NominatimClient,
    pub(crate) circuit_breaker: CircuitBreaker,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(
            base_url,
            DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            Duration::from_secs(DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS),
        )
    }

    pub fn with_config(base_url: &str, threshold: u32, recovery: Duration) -> Self {
        Self {
            client: NominatimClient::new(base_url),
            circuit_breaker: CircuitBreaker::new(threshold, recovery),
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("NOMINATIM_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());
        let threshold = std::env::var("NOMINATIM_CB_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CIRCUIT_BREAKER_THRESHOLD);
        let recovery_secs = std::env::var("NOMINATIM_CB_RECOVERY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS);
        Self::with_config(&base_url, threshold, Duration::from_secs(recovery_secs))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Place> {
        if self.circuit_breaker.is_open() {
            anyhow::bail!("geocoding service temporarily unavailable (circuit breaker open)");
        }

        match self.client.geocode(query).await {
            Ok(Some(result)) => {
                self.circuit_breaker.record_success();
                Ok(Place {
                    point: result.point,
                    city: result.city,
                    state: result.state,
                })
            }
            Ok(None) => {
                self.circuit_breaker.record_success();
                anyhow::bail!("no geocoding result for '{query}'");
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                tracing::error!("geocoding failed: {e}");
                Err(e)
            }
        }
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> (String, String) {
        if self.circuit_breaker.is_open() {
            return ("Unknown".to_string(), String::new());
        }
        match self.client.reverse_geocode(point.lat, point.lng).await {
            Ok(Some(result)) => {
                self.circuit_breaker.record_success();
                (result.city, result.state)
            }
            Ok(None) => {
                self.circuit_breaker.record_success();
                ("Unknown".to_string(), String::new())
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                tracing::warn!("reverse geocoding failed, using fallback: {e}");
                ("Unknown".to_string(), String::new())
            }
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

/// Create a geocoder based on the `GEOCODER_BACKEND` environment variable.
pub fn create_geocoder() -> Box<dyn Geocoder> {
    let backend = std::env::var("GEOCODER_BACKEND").unwrap_or_else(|_| "mock".to_string());
    match backend.as_str() {
        "mock" => {
            tracing::info!("using MockGeocoder");
            Box::new(MockGeocoder::new())
        }
        "nominatim" => {
            tracing::info!("using NominatimGeocoder");
            Box::new(NominatimGeocoder::from_env())
        }
        other => {
            tracing::warn!("unknown GEOCODER_BACKEND '{other}', using mock");
            Box::new(MockGeocoder::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_geocoder_is_deterministic() {
        let geocoder = MockGeocoder::new();
        let a = geocoder.geocode("Dallas, TX").await.unwrap();
        let b = geocoder.geocode("Dallas, TX").await.unwrap();
        assert_eq!(a.point.lat, b.point.lat);
        assert_eq!(a.point.lng, b.point.lng);
    }

    #[tokio::test]
    async fn mock_geocoder_differs_for_different_queries() {
        let geocoder = MockGeocoder::new();
        let dallas = geocoder.geocode("Dallas, TX").await.unwrap();
        let miami = geocoder.geocode("Miami, FL").await.unwrap();
        assert_ne!(dallas.point.lat, miami.point.lat);
    }

    #[tokio::test]
    async fn mock_geocoder_stays_within_continental_us_bounds() {
        let geocoder = MockGeocoder::new();
        for query in ["Dallas, TX", "Seattle, WA", "Miami, FL", "Bangor, ME"] {
            let place = geocoder.geocode(query).await.unwrap();
            assert!(place.point.lat >= 26.0 && place.point.lat <= 47.0);
            assert!(place.point.lng >= -122.0 && place.point.lng <= -75.0);
        }
    }

    #[tokio::test]
    async fn mock_reverse_geocode_never_fails() {
        let geocoder = MockGeocoder::new();
        let (city, _state) = geocoder.reverse_geocode(GeoPoint::new(40.0, -90.0)).await;
        assert_eq!(city, "En Route");
    }

    #[test]
    fn circuit_breaker_starts_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(!breaker.is_open());
    }

    #[test]
    fn circuit_breaker_opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn circuit_breaker_resets_on_success() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
    }

    #[tokio::test]
    async fn circuit_breaker_closes_after_recovery_time() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(30));
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!breaker.is_open());
    }

    #[tokio::test]
    async fn nominatim_geocoder_rejects_when_circuit_breaker_open() {
        let geocoder = NominatimGeocoder::with_config(
            "https://nominatim.openstreetmap.org",
            1,
            Duration::from_secs(300),
        );
        geocoder.circuit_breaker.record_failure();
        assert!(geocoder.circuit_breaker.is_open());
        let result = geocoder.geocode("Austin, TX").await;
        assert!(result.is_err());
    }
}
