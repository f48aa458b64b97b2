//! Route model (C3) - a pure value type over a polyline.

use serde::{Deserialize, Serialize};

use super::geo::{GeoPoint, Place};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const METERS_PER_MILE: f64 = 1609.344;

/// Great-circle distance between two points, in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// A planned drive: distance, duration, an ordered polyline, and the
/// geocoded origin/destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub geometry: Vec<GeoPoint>,
    pub origin: Place,
    pub destination: Place,
}

impl Route {
    pub fn distance_miles(&self) -> f64 {
        self.distance_meters / METERS_PER_MILE
    }

    /// Position on the polyline at the given cumulative arc length. Arc
    /// length is computed by walking vertices accumulating haversine
    /// distance; once the target falls inside a segment, lat/lng are
    /// linearly interpolated within that segment. A target beyond the
    /// polyline's total length returns the last vertex; an empty-length
    /// walk returns the first vertex for `distance_meters <= 0`.
    pub fn interpolate(&self, distance_meters: f64) -> GeoPoint {
        if self.geometry.len() < 2 {
            return self.geometry.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
        }
        if distance_meters <= 0.0 {
            return self.geometry[0];
        }

        let mut accumulated = 0.0;
        for window in self.geometry.windows(2) {
            let (from, to) = (window[0], window[1]);
            let segment_len = haversine_meters(from, to);
            if accumulated + segment_len >= distance_meters {
                let remaining = distance_meters - accumulated;
                let fraction = if segment_len > 0.0 { remaining / segment_len } else { 0.0 };
                return GeoPoint::new(
                    from.lat + (to.lat - from.lat) * fraction,
                    from.lng + (to.lng - from.lng) * fraction,
                );
            }
            accumulated += segment_len;
        }

        *self.geometry.last().expect("checked len >= 2 above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: f64, lng: f64) -> Place {
        Place {
            point: GeoPoint::new(lat, lng),
            city: "Test".into(),
            state: "TX".into(),
        }
    }

    fn straight_route() -> Route {
        Route {
            distance_meters: 200_000.0,
            duration_seconds: 7_200.0,
            geometry: vec![GeoPoint::new(30.0, -97.0), GeoPoint::new(31.0, -97.0)],
            origin: place(30.0, -97.0),
            destination: place(31.0, -97.0),
        }
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = GeoPoint::new(30.0, -97.0);
        assert!(haversine_meters(p, p) < 1e-6);
    }

    #[test]
    fn interpolate_at_zero_returns_first_vertex() {
        let route = straight_route();
        let p = route.interpolate(0.0);
        assert_eq!(p.lat, 30.0);
    }

    #[test]
    fn interpolate_beyond_length_returns_last_vertex() {
        let route = straight_route();
        let total = haversine_meters(route.geometry[0], route.geometry[1]);
        let p = route.interpolate(total + 10_000.0);
        assert_eq!(p.lat, 31.0);
    }

    #[test]
    fn interpolate_midpoint_is_between_vertices() {
        let route = straight_route();
        let total = haversine_meters(route.geometry[0], route.geometry[1]);
        let p = route.interpolate(total / 2.0);
        assert!(p.lat > 30.0 && p.lat < 31.0);
    }
}
