//! Geographic primitives shared by the route model and the geo provider.

use serde::{Deserialize, Serialize};

/// A point on the Earth's surface in WGS84 degrees, with an optional
/// city/state resolved by geocoding or reverse geocoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A geocoded place: coordinates plus the city/state the provider resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub point: GeoPoint,
    pub city: String,
    /// Two-letter US state abbreviation, normalized from whatever the
    /// provider returned.
    pub state: String,
}

/// Normalize a full US state name (or an already-valid abbreviation) to its
/// two-letter postal code. Unknown input is returned unchanged, uppercased
/// if it is already two letters, so callers always get *some* value.
pub fn normalize_state(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return trimmed.to_uppercase();
    }
    US_STATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// The 50 states plus the District of Columbia, full name to USPS code.
pub const US_STATES: [(&str, &str); 51] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_full_name_to_abbreviation() {
        assert_eq!(normalize_state("Texas"), "TX");
        assert_eq!(normalize_state("new york"), "NY");
    }

    #[test]
    fn passes_through_existing_abbreviation() {
        assert_eq!(normalize_state("ca"), "CA");
    }

    #[test]
    fn unknown_input_is_returned_unchanged() {
        assert_eq!(normalize_state("Atlantis"), "Atlantis");
    }

    #[test]
    fn table_has_fifty_one_entries() {
        assert_eq!(US_STATES.len(), 51);
    }
}
