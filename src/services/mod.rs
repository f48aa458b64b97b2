//! Geo provider (C2): geocoding, routing, and the TTL cache fronting both.

pub mod cache;
pub mod geocoding;
pub mod nominatim;
pub mod provider;
pub mod routing;

pub use provider::GeoProvider;
