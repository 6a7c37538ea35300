//! Great-circle distance between `[longitude, latitude]` pairs.
//!
//! Coordinates follow the GeoJSON ordering used by the rest of the system:
//! longitude first, latitude second.

use serde::{Deserialize, Serialize};

/// Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A `[lng, lat]` coordinate pair.
///
/// Serializes as a two-element array so it round-trips through
/// GeoJSON-style payloads unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const ORIGIN: Self = Self { lng: 0.0, lat: 0.0 };

    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Finite and inside the valid latitude/longitude ranges.
    pub fn is_usable(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(point: LngLat) -> Self {
        [point.lng, point.lat]
    }
}

/// Haversine distance between two points in miles.
pub fn haversine_miles(from: LngLat, to: LngLat) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_MILES * c
}
