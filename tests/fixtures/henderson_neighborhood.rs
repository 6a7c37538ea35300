//! Henderson, NV residential blocks and stops for realistic fixtures.
//!
//! Coordinates are approximate street-level positions in the Green Valley
//! area, good enough for containment and ordering checks.

use territory_engine::geometry::{EARTH_RADIUS_METERS, PolygonPoint};
use territory_engine::sequencer::RouteStopCandidate;
use territory_engine::traits::FootprintFeature;

/// A named stop with coordinates.
#[derive(Debug, Clone)]
pub struct Stop {
    pub name: &'static str,
    pub lng: f64,
    pub lat: f64,
}

impl Stop {
    pub const fn new(name: &'static str, lng: f64, lat: f64) -> Self {
        Self { name, lng, lat }
    }

    pub fn candidate(&self) -> RouteStopCandidate<&'static str> {
        RouteStopCandidate::new(self.name, [self.lng, self.lat])
    }
}

// ============================================================================
// Green Valley doors, listed west to east along two streets
// ============================================================================

pub const GREEN_VALLEY_STOPS: &[Stop] = &[
    Stop::new("2501 Wigwam Pkwy", -115.0862, 36.0255),
    Stop::new("2513 Wigwam Pkwy", -115.0851, 36.0256),
    Stop::new("2525 Wigwam Pkwy", -115.0840, 36.0255),
    Stop::new("2537 Wigwam Pkwy", -115.0829, 36.0256),
    Stop::new("2549 Wigwam Pkwy", -115.0818, 36.0255),
    Stop::new("118 Paradise Hills Dr", -115.0861, 36.0291),
    Stop::new("130 Paradise Hills Dr", -115.0849, 36.0292),
    Stop::new("142 Paradise Hills Dr", -115.0837, 36.0291),
    Stop::new("154 Paradise Hills Dr", -115.0826, 36.0292),
    Stop::new("166 Paradise Hills Dr", -115.0814, 36.0291),
];

/// South-west corner of the Wigwam block.
pub const WIGWAM_BLOCK_ORIGIN: (f64, f64) = (36.0250, -115.0870);

/// Rectangle `width_m` east by `height_m` north from (lat, lng).
pub fn rect_polygon(lat: f64, lng: f64, width_m: f64, height_m: f64) -> Vec<PolygonPoint> {
    let dlat = (height_m / EARTH_RADIUS_METERS).to_degrees();
    let dlng = (width_m / (EARTH_RADIUS_METERS * lat.to_radians().cos())).to_degrees();
    vec![
        PolygonPoint::new(lat, lng),
        PolygonPoint::new(lat + dlat, lng),
        PolygonPoint::new(lat + dlat, lng + dlng),
        PolygonPoint::new(lat, lng + dlng),
    ]
}

/// 60m x 55m block: 3300 m², eight expected buildings.
pub fn small_block() -> Vec<PolygonPoint> {
    rect_polygon(WIGWAM_BLOCK_ORIGIN.0, WIGWAM_BLOCK_ORIGIN.1, 60.0, 55.0)
}

/// 150m x 120m block: large enough to hit the building cap.
pub fn large_block() -> Vec<PolygonPoint> {
    rect_polygon(WIGWAM_BLOCK_ORIGIN.0, WIGWAM_BLOCK_ORIGIN.1, 150.0, 120.0)
}

/// Footprint at a fractional offset inside `polygon`'s bounding rectangle.
pub fn feature_at(polygon: &[PolygonPoint], id: &str, north: f64, east: f64) -> FootprintFeature {
    let min_lat = polygon.iter().map(|p| p.latitude).fold(f64::INFINITY, f64::min);
    let max_lat = polygon.iter().map(|p| p.latitude).fold(f64::NEG_INFINITY, f64::max);
    let min_lng = polygon.iter().map(|p| p.longitude).fold(f64::INFINITY, f64::min);
    let max_lng = polygon.iter().map(|p| p.longitude).fold(f64::NEG_INFINITY, f64::max);
    FootprintFeature {
        id: id.to_string(),
        latitude: min_lat + (max_lat - min_lat) * north,
        longitude: min_lng + (max_lng - min_lng) * east,
    }
}
