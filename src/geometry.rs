//! Planar geometry helpers for agent-drawn polygons.
//!
//! Polygons are sequences of (latitude, longitude) vertices, implicitly
//! closed. Longitude is treated as the x-axis and latitude as the y-axis.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used by the local area projection.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Guard for near-horizontal edges in the ray-casting test.
const EDGE_EPSILON: f64 = f64::EPSILON;

/// A single polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl PolygonPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Finite and within latitude [-90, 90], longitude [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.latitude.abs() <= 90.0 && self.longitude.abs() <= 180.0
    }
}

/// Axis-aligned bounds of a polygon in degrees.
///
/// An empty box has `min > max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min_lat: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        min_lng: f64::INFINITY,
        max_lng: f64::NEG_INFINITY,
    };

    /// True when no finite point contributed to the box.
    pub fn is_empty(&self) -> bool {
        self.min_lat > self.max_lat || self.min_lng > self.max_lng
    }

    pub fn contains(&self, point: PolygonPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    fn extend(&mut self, point: PolygonPoint) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.min_lng = self.min_lng.min(point.longitude);
        self.max_lng = self.max_lng.max(point.longitude);
    }
}

/// Compute the bounding box of a polygon, skipping non-finite vertices.
pub fn bounding_box(polygon: &[PolygonPoint]) -> BoundingBox {
    let mut bbox = BoundingBox::EMPTY;
    for point in polygon.iter().filter(|p| p.is_finite()) {
        bbox.extend(*point);
    }
    bbox
}

/// Even-odd ray casting containment test.
///
/// A vertex whose latitude equals the test latitude is treated as lying
/// above the ray, so each crossing is counted exactly once. Points exactly
/// on an edge may land on either side.
pub fn point_in_polygon(point: PolygonPoint, polygon: &[PolygonPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let x = point.longitude;
    let y = point.latitude;
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].longitude, polygon[i].latitude);
        let (xj, yj) = (polygon[j].longitude, polygon[j].latitude);

        if (yi > y) != (yj > y) {
            let mut dy = yj - yi;
            if dy.abs() < EDGE_EPSILON {
                dy = EDGE_EPSILON.copysign(dy);
            }
            let x_cross = (xj - xi) * (y - yi) / dy + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Approximate polygon area in square meters.
///
/// Vertices are projected onto a local equirectangular plane centered on
/// the mean latitude, then the shoelace formula is applied. Only valid for
/// small polygons.
pub fn polygon_area(polygon: &[PolygonPoint]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let mean_lat = polygon.iter().map(|p| p.latitude).sum::<f64>() / polygon.len() as f64;
    let lng_scale = mean_lat.to_radians().cos();
    // Offsets from the first vertex keep the shoelace products small.
    let origin = polygon[0];

    let projected: Vec<(f64, f64)> = polygon
        .iter()
        .map(|p| {
            let x = (p.longitude - origin.longitude).to_radians() * lng_scale * EARTH_RADIUS_METERS;
            let y = (p.latitude - origin.latitude).to_radians() * EARTH_RADIUS_METERS;
            (x, y)
        })
        .collect();

    let mut twice_area = 0.0;
    for (i, &(x1, y1)) in projected.iter().enumerate() {
        let (x2, y2) = projected[(i + 1) % projected.len()];
        twice_area += x1 * y2 - x2 * y1;
    }

    twice_area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<PolygonPoint> {
        vec![
            PolygonPoint::new(0.0, 0.0),
            PolygonPoint::new(0.0, 1.0),
            PolygonPoint::new(1.0, 1.0),
            PolygonPoint::new(1.0, 0.0),
        ]
    }

    /// Square of `side_m` meters with its south-west corner at (lat, lng).
    fn square_meters(lat: f64, lng: f64, side_m: f64) -> Vec<PolygonPoint> {
        let dlat = (side_m / EARTH_RADIUS_METERS).to_degrees();
        let dlng = (side_m / (EARTH_RADIUS_METERS * lat.to_radians().cos())).to_degrees();
        vec![
            PolygonPoint::new(lat, lng),
            PolygonPoint::new(lat + dlat, lng),
            PolygonPoint::new(lat + dlat, lng + dlng),
            PolygonPoint::new(lat, lng + dlng),
        ]
    }

    #[test]
    fn test_point_inside_unit_square() {
        assert!(point_in_polygon(PolygonPoint::new(0.5, 0.5), &unit_square()));
    }

    #[test]
    fn test_point_outside_unit_square() {
        assert!(!point_in_polygon(PolygonPoint::new(2.0, 2.0), &unit_square()));
        assert!(!point_in_polygon(PolygonPoint::new(-0.1, 0.5), &unit_square()));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // U shape opening north
        let polygon = vec![
            PolygonPoint::new(0.0, 0.0),
            PolygonPoint::new(3.0, 0.0),
            PolygonPoint::new(3.0, 1.0),
            PolygonPoint::new(1.0, 1.0),
            PolygonPoint::new(1.0, 2.0),
            PolygonPoint::new(3.0, 2.0),
            PolygonPoint::new(3.0, 3.0),
            PolygonPoint::new(0.0, 3.0),
        ];
        assert!(point_in_polygon(PolygonPoint::new(2.0, 0.5), &polygon));
        assert!(!point_in_polygon(PolygonPoint::new(2.0, 1.5), &polygon));
        assert!(point_in_polygon(PolygonPoint::new(2.0, 2.5), &polygon));
    }

    #[test]
    fn test_ray_through_vertex_counts_once() {
        // The ray at latitude 0.5 runs exactly through two of the diamond's vertices
        let diamond = vec![
            PolygonPoint::new(0.0, 0.5),
            PolygonPoint::new(0.5, 1.0),
            PolygonPoint::new(1.0, 0.5),
            PolygonPoint::new(0.5, 0.0),
        ];
        assert!(point_in_polygon(PolygonPoint::new(0.5, 0.5), &diamond));
        assert!(!point_in_polygon(PolygonPoint::new(0.5, 1.5), &diamond));
    }

    #[test]
    fn test_edge_points_follow_half_open_rule() {
        let square = unit_square();
        // South and west edges count as inside, north and east as outside
        assert!(point_in_polygon(PolygonPoint::new(0.0, 0.5), &square));
        assert!(point_in_polygon(PolygonPoint::new(0.5, 0.0), &square));
        assert!(!point_in_polygon(PolygonPoint::new(1.0, 0.5), &square));
        assert!(!point_in_polygon(PolygonPoint::new(0.5, 1.0), &square));
    }

    #[test]
    fn test_degenerate_polygons_contain_nothing() {
        let line = vec![PolygonPoint::new(0.0, 0.0), PolygonPoint::new(1.0, 1.0)];
        assert!(!point_in_polygon(PolygonPoint::new(0.5, 0.5), &line));

        let flat = vec![
            PolygonPoint::new(0.0, 0.0),
            PolygonPoint::new(0.0, 1.0),
            PolygonPoint::new(0.0, 2.0),
        ];
        assert!(!point_in_polygon(PolygonPoint::new(0.0, 0.5), &flat));
    }

    #[test]
    fn test_point_validity_checks_range() {
        assert!(PolygonPoint::new(36.0255, -115.0862).is_valid());
        assert!(PolygonPoint::new(-90.0, 180.0).is_valid());
        assert!(!PolygonPoint::new(500.0, 0.0).is_valid());
        assert!(!PolygonPoint::new(0.0, -180.5).is_valid());
        assert!(!PolygonPoint::new(f64::NAN, 0.0).is_valid());
        assert!(PolygonPoint::new(1e308, 0.0).is_finite());
        assert!(!PolygonPoint::new(1e308, 0.0).is_valid());
    }

    #[test]
    fn test_bounding_box_skips_non_finite() {
        let mut polygon = unit_square();
        polygon.push(PolygonPoint::new(f64::NAN, 5.0));
        polygon.push(PolygonPoint::new(2.0, f64::INFINITY));

        let bbox = bounding_box(&polygon);
        assert_eq!(bbox.min_lat, 0.0);
        assert_eq!(bbox.max_lat, 1.0);
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lng, 1.0);
        assert!(!bbox.is_empty());
    }

    #[test]
    fn test_bounding_box_of_nothing_is_empty() {
        let bbox = bounding_box(&[]);
        assert!(bbox.is_empty());
        assert!(bbox.min_lat > bbox.max_lat);
        assert!(bbox.min_lng > bbox.max_lng);
        assert!(!bbox.contains(PolygonPoint::new(0.0, 0.0)));

        let all_bad = vec![PolygonPoint::new(f64::NAN, f64::NAN); 3];
        assert!(bounding_box(&all_bad).is_empty());
    }

    #[test]
    fn test_area_of_twenty_meter_square() {
        let square = square_meters(40.0, -75.0, 20.0);
        let area = polygon_area(&square);
        assert!((area - 400.0).abs() / 400.0 < 0.01, "expected ~400 m², got {}", area);
    }

    #[test]
    fn test_area_of_city_block() {
        let square = square_meters(36.1, -115.1, 100.0);
        let area = polygon_area(&square);
        assert!((area - 10_000.0).abs() / 10_000.0 < 0.01, "expected ~10000 m², got {}", area);
    }

    #[test]
    fn test_area_ignores_winding_direction() {
        let square = square_meters(51.5, -0.12, 50.0);
        let mut reversed = square.clone();
        reversed.reverse();
        assert!((polygon_area(&square) - polygon_area(&reversed)).abs() < 1e-6);
    }

    #[test]
    fn test_area_needs_three_points() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(
            polygon_area(&[PolygonPoint::new(0.0, 0.0), PolygonPoint::new(1.0, 1.0)]),
            0.0
        );
    }
}
