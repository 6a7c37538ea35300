//! territory-engine core
//!
//! Geospatial territory engine: detects buildings inside an agent-drawn
//! polygon and sequences geo-located stops into a walking order.

pub mod detection;
pub mod error;
pub mod geocode;
pub mod geometry;
pub mod haversine;
pub mod overpass;
pub mod retry;
pub mod sequencer;
pub mod traits;

pub use detection::{
    BuildingDetectionResult, BuildingDetector, BuildingSource, DetectedBuilding, DetectionOptions,
};
pub use error::{DetectionError, ServiceError};
pub use geometry::{BoundingBox, PolygonPoint};
pub use haversine::LngLat;
pub use sequencer::{OptimizedStop, RouteStopCandidate, SequenceSettings, sequence_stops, total_distance_miles};
