//! Collaborator seams for the territory engine.
//!
//! The engine never talks to persistence or to a specific provider directly.
//! Callers plug in implementations of these traits for their own data
//! models and services.

use crate::error::ServiceError;
use crate::geometry::BoundingBox;
use crate::haversine::LngLat;

/// A building-like feature returned by a footprint service.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintFeature {
    /// Provider-scoped feature id.
    pub id: String,
    /// Representative point (own point, centroid, or first vertex).
    pub latitude: f64,
    pub longitude: f64,
}

/// Queries building footprints inside a bounding box.
///
/// The returned set may be a superset of what lies inside the polygon the
/// box was derived from.
pub trait FootprintSource: Send + Sync {
    fn features_in(&self, bbox: &BoundingBox) -> Result<Vec<FootprintFeature>, ServiceError>;
}

/// Turns a coordinate into a formatted street address.
pub trait ReverseGeocoder: Send + Sync {
    /// Whether a credential is configured. When false the engine skips
    /// lookups entirely.
    fn has_credential(&self) -> bool {
        true
    }

    fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, ServiceError>;
}

/// Geocoder for deployments without a geocoding key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl ReverseGeocoder for NoGeocoder {
    fn has_credential(&self) -> bool {
        false
    }

    fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> Result<String, ServiceError> {
        Err(ServiceError::MissingCredential)
    }
}

/// A location that can be sequenced into a route.
pub trait StopCandidate {
    type Ref: Clone;

    fn property_ref(&self) -> &Self::Ref;

    /// `[lng, lat]` coordinates, if known.
    fn coordinates(&self) -> Option<LngLat>;
}
