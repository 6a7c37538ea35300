//! Building detection inside an agent-drawn polygon.
//!
//! Live footprints come from a [`FootprintSource`], are filtered by polygon
//! containment and then reverse geocoded. When the live data is missing or
//! thin, the result is backfilled with simulated buildings sampled inside
//! the polygon. External failures never abort a run; they turn into
//! warnings on the result.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;
use rand::distr::{Distribution, Uniform};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DetectionError, ServiceError};
use crate::geometry::{BoundingBox, PolygonPoint, bounding_box, point_in_polygon, polygon_area};
use crate::retry::{RetryPolicy, with_retries, with_retries_if};
use crate::traits::{FootprintFeature, FootprintSource, ReverseGeocoder};

pub const FOOTPRINTS_UNAVAILABLE_WARNING: &str =
    "Unable to fetch live building data; using simulated points.";
pub const NO_GEOCODING_KEY_WARNING: &str =
    "No geocoding API key configured; addresses are approximate coordinates.";
pub const GEOCODING_FAILED_WARNING: &str =
    "Reverse lookup failed for some buildings; addresses are approximate coordinates.";
pub const BACKFILL_INCOMPLETE_WARNING: &str =
    "Could not place every simulated building inside the polygon.";
pub const NO_COORDINATES_WARNING: &str =
    "Polygon has missing or out-of-range coordinates; no buildings detected.";

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)").expect("valid leading number pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingSource {
    Live,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedBuilding {
    /// Unique within one detection run; `live-` or `sim-` prefixed.
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_number: Option<u32>,
    pub source: BuildingSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingDetectionResult {
    /// Live buildings in discovery order, then simulated ones.
    pub buildings: Vec<DetectedBuilding>,
    /// Advisory messages, each appearing once.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DetectionOptions {
    pub footprint_retry: RetryPolicy,
    pub geocode_retry: RetryPolicy,
    /// Assumed lot size used to turn polygon area into a building count.
    pub sq_meters_per_building: f64,
    pub min_buildings: usize,
    pub max_buildings: usize,
    /// Random draws per simulated building before backfill gives up.
    pub sample_attempts: u32,
    /// Number of reverse lookups in flight at once. 1 means sequential.
    pub geocode_concurrency: usize,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            footprint_retry: RetryPolicy::new(3, Duration::from_millis(800)),
            geocode_retry: RetryPolicy::new(2, Duration::from_millis(400)),
            sq_meters_per_building: 400.0,
            min_buildings: 3,
            max_buildings: 25,
            sample_attempts: 30,
            geocode_concurrency: 1,
        }
    }
}

impl DetectionOptions {
    /// Number of buildings a polygon of `area_sq_m` should yield.
    pub fn target_count(&self, area_sq_m: f64) -> usize {
        let estimate = area_sq_m / self.sq_meters_per_building;
        // NaN and non-positive estimates fall through to the minimum
        let raw = if estimate > 0.0 { estimate.round() as usize } else { 0 };
        raw.max(self.min_buildings).min(self.max_buildings)
    }
}

/// Target building count under the default options.
pub fn target_building_count(area_sq_m: f64) -> usize {
    DetectionOptions::default().target_count(area_sq_m)
}

/// Leading street number of a formatted address, e.g. `1200` in
/// `"1200 Main St, ..."`.
pub fn extract_building_number(address: &str) -> Option<u32> {
    LEADING_NUMBER
        .captures(address)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Address used when no reverse lookup result is available.
pub fn fallback_address(latitude: f64, longitude: f64) -> String {
    format!("Building at {:.6}, {:.6}", latitude, longitude)
}

/// Ordered warning list that drops repeats.
#[derive(Debug, Default)]
struct Warnings(Vec<String>);

impl Warnings {
    fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.0.contains(&message) {
            self.0.push(message);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

enum GeocodeOutcome {
    Address(String),
    NoCredential,
    Failed,
}

pub struct BuildingDetector<F, G> {
    footprints: F,
    geocoder: G,
    options: DetectionOptions,
}

impl<F, G> BuildingDetector<F, G>
where
    F: FootprintSource,
    G: ReverseGeocoder,
{
    pub fn new(footprints: F, geocoder: G) -> Self {
        Self {
            footprints,
            geocoder,
            options: DetectionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Detect buildings inside `polygon`, sampling backfill points from the
    /// thread-local RNG.
    pub fn detect(&self, polygon: &[PolygonPoint]) -> Result<BuildingDetectionResult, DetectionError> {
        let mut rng = rand::rng();
        self.detect_with_rng(polygon, &mut rng)
    }

    /// Detect buildings inside `polygon`.
    ///
    /// Only a polygon with fewer than three points is an error, and it is
    /// rejected before any external call. A polygon with a non-finite or
    /// out-of-range vertex yields an empty result with a warning, also
    /// without external calls.
    pub fn detect_with_rng<R: Rng>(
        &self,
        polygon: &[PolygonPoint],
        rng: &mut R,
    ) -> Result<BuildingDetectionResult, DetectionError> {
        if polygon.len() < 3 {
            return Err(DetectionError::InvalidPolygon {
                points: polygon.len(),
            });
        }

        let mut warnings = Warnings::default();
        if let Some(bad) = polygon.iter().find(|p| !p.is_valid()) {
            warn!(
                points = polygon.len(),
                latitude = bad.latitude,
                longitude = bad.longitude,
                "polygon has an unusable vertex"
            );
            warnings.push(NO_COORDINATES_WARNING);
            return Ok(BuildingDetectionResult {
                buildings: Vec::new(),
                warnings: warnings.into_vec(),
            });
        }

        let bbox = bounding_box(polygon);
        let area = polygon_area(polygon);
        let target = self.options.target_count(area);
        info!(area_sq_m = area, target_count = target, "detecting buildings in polygon");

        let candidates = self.live_candidates(polygon, &bbox, target, &mut warnings);
        let mut buildings = self.geocode_candidates(candidates, &mut warnings);
        let live = buildings.len();

        if live < target {
            let wanted = target - live;
            let simulated = self.simulate_buildings(polygon, &bbox, wanted, rng);
            if simulated.len() < wanted {
                warnings.push(BACKFILL_INCOMPLETE_WARNING);
            }
            if !simulated.is_empty() {
                warnings.push(format!(
                    "Added {} simulated building(s); live data covered {} of {} expected.",
                    simulated.len(),
                    live,
                    target
                ));
            }
            buildings.extend(simulated);
        }

        info!(
            live,
            simulated = buildings.len() - live,
            warnings = warnings.0.len(),
            "building detection finished"
        );

        Ok(BuildingDetectionResult {
            buildings,
            warnings: warnings.into_vec(),
        })
    }

    /// Footprints inside the polygon, in service order, capped at `target`.
    fn live_candidates(
        &self,
        polygon: &[PolygonPoint],
        bbox: &BoundingBox,
        target: usize,
        warnings: &mut Warnings,
    ) -> Vec<FootprintFeature> {
        let features = match with_retries(self.options.footprint_retry, || {
            self.footprints.features_in(bbox)
        }) {
            Ok(features) => features,
            Err(exhausted) => {
                warn!(error = %exhausted, "footprint query failed, falling back to simulated buildings");
                warnings.push(FOOTPRINTS_UNAVAILABLE_WARNING);
                return Vec::new();
            }
        };

        let returned = features.len();
        let mut seen = HashSet::new();
        let candidates: Vec<FootprintFeature> = features
            .into_iter()
            .filter(|f| f.latitude.is_finite() && f.longitude.is_finite())
            .filter(|f| point_in_polygon(PolygonPoint::new(f.latitude, f.longitude), polygon))
            .filter(|f| seen.insert(f.id.clone()))
            .take(target)
            .collect();

        debug!(returned, contained = candidates.len(), "filtered footprints by polygon");
        candidates
    }

    fn geocode_candidates(
        &self,
        candidates: Vec<FootprintFeature>,
        warnings: &mut Warnings,
    ) -> Vec<DetectedBuilding> {
        let outcomes: Vec<GeocodeOutcome> = if !self.geocoder.has_credential() {
            candidates.iter().map(|_| GeocodeOutcome::NoCredential).collect()
        } else if self.options.geocode_concurrency <= 1 || candidates.len() <= 1 {
            candidates.iter().map(|c| self.lookup(c)).collect()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.geocode_concurrency)
                .build()
            {
                Ok(pool) => pool.install(|| candidates.par_iter().map(|c| self.lookup(c)).collect()),
                Err(err) => {
                    warn!(error = %err, "could not start geocoding pool, geocoding sequentially");
                    candidates.iter().map(|c| self.lookup(c)).collect()
                }
            }
        };

        candidates
            .into_iter()
            .zip(outcomes)
            .map(|(feature, outcome)| {
                let (address, building_number) = match outcome {
                    GeocodeOutcome::Address(address) => {
                        let number = extract_building_number(&address);
                        (address, number)
                    }
                    GeocodeOutcome::NoCredential => {
                        warnings.push(NO_GEOCODING_KEY_WARNING);
                        (fallback_address(feature.latitude, feature.longitude), None)
                    }
                    GeocodeOutcome::Failed => {
                        warnings.push(GEOCODING_FAILED_WARNING);
                        (fallback_address(feature.latitude, feature.longitude), None)
                    }
                };

                DetectedBuilding {
                    id: format!("live-{}", feature.id),
                    latitude: feature.latitude,
                    longitude: feature.longitude,
                    address,
                    building_number,
                    source: BuildingSource::Live,
                }
            })
            .collect()
    }

    fn lookup(&self, feature: &FootprintFeature) -> GeocodeOutcome {
        let result = with_retries_if(self.options.geocode_retry, ServiceError::is_retriable, || {
            self.geocoder.reverse_geocode(feature.latitude, feature.longitude)
        });

        match result {
            Ok(address) => GeocodeOutcome::Address(address),
            Err(exhausted) => match exhausted.last_error {
                ServiceError::MissingCredential => GeocodeOutcome::NoCredential,
                err => {
                    debug!(feature = %feature.id, error = %err, "reverse lookup failed");
                    GeocodeOutcome::Failed
                }
            },
        }
    }

    /// Up to `count` random interior points. Stops early when a point cannot
    /// be found within the configured number of draws.
    fn simulate_buildings<R: Rng>(
        &self,
        polygon: &[PolygonPoint],
        bbox: &BoundingBox,
        count: usize,
        rng: &mut R,
    ) -> Vec<DetectedBuilding> {
        let mut simulated = Vec::with_capacity(count);

        while simulated.len() < count {
            let Some(point) = sample_interior_point(polygon, bbox, self.options.sample_attempts, rng) else {
                warn!(
                    generated = simulated.len(),
                    wanted = count,
                    "no interior point found, stopping simulated backfill"
                );
                break;
            };

            let n = simulated.len() + 1;
            simulated.push(DetectedBuilding {
                id: format!("sim-{}", n),
                latitude: point.latitude,
                longitude: point.longitude,
                address: format!(
                    "Simulated building {} near {:.6}, {:.6}",
                    n, point.latitude, point.longitude
                ),
                building_number: None,
                source: BuildingSource::Simulated,
            });
        }

        simulated
    }
}

/// Draw uniform points from `bbox` until one falls inside `polygon`.
///
/// Returns `None` when the box cannot be sampled, e.g. when its span is
/// not finite.
fn sample_interior_point<R: Rng>(
    polygon: &[PolygonPoint],
    bbox: &BoundingBox,
    attempts: u32,
    rng: &mut R,
) -> Option<PolygonPoint> {
    let lat = Uniform::new_inclusive(bbox.min_lat, bbox.max_lat).ok()?;
    let lng = Uniform::new_inclusive(bbox.min_lng, bbox.max_lng).ok()?;

    (0..attempts).find_map(|_| {
        let candidate = PolygonPoint::new(lat.sample(&mut *rng), lng.sample(&mut *rng));
        point_in_polygon(candidate, polygon).then_some(candidate)
    })
}
