//! Greedy nearest-neighbor stop sequencing.
//!
//! Starting from an anchor, repeatedly walk to the closest unvisited stop.
//! This is O(n²) and makes no attempt at an optimal tour; stop counts are
//! capped so it stays cheap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::haversine::{LngLat, haversine_miles};
use crate::traits::StopCandidate;

/// Upper bound on `SequenceSettings::max_stops`, whatever the caller asks for.
pub const MAX_STOPS_CEILING: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSettings {
    pub max_stops: usize,
    pub estimated_duration_per_stop_minutes: u32,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            max_stops: 50,
            estimated_duration_per_stop_minutes: 15,
        }
    }
}

impl SequenceSettings {
    /// `max_stops` clamped to [`MAX_STOPS_CEILING`].
    pub fn effective_max_stops(&self) -> usize {
        self.max_stops.min(MAX_STOPS_CEILING)
    }
}

/// A caller-owned location to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStopCandidate<R> {
    pub property_ref: R,
    pub coordinates: Option<LngLat>,
}

impl<R> RouteStopCandidate<R> {
    pub fn new(property_ref: R, coordinates: impl Into<LngLat>) -> Self {
        Self {
            property_ref,
            coordinates: Some(coordinates.into()),
        }
    }
}

impl<R: Clone> StopCandidate for RouteStopCandidate<R> {
    type Ref = R;

    fn property_ref(&self) -> &R {
        &self.property_ref
    }

    fn coordinates(&self) -> Option<LngLat> {
        self.coordinates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopStatus {
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedStop<R> {
    pub property_ref: R,
    /// 1-based position in the visit order.
    pub order: usize,
    pub estimated_duration_minutes: u32,
    pub status: StopStatus,
    pub coordinates: LngLat,
}

/// Order `candidates` by greedy nearest neighbor.
///
/// The walk starts at `start`, else at the first candidate with usable
/// coordinates, else at `[0, 0]`. Ties go to the earlier candidate, so the
/// result is deterministic. Candidates without usable coordinates are
/// skipped and do not count towards `max_stops`. `end` does not influence
/// the order.
pub fn sequence_stops<C>(
    candidates: &[C],
    start: Option<LngLat>,
    end: Option<LngLat>,
    settings: &SequenceSettings,
) -> Vec<OptimizedStop<C::Ref>>
where
    C: StopCandidate,
{
    let mut pool: Vec<(&C, LngLat)> = candidates
        .iter()
        .filter_map(|c| c.coordinates().filter(LngLat::is_usable).map(|p| (c, p)))
        .collect();

    let max_stops = settings.effective_max_stops();
    let mut current = start
        .or_else(|| pool.first().map(|(_, p)| *p))
        .unwrap_or(LngLat::ORIGIN);

    debug!(
        candidates = candidates.len(),
        usable = pool.len(),
        max_stops,
        ?start,
        ?end,
        "sequencing stops"
    );

    let mut stops = Vec::with_capacity(pool.len().min(max_stops));
    while !pool.is_empty() && stops.len() < max_stops {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, (_, location)) in pool.iter().enumerate() {
            let dist = haversine_miles(current, *location);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }

        let (candidate, location) = pool.remove(best_idx);
        stops.push(OptimizedStop {
            property_ref: candidate.property_ref().clone(),
            order: stops.len() + 1,
            estimated_duration_minutes: settings.estimated_duration_per_stop_minutes,
            status: StopStatus::Pending,
            coordinates: location,
        });
        current = location;
    }

    stops
}

/// Sum of great-circle legs between consecutive stops, in miles, rounded
/// to two decimals. Start and end anchors are not included.
pub fn total_distance_miles<R>(stops: &[OptimizedStop<R>]) -> f64 {
    let total: f64 = stops
        .windows(2)
        .map(|pair| haversine_miles(pair[0].coordinates, pair[1].coordinates))
        .sum();
    (total * 100.0).round() / 100.0
}
