//! Overpass HTTP adapter for building footprints.

use serde::Deserialize;
use tracing::debug;

use crate::error::ServiceError;
use crate::geometry::BoundingBox;
use crate::traits::{FootprintFeature, FootprintSource};

#[derive(Debug, Clone)]
pub struct OverpassConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Server-side query timeout passed in the Overpass QL header.
    pub query_timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            base_url: "https://overpass-api.de".to_string(),
            timeout_secs: 30,
            query_timeout_secs: 25,
        }
    }
}

impl OverpassConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Reads `OVERPASS_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("OVERPASS_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct OverpassClient {
    config: OverpassConfig,
    client: reqwest::blocking::Client,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn query_for(&self, bbox: &BoundingBox) -> String {
        let area = format!(
            "{:.7},{:.7},{:.7},{:.7}",
            bbox.min_lat, bbox.min_lng, bbox.max_lat, bbox.max_lng
        );
        format!(
            "[out:json][timeout:{}];(way[\"building\"]({area});relation[\"building\"]({area}););out center;",
            self.config.query_timeout_secs
        )
    }
}

impl FootprintSource for OverpassClient {
    fn features_in(&self, bbox: &BoundingBox) -> Result<Vec<FootprintFeature>, ServiceError> {
        let url = format!("{}/api/interpreter", self.config.base_url);
        let query = self.query_for(bbox);
        debug!(%url, %query, "querying building footprints");

        let body = self
            .client
            .post(url)
            .form(&[("data", query.as_str())])
            .send()
            .and_then(|resp| resp.error_for_status())?
            .text()?;

        parse_features(&body)
    }
}

/// Parse an Overpass JSON document into footprint features.
///
/// Elements without any usable coordinate are dropped.
pub fn parse_features(body: &str) -> Result<Vec<FootprintFeature>, ServiceError> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    Ok(response
        .elements
        .into_iter()
        .filter_map(|element| {
            let (latitude, longitude) = element.representative_point()?;
            Some(FootprintFeature {
                id: format!("{}/{}", element.kind, element.id),
                latitude,
                longitude,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassPoint>,
    geometry: Option<Vec<OverpassPoint>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct OverpassPoint {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    /// Own point, then center, then first geometry vertex.
    fn representative_point(&self) -> Option<(f64, f64)> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Some((lat, lon));
        }
        self.center
            .or_else(|| self.geometry.as_ref().and_then(|g| g.first().copied()))
            .map(|p| (p.lat, p.lon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefers_point_then_center_then_geometry() {
        let body = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 36.10, "lon": -115.10},
                {"type": "way", "id": 2, "center": {"lat": 36.11, "lon": -115.11}},
                {"type": "relation", "id": 3, "geometry": [
                    {"lat": 36.12, "lon": -115.12},
                    {"lat": 36.13, "lon": -115.13}
                ]},
                {"type": "way", "id": 4}
            ]
        }"#;

        let features = parse_features(body).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].id, "node/1");
        assert_eq!((features[0].latitude, features[0].longitude), (36.10, -115.10));
        assert_eq!(features[1].id, "way/2");
        assert_eq!((features[1].latitude, features[1].longitude), (36.11, -115.11));
        assert_eq!(features[2].id, "relation/3");
        assert_eq!((features[2].latitude, features[2].longitude), (36.12, -115.12));
    }

    #[test]
    fn test_parse_missing_elements_is_empty() {
        assert!(parse_features("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_features("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[test]
    fn test_query_uses_south_west_north_east_order() {
        let client = OverpassClient::new(OverpassConfig::default()).unwrap();
        let bbox = BoundingBox {
            min_lat: 36.1,
            max_lat: 36.2,
            min_lng: -115.2,
            max_lng: -115.1,
        };
        let query = client.query_for(&bbox);
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("way[\"building\"](36.1000000,-115.2000000,36.2000000,-115.1000000)"));
        assert!(query.ends_with("out center;"));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = OverpassConfig::from_lookup(|key| {
            (key == "OVERPASS_URL").then(|| "http://localhost:12345/".to_string())
        });
        assert_eq!(config.base_url, "http://localhost:12345");

        let default = OverpassConfig::from_lookup(|_| None);
        assert_eq!(default.base_url, "https://overpass-api.de");
    }
}
