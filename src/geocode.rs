//! Reverse geocoding over a Google-style geocoding HTTP API.

use serde::Deserialize;
use tracing::debug;

use crate::error::ServiceError;
use crate::traits::ReverseGeocoder;

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Reads `GEOCODING_API_KEY` and
    /// `GEOCODING_URL`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.api_key = lookup("GEOCODING_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if let Some(url) = lookup("GEOCODING_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl HttpGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl ReverseGeocoder for HttpGeocoder {
    fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, ServiceError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential)?;

        let url = format!("{}/maps/api/geocode/json", self.config.base_url);
        let latlng = format!("{:.6},{:.6}", latitude, longitude);
        debug!(%latlng, "reverse geocoding");

        let body = self
            .client
            .get(url)
            .query(&[("latlng", latlng.as_str()), ("key", key)])
            .send()
            .and_then(|resp| resp.error_for_status())?
            .text()?;

        parse_formatted_address(&body)
    }
}

/// Extract the first formatted address from a geocoding response.
pub fn parse_formatted_address(body: &str) -> Result<String, ServiceError> {
    let response: GeocodeResponse = serde_json::from_str(body)?;

    match response.status.as_str() {
        "OK" => response
            .results
            .into_iter()
            .map(|r| r.formatted_address)
            .find(|address| !address.trim().is_empty())
            .ok_or(ServiceError::NoResult),
        "ZERO_RESULTS" => Err(ServiceError::NoResult),
        _ => Err(ServiceError::Api {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
}
