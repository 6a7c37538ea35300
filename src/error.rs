//! Error types for the territory engine.

use std::fmt;

/// Failure talking to an external footprint or geocoding service.
#[derive(Debug)]
pub enum ServiceError {
    Http(reqwest::Error),
    /// No API key configured for a service that requires one.
    MissingCredential,
    /// The service answered but had nothing for the query.
    NoResult,
    /// The service answered with an application-level error status.
    Api { status: String, message: String },
    /// The response body did not have the expected shape.
    Malformed(String),
}

impl ServiceError {
    /// A missing credential cannot be fixed by trying again.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, ServiceError::MissingCredential)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Http(err) => write!(f, "request failed: {}", err),
            ServiceError::MissingCredential => write!(f, "no API key configured"),
            ServiceError::NoResult => write!(f, "no result for query"),
            ServiceError::Api { status, message } => write!(f, "service error {}: {}", status, message),
            ServiceError::Malformed(detail) => write!(f, "malformed response: {}", detail),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Http(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Malformed(err.to_string())
    }
}

/// Caller-visible failure of building detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// Fewer than three vertices were supplied.
    InvalidPolygon { points: usize },
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionError::InvalidPolygon { points } => write!(
                f,
                "polygon needs at least 3 points, got {}",
                points
            ),
        }
    }
}

impl std::error::Error for DetectionError {}
