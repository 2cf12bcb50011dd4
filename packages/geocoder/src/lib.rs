#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for cafe records.
//!
//! Resolves a free-text street address to WGS84 coordinates through an
//! external HTTP service. Services are configured via TOML files in
//! `services/` and loaded from the [`service_registry`]. The only provider
//! today is the Google Maps Geocoding API ([`google`]).
//!
//! Callers depend on the [`Geocoder`] trait so the build pipeline can run
//! against an in-process test double.

pub mod google;
pub mod retry;
pub mod service_registry;

use async_trait::async_trait;
use cafeco_cafe_models::Coordinates;
use thiserror::Error;

pub use google::GoogleGeocoder;
pub use retry::RetryPolicy;

/// Resolves addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Short name used in log lines (e.g., `"google"`).
    fn name(&self) -> &str;

    /// Resolves `address`.
    ///
    /// Returns `Ok(None)` when the service answered but could not resolve
    /// the address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport failure, an unparseable
    /// response, or an upstream error status.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed. The request URL (which carries the API key) is
    /// stripped; construct through `From` or [`reqwest::Error::without_url`].
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service answered with an error status in its payload.
    #[error("Upstream error {status}: {message}")]
    Upstream {
        /// Status string reported by the service (e.g., `REQUEST_DENIED`).
        status: String,
        /// Error message reported by the service, if any.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No credential is configured for the service.
    #[error("Missing API key (set {env})")]
    MissingApiKey {
        /// Environment variable the key is read from.
        env: String,
    },
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
