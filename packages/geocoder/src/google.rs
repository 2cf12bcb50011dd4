//! Google Maps Geocoding API client.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use async_trait::async_trait;
use cafeco_cafe_models::Coordinates;

use crate::retry::{self, RetryPolicy};
use crate::service_registry::GeocodingService;
use crate::{GeocodeError, Geocoder};

/// Geocoder backed by the Google Maps Geocoding API.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GoogleGeocoder {
    /// Creates a client for `service` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingApiKey`] if the key is blank and
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, service: &GeocodingService) -> Result<Self, GeocodeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeocodeError::MissingApiKey {
                env: service.api_key_env().to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(service.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: service.base_url().to_string(),
            api_key,
            retry: service.retry_policy(),
        })
    }

    /// Creates a client for `service`, reading the key from the service's
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingApiKey`] if the variable is unset or
    /// blank.
    pub fn from_env(service: &GeocodingService) -> Result<Self, GeocodeError> {
        let api_key = service.api_key().ok_or_else(|| GeocodeError::MissingApiKey {
            env: service.api_key_env().to_string(),
        })?;
        Self::new(api_key, service)
    }

    /// Overrides the service's retry count.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = self.retry.with_max_retries(max_retries);
        self
    }
}

impl std::fmt::Debug for GoogleGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGeocoder")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &str {
        "google"
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let body = retry::send_json(
            || {
                self.client
                    .get(&self.base_url)
                    .query(&[("address", address), ("key", self.api_key.as_str())])
            },
            self.retry,
        )
        .await?;

        parse_response(&body)
    }
}

/// Parses a Geocoding API response.
///
/// `OK` yields the first result's location, `ZERO_RESULTS` yields `None`,
/// `OVER_QUERY_LIMIT` is [`GeocodeError::RateLimited`], and every other
/// status is [`GeocodeError::Upstream`].
///
/// # Errors
///
/// Returns [`GeocodeError`] for error statuses and malformed payloads.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Missing status in geocoding response".to_string(),
    })?;

    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        "OVER_QUERY_LIMIT" => return Err(GeocodeError::RateLimited),
        other => {
            return Err(GeocodeError::Upstream {
                status: other.to_string(),
                message: body["error_message"].as_str().unwrap_or_default().to_string(),
            });
        }
    }

    let Some(first) = body["results"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let location = &first["geometry"]["location"];

    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in geocoding response".to_string(),
    })?;

    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lng in geocoding response".to_string(),
    })?;

    let coords = Coordinates { lat, lng };
    if !coords.is_valid() {
        return Err(GeocodeError::Parse {
            message: format!("Coordinates out of range: {lat}, {lng}"),
        });
    }

    if let Some(formatted) = first["formatted_address"].as_str() {
        log::debug!("Geocoded to {formatted} ({lat}, {lng})");
    }

    Ok(Some(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_registry::default_service;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "1 Rue de Rivoli, 75001 Paris, France",
                    "geometry": { "location": { "lat": 48.8559, "lng": 2.3589 } }
                },
                {
                    "geometry": { "location": { "lat": 0.0, "lng": 0.0 } }
                }
            ]
        });
        let coords = parse_response(&body).unwrap().unwrap();
        assert!((coords.lat - 48.8559).abs() < 1e-6);
        assert!((coords.lng - 2.3589).abs() < 1e-6);
    }

    #[test]
    fn zero_results_is_none() {
        let body = serde_json::json!({ "status": "ZERO_RESULTS", "results": [] });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn error_status_is_upstream_error() {
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::Upstream { ref status, .. } if status == "REQUEST_DENIED"
        ));
    }

    #[test]
    fn over_query_limit_is_rate_limited() {
        let body = serde_json::json!({ "status": "OVER_QUERY_LIMIT" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::RateLimited)
        ));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [{ "geometry": { "location": { "lat": 120.0, "lng": 2.0 } } }]
        });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn missing_status_is_parse_error() {
        let body = serde_json::json!({ "results": [] });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let service = default_service().unwrap();
        assert!(matches!(
            GoogleGeocoder::new("  ", &service),
            Err(GeocodeError::MissingApiKey { .. })
        ));
        assert!(GoogleGeocoder::new("test-key", &service).is_ok());
    }
}
