//! Free-text location resolution via OpenStreetMap Nominatim.
//!
//! Literal `"lat, lon"` input bypasses the network entirely.
//! See: https://nominatim.org/release-docs/latest/api/Search/

use std::time::Duration;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Coordinate;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const ACCEPT_LANGUAGE: &str = "pt-BR,pt,en";

#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

impl NominatimClient {
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve `location` to a coordinate.
    ///
    /// Returns `NotFound` when the search has no hit and
    /// `ExternalServiceError` when the provider cannot be reached.
    pub async fn geocode(&self, location: &str) -> Result<Coordinate, AppError> {
        if let Some(coordinate) = parse_coordinates(location) {
            tracing::debug!("Using literal coordinates for {:?}", location);
            return Ok(coordinate);
        }

        let query = normalize_query(location);
        if query.is_empty() {
            return Err(AppError::BadRequest("location must not be empty".to_string()));
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("accept-language", ACCEPT_LANGUAGE),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Geocoding request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Geocoder returned HTTP {}",
                response.status()
            )));
        }

        let results: Vec<SearchResult> = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Geocoder JSON parse error: {}", e))
        })?;

        let hit = results.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!(
                "Location '{}' not found. Try \"City, State\" or literal \"lat, lon\" coordinates",
                location
            ))
        })?;

        let latitude = hit.lat.parse::<f64>().map_err(|e| {
            AppError::ExternalServiceError(format!("Geocoder returned invalid latitude: {}", e))
        })?;
        let longitude = hit.lon.parse::<f64>().map_err(|e| {
            AppError::ExternalServiceError(format!("Geocoder returned invalid longitude: {}", e))
        })?;

        let coordinate = Coordinate::new(latitude, longitude)?;
        tracing::info!(
            "Geocoded {:?} to ({:.4}, {:.4})",
            query,
            coordinate.latitude,
            coordinate.longitude
        );
        Ok(coordinate)
    }
}

/// Parse `"lat, lon"` (or `"lat,lon"`). `None` unless both values are in range.
pub fn parse_coordinates(input: &str) -> Option<Coordinate> {
    let (lat, lon) = input.split_once(',')?;
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lon.trim().parse::<f64>().ok()?;
    Coordinate::new(latitude, longitude).ok()
}

/// Expand a trailing `, BR` / `, BRA` country code so Nominatim matches it.
fn normalize_query(location: &str) -> String {
    let trimmed = location.trim();
    if let Some((head, tail)) = trimmed.rsplit_once(',') {
        let tail = tail.trim();
        if tail.eq_ignore_ascii_case("BR") || tail.eq_ignore_ascii_case("BRA") {
            return format!("{}, Brazil", head.trim_end());
        }
    }
    trimmed.to_string()
}
