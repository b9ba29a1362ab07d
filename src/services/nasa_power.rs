//! NASA POWER daily point client.
//!
//! Fetches two decades of daily observations for a coordinate and keeps only
//! the target month/day from each year.
//! See: https://power.larc.nasa.gov/docs/services/api/temporal/daily/

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Coordinate, DailyObservation, HistoricalWindow};

const DAILY_POINT_PATH: &str = "/api/temporal/daily/point";
const PARAMETERS: &str = "T2M,PRECTOTCORR,RH2M,WS2M,CLOUD_AMT";

/// Number of past years in a window, ending with last year.
pub const LOOKBACK_YEARS: i32 = 20;

/// POWER marks missing values with -999.
const FILL_VALUE_CEILING: f64 = -990.0;

const MS_TO_KMH: f64 = 3.6;

/// Anything that can produce a historical window for a coordinate and date.
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    async fn fetch_window(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> Result<HistoricalWindow, AppError>;
}

/// Client for the NASA POWER API.
#[derive(Debug, Clone)]
pub struct NasaPowerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

// --- POWER JSON response types ---

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: PowerParameters,
}

/// Each parameter maps "YYYYMMDD" to a daily value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct PowerParameters {
    #[serde(default)]
    t2m: HashMap<String, f64>,
    #[serde(default)]
    prectotcorr: HashMap<String, f64>,
    #[serde(default)]
    rh2m: HashMap<String, f64>,
    #[serde(default)]
    ws2m: HashMap<String, f64>,
    #[serde(default)]
    cloud_amt: HashMap<String, f64>,
}

/// `(start_year, end_year)` of the window for a given current year.
/// The current year is excluded.
pub fn window_years(current_year: i32) -> (i32, i32) {
    (current_year - LOOKBACK_YEARS, current_year - 1)
}

impl NasaPowerClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Fetch the raw daily series for `start_year..=end_year`.
    async fn fetch_daily(
        &self,
        coordinate: Coordinate,
        start_year: i32,
        end_year: i32,
    ) -> Result<PowerParameters, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration("NASA_API_KEY is not configured".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AppError::Configuration(format!("Invalid NASA_API_KEY: {}", e)))?,
        );

        let url = format!("{}{}", self.base_url, DAILY_POINT_PATH);
        let start = format!("{}0101", start_year);
        let end = format!("{}1231", end_year);
        let lat = format!("{:.4}", coordinate.latitude);
        let lon = format!("{:.4}", coordinate.longitude);

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[
                ("parameters", PARAMETERS),
                ("community", "RE"),
                ("longitude", lon.as_str()),
                ("latitude", lat.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("format", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("NASA POWER request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "NASA POWER returned HTTP {}",
                response.status()
            )));
        }

        let parsed: PowerResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("NASA POWER JSON parse error: {}", e))
        })?;

        Ok(parsed.properties.parameter)
    }
}

#[async_trait]
impl HistoricalSource for NasaPowerClient {
    async fn fetch_window(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> Result<HistoricalWindow, AppError> {
        let (start_year, end_year) = window_years(Utc::now().year());
        let params = self.fetch_daily(coordinate, start_year, end_year).await?;
        let window = extract_window(&params, date.month(), date.day(), start_year, end_year);

        tracing::debug!(
            "NASA POWER: {} of {} years for {:02}-{:02} at ({:.4}, {:.4})",
            window.year_count,
            end_year - start_year + 1,
            date.month(),
            date.day(),
            coordinate.latitude,
            coordinate.longitude,
        );

        Ok(window)
    }
}

/// Pick the same month/day out of every year in the range.
///
/// Years without a temperature value are skipped; missing secondary values
/// default to zero.
fn extract_window(
    params: &PowerParameters,
    month: u32,
    day: u32,
    start_year: i32,
    end_year: i32,
) -> HistoricalWindow {
    let observations = (start_year..=end_year)
        .filter_map(|year| {
            let key = format!("{}{:02}{:02}", year, month, day);
            let temperature_c = valid(params.t2m.get(&key))?;
            Some(DailyObservation {
                year,
                temperature_c,
                precipitation_mm: valid(params.prectotcorr.get(&key)).unwrap_or(0.0),
                humidity_pct: valid(params.rh2m.get(&key)).unwrap_or(0.0),
                wind_speed_kmh: valid(params.ws2m.get(&key)).unwrap_or(0.0) * MS_TO_KMH,
                cloud_cover_pct: valid(params.cloud_amt.get(&key)).unwrap_or(0.0),
            })
        })
        .collect();

    HistoricalWindow::new(observations, start_year, end_year)
}

fn valid(v: Option<&f64>) -> Option<f64> {
    v.copied().filter(|x| x.is_finite() && *x > FILL_VALUE_CEILING)
}
