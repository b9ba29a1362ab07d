use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::models::{EventType, Preferences};
use crate::services::analysis::{
    AnalysisEngine, AnalysisParams, EventTime, LocationAnalysis, LocationFailure, LocationInput,
};
use crate::services::geocode::NominatimClient;

/// Analysis results may be reused briefly by clients and proxies.
const CACHE_CONTROL_VALUE: &str = "public, max-age=300";

/// Shared application state for the analysis endpoint.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: AnalysisEngine,
    pub(crate) geocoder: NominatimClient,
    /// Without the historical provider key no location can succeed.
    pub(crate) historical_key_configured: bool,
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Climate analysis request.
///
/// Either `locations` (resolved coordinates) or the legacy free-text
/// `location` must be given. `locations` wins when both are present.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClimateAnalysisRequest {
    /// Legacy single location: free text or "lat, lon"
    pub location: Option<String>,
    pub locations: Option<Vec<LocationInput>>,
    /// Target date (YYYY-MM-DD)
    pub date: String,
    /// wedding, sports, festival, agriculture, corporate, outdoor; anything else is "other"
    #[serde(default)]
    #[schema(value_type = String)]
    pub event_type: EventType,
    /// Preferred temperature (°C)
    pub preferred_temperature: f64,
    pub event_time: Option<EventTime>,
}

/// A single analysis for the legacy form, an array otherwise.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Single(LocationAnalysis),
    Multiple(Vec<LocationAnalysis>),
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Analyze one or more locations for a target date.
///
/// Scores the date from twenty years of same-day observations, ranks four
/// nearby alternative dates, adds holiday context and, for timed events,
/// an hourly profile with better time slots. A failing location, including
/// a legacy location that cannot be geocoded, yields a `{location, error}`
/// entry instead of failing the request.
#[utoipa::path(
    post,
    path = "/api/v1/climate-analysis",
    tag = "Climate",
    request_body = ClimateAnalysisRequest,
    responses(
        (status = 200, body = AnalysisResponse,
         description = "One analysis (legacy `location`) or an array in request order",
         headers(
             ("Cache-Control" = String, description = "public, max-age=300")
         )),
        (status = 400, body = ErrorResponse,
         description = "Malformed body, missing location, invalid date or temperature"),
        (status = 500, body = ErrorResponse,
         description = "Historical data provider not configured"),
    )
)]
pub async fn climate_analysis(
    State(state): State<AppState>,
    payload: Result<Json<ClimateAnalysisRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if !state.historical_key_configured {
        return Err(AppError::Configuration(
            "NASA_API_KEY is not configured".to_string(),
        ));
    }

    let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("Invalid date '{}': {}", request.date, e)))?;

    if !request.preferred_temperature.is_finite() {
        return Err(AppError::BadRequest(
            "preferredTemperature must be a finite number".to_string(),
        ));
    }

    let params = AnalysisParams {
        date,
        preferences: Preferences {
            preferred_temperature: request.preferred_temperature,
            event_type: request.event_type,
        },
        event_time: request.event_time,
    };

    let legacy_single = request.locations.is_none();
    let locations = match (request.locations, request.location) {
        (Some(locations), _) if !locations.is_empty() => locations,
        (_, Some(location)) if !location.trim().is_empty() => {
            match state.geocoder.geocode(&location).await {
                Ok(coordinate) => vec![LocationInput {
                    name: location,
                    latitude: coordinate.latitude,
                    longitude: coordinate.longitude,
                }],
                Err(e) => {
                    tracing::warn!("Geocoding failed for '{}': {}", location, e);
                    let failure = LocationAnalysis::Failure(LocationFailure::new(
                        LocationInput::unresolved(location),
                        e.to_string(),
                    ));
                    let body = if legacy_single {
                        AnalysisResponse::Single(failure)
                    } else {
                        AnalysisResponse::Multiple(vec![failure])
                    };
                    return Ok(([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(body)));
                }
            }
        }
        _ => {
            return Err(AppError::BadRequest(
                "No location provided. Use \"location\" or \"locations\"".to_string(),
            ))
        }
    };

    tracing::info!(
        "Climate analysis for {} location(s) on {} ({:?})",
        locations.len(),
        date,
        params.preferences.event_type
    );

    let mut results = state.engine.analyze_locations(locations, &params).await;

    let body = if legacy_single && results.len() == 1 {
        AnalysisResponse::Single(results.remove(0))
    } else {
        AnalysisResponse::Multiple(results)
    };

    Ok(([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(body)))
}
