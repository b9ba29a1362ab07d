//! Domain types shared by the climate engine and the HTTP layer.
//!
//! Everything serialized to clients uses camelCase field names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::statistics::{
    cloud_description, extreme_description, humidity_description, wind_description,
};

/// A geographic point, already resolved from free text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::BadRequest(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::BadRequest(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One calendar day's observed values for a single historical year.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub year: i32,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub cloud_cover_pct: f64,
}

/// Same-day observations across the lookback period, one per available year.
#[derive(Debug, Clone)]
pub struct HistoricalWindow {
    pub observations: Vec<DailyObservation>,
    pub start_year: i32,
    pub end_year: i32,
    /// Years actually present. May be lower than the span when the provider
    /// has gaps; consumers still produce a result.
    pub year_count: usize,
}

impl HistoricalWindow {
    pub fn new(observations: Vec<DailyObservation>, start_year: i32, end_year: i32) -> Self {
        let year_count = observations.len();
        Self {
            observations,
            start_year,
            end_year,
            year_count,
        }
    }

    /// Observations ordered oldest to newest.
    pub fn chronological(&self) -> Vec<&DailyObservation> {
        let mut sorted: Vec<&DailyObservation> = self.observations.iter().collect();
        sorted.sort_by_key(|o| o.year);
        sorted
    }
}

/// Representative-day statistics reduced from a `HistoricalWindow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateStatistics {
    pub avg_temperature: i32,
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub rain_probability: i32,
    pub avg_humidity: i32,
    pub avg_wind_speed: i32,
    pub avg_cloud_cover: i32,
    pub extreme_events_probability: i32,
}

/// Kind of event being planned. Unknown strings map to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventType {
    Wedding,
    Sports,
    Festival,
    Agriculture,
    Corporate,
    Outdoor,
    #[default]
    Other,
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "wedding" => EventType::Wedding,
            "sports" => EventType::Sports,
            "festival" => EventType::Festival,
            "agriculture" => EventType::Agriculture,
            "corporate" => EventType::Corporate,
            "outdoor" => EventType::Outdoor,
            _ => EventType::Other,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        EventType::from(value.as_str())
    }
}

/// User preferences that drive the comfort score.
#[derive(Debug, Clone, Copy)]
pub struct Preferences {
    pub preferred_temperature: f64,
    pub event_type: EventType,
}

/// Evaluation of one calendar date (the requested one or an alternative).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateResult {
    /// Calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Human-readable date, e.g. "19 October 2026"
    pub display_date: String,
    /// Personal Comfort Index, 0-100
    pub icp: i32,
    /// Share of historical years with more than 1 mm of rain (%)
    pub rain_probability: i32,
    /// Average temperature (°C)
    pub temperature: i32,
    /// "min°C - max°C"
    pub temperature_range: String,
    /// Average wind speed (km/h)
    pub wind_speed: i32,
    pub wind_description: String,
    /// Average relative humidity (%)
    pub humidity: i32,
    pub humidity_description: String,
    /// Average cloud cover (%)
    pub cloud_cover: i32,
    pub cloud_description: String,
    /// Share of historical years with an extreme day (%)
    pub extreme_events: i32,
    pub extreme_description: String,
    /// Rain-trend alert, present only when the trend is significant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
}

impl DateResult {
    pub fn build(
        date: NaiveDate,
        icp: i32,
        stats: &ClimateStatistics,
        alert_message: Option<String>,
    ) -> Self {
        Self {
            date,
            display_date: format_display_date(date),
            icp,
            rain_probability: stats.rain_probability,
            temperature: stats.avg_temperature,
            temperature_range: format!(
                "{}°C - {}°C",
                stats.min_temperature, stats.max_temperature
            ),
            wind_speed: stats.avg_wind_speed,
            wind_description: wind_description(stats.avg_wind_speed).to_string(),
            humidity: stats.avg_humidity,
            humidity_description: humidity_description(stats.avg_humidity).to_string(),
            cloud_cover: stats.avg_cloud_cover,
            cloud_description: cloud_description(stats.avg_cloud_cover).to_string(),
            extreme_events: stats.extreme_events_probability,
            extreme_description: extreme_description(stats.extreme_events_probability)
                .to_string(),
            alert_message,
        }
    }
}

/// Format a date as "<day> <Month> <year>".
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(year: i32) -> DailyObservation {
        DailyObservation {
            year,
            temperature_c: 20.0,
            precipitation_mm: 0.0,
            humidity_pct: 60.0,
            wind_speed_kmh: 10.0,
            cloud_cover_pct: 30.0,
        }
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(-23.55, -46.63).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(EventType::from("wedding"), EventType::Wedding);
        assert_eq!(EventType::from("Agriculture"), EventType::Agriculture);
        assert_eq!(EventType::from("picnic"), EventType::Other);
        assert_eq!(EventType::from(""), EventType::Other);
    }

    #[test]
    fn test_event_type_deserializes_unknown_values() {
        let parsed: EventType = serde_json::from_str("\"concert\"").unwrap();
        assert_eq!(parsed, EventType::Other);
        let parsed: EventType = serde_json::from_str("\"sports\"").unwrap();
        assert_eq!(parsed, EventType::Sports);
    }

    #[test]
    fn test_window_year_count_matches_observations() {
        let window = HistoricalWindow::new(vec![obs(2010), obs(2012)], 2006, 2025);
        assert_eq!(window.year_count, 2);
        assert_eq!(window.start_year, 2006);
        assert_eq!(window.end_year, 2025);
    }

    #[test]
    fn test_chronological_sorts_by_year() {
        let window = HistoricalWindow::new(vec![obs(2020), obs(2007), obs(2015)], 2006, 2025);
        let years: Vec<i32> = window.chronological().iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2007, 2015, 2020]);
    }

    #[test]
    fn test_display_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_display_date(date), "7 March 2026");
    }

    #[test]
    fn test_date_result_serializes_camel_case() {
        let stats = ClimateStatistics {
            avg_temperature: 24,
            min_temperature: 19,
            max_temperature: 29,
            rain_probability: 70,
            avg_humidity: 68,
            avg_wind_speed: 10,
            avg_cloud_cover: 45,
            extreme_events_probability: 5,
        };
        let date = NaiveDate::from_ymd_opt(2026, 12, 12).unwrap();
        let result = DateResult::build(date, 68, &stats, None);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["date"], "2026-12-12");
        assert_eq!(json["displayDate"], "12 December 2026");
        assert_eq!(json["temperatureRange"], "19°C - 29°C");
        assert_eq!(json["rainProbability"], 70);
        assert!(json.get("alertMessage").is_none());
    }
}
