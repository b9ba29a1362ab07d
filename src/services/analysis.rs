//! Per-location pipeline and multi-location fan-out.
//!
//! Each location runs fetch, reduce, score and trend for the requested date,
//! then holidays, alternative dates and the hourly plan concurrently. Errors
//! are caught at the location boundary so one location never fails another.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::{ClimateStatistics, Coordinate, DateResult, Preferences};
use crate::services::alternatives::{evaluate_date, suggest_alternative_dates};
use crate::services::holidays::{HolidayContext, HolidaySource};
use crate::services::hourly::{
    plan_event_hours, HourlyPlan, HourlySlotAnalysis, RecommendedTimeSlot,
};
use crate::services::nasa_power::HistoricalSource;
use crate::services::trend::detect_trend;

const DATA_PROVIDER: &str = "NASA POWER";

/// A location with coordinates already resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct LocationInput {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationInput {
    /// A name whose coordinates could not be resolved; they serialize as null.
    pub fn unresolved(name: String) -> Self {
        Self {
            name,
            latitude: f64::NAN,
            longitude: f64::NAN,
        }
    }
}

/// Optional time of day for the event.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// "HH:MM"
    pub start_time: Option<String>,
    /// "HH:MM"; defaults to two hours after the start
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
}

/// Request-wide inputs shared by every location.
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub date: NaiveDate,
    pub preferences: Preferences,
    pub event_time: Option<EventTime>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub provider: String,
    /// "startYear-endYear"
    pub period: String,
    pub years_analyzed: usize,
}

/// Full result for a location that was analyzed successfully.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub location: LocationInput,
    pub requested_date: DateResult,
    /// Up to four dates, best ICP first
    pub alternative_dates: Vec<DateResult>,
    pub hourly_analysis: Option<HourlySlotAnalysis>,
    pub recommended_time_slots: Vec<RecommendedTimeSlot>,
    pub holidays: HolidayContext,
    pub data_source: DataSource,
}

/// Result for a location whose pipeline failed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationFailure {
    pub location: LocationInput,
    pub error: String,
    /// Always null
    pub requested_date: Option<DateResult>,
    /// Always empty
    pub alternative_dates: Vec<DateResult>,
    /// Always null
    pub data_source: Option<DataSource>,
}

impl LocationFailure {
    pub fn new(location: LocationInput, error: String) -> Self {
        Self {
            location,
            error,
            requested_date: None,
            alternative_dates: Vec::new(),
            data_source: None,
        }
    }
}

/// One entry of the response, success or failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LocationAnalysis {
    Success(Box<LocationReport>),
    Failure(LocationFailure),
}

impl LocationAnalysis {
    pub fn is_success(&self) -> bool {
        matches!(self, LocationAnalysis::Success(_))
    }
}

/// Runs the per-location pipeline against injected data sources.
#[derive(Clone)]
pub struct AnalysisEngine {
    climate: Arc<dyn HistoricalSource>,
    holidays: Arc<dyn HolidaySource>,
    /// Fixed seed for the hourly jitter; entropy when `None`.
    hourly_seed: Option<u64>,
}

impl AnalysisEngine {
    pub fn new(climate: Arc<dyn HistoricalSource>, holidays: Arc<dyn HolidaySource>) -> Self {
        Self {
            climate,
            holidays,
            hourly_seed: None,
        }
    }

    #[cfg(test)]
    pub fn with_hourly_seed(mut self, seed: u64) -> Self {
        self.hourly_seed = Some(seed);
        self
    }

    /// Analyze every location concurrently. Output order matches input order.
    ///
    /// Each location runs on its own task, so a panic inside one pipeline
    /// becomes a failure record for that location only.
    pub async fn analyze_locations(
        &self,
        locations: Vec<LocationInput>,
        params: &AnalysisParams,
    ) -> Vec<LocationAnalysis> {
        let started = Instant::now();
        let count = locations.len();

        let tasks = locations.into_iter().map(|location| {
            let engine = self.clone();
            let params = params.clone();
            let fallback = location.clone();
            async move {
                let handle =
                    tokio::spawn(async move { engine.process_location(location, &params).await });
                match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Analysis task for '{}' aborted: {}", fallback.name, e);
                        LocationAnalysis::Failure(LocationFailure::new(
                            fallback,
                            format!("Location analysis aborted: {}", e),
                        ))
                    }
                }
            }
        });
        let results = futures::future::join_all(tasks).await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            "Analyzed {} location(s) for {} in {}ms ({} failed)",
            count,
            params.date,
            started.elapsed().as_millis(),
            failed
        );
        results
    }

    /// Analyze one location; any error becomes a failure record.
    pub async fn process_location(
        &self,
        location: LocationInput,
        params: &AnalysisParams,
    ) -> LocationAnalysis {
        match self.run_pipeline(&location, params).await {
            Ok(report) => LocationAnalysis::Success(Box::new(report)),
            Err(e) => {
                tracing::error!("Analysis failed for '{}': {}", location.name, e);
                LocationAnalysis::Failure(LocationFailure::new(location, e.to_string()))
            }
        }
    }

    async fn run_pipeline(
        &self,
        location: &LocationInput,
        params: &AnalysisParams,
    ) -> Result<LocationReport, AppError> {
        let started = Instant::now();
        tracing::info!("Processing location '{}'", location.name);

        let coordinate = Coordinate::new(location.latitude, location.longitude)?;
        let evaluated = evaluate_date(
            self.climate.as_ref(),
            coordinate,
            params.date,
            &params.preferences,
        )
        .await?;
        let trend = detect_trend(&evaluated.window);
        let statistics = evaluated.statistics;

        tracing::debug!(
            "'{}': {} years, ICP {}, trend {:+.0}pp",
            location.name,
            evaluated.window.year_count,
            evaluated.icp,
            trend.difference
        );

        let (nearby, alternative_dates, hourly) = tokio::join!(
            self.holidays.nearby_holidays(params.date),
            suggest_alternative_dates(
                self.climate.as_ref(),
                coordinate,
                params.date,
                &params.preferences,
            ),
            async { self.hourly_plan(params, &statistics) },
        );

        tracing::debug!(
            "'{}' processed in {}ms",
            location.name,
            started.elapsed().as_millis()
        );

        let window = &evaluated.window;
        Ok(LocationReport {
            location: location.clone(),
            requested_date: DateResult::build(
                params.date,
                evaluated.icp,
                &statistics,
                trend.alert(),
            ),
            alternative_dates,
            hourly_analysis: hourly.analysis,
            recommended_time_slots: hourly.recommended,
            holidays: HolidayContext::new(nearby, &statistics),
            data_source: DataSource {
                provider: DATA_PROVIDER.to_string(),
                period: format!("{}-{}", window.start_year, window.end_year),
                years_analyzed: window.year_count,
            },
        })
    }

    /// Hourly plan for timed events; empty for all-day or untimed events.
    fn hourly_plan(&self, params: &AnalysisParams, statistics: &ClimateStatistics) -> HourlyPlan {
        let Some(event_time) = params.event_time.as_ref().filter(|t| !t.is_all_day) else {
            return HourlyPlan::default();
        };
        let Some(start_time) = event_time.start_time.as_deref() else {
            return HourlyPlan::default();
        };

        let mut rng = match self.hourly_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        plan_event_hours(
            params.date,
            statistics,
            start_time,
            event_time.end_time.as_deref(),
            &mut rng,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{EventType, HistoricalWindow};
    use crate::services::alternatives::tests::FakeSource;
    use crate::services::holidays::NearbyHoliday;
    use async_trait::async_trait;

    /// Returns one fixed holiday ten days after any target.
    pub(crate) struct FakeHolidays;

    #[async_trait]
    impl HolidaySource for FakeHolidays {
        async fn nearby_holidays(&self, target: NaiveDate) -> Vec<NearbyHoliday> {
            vec![NearbyHoliday {
                date: target + chrono::Duration::days(10),
                name: "Natal".to_string(),
                name_en: "Christmas Day".to_string(),
                is_global: true,
                types: vec!["Public".to_string()],
                days_from_target: 10,
            }]
        }
    }

    pub(crate) fn engine(source: FakeSource) -> AnalysisEngine {
        AnalysisEngine::new(Arc::new(source), Arc::new(FakeHolidays)).with_hourly_seed(11)
    }

    fn location(name: &str, latitude: f64, longitude: f64) -> LocationInput {
        LocationInput {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    fn params(event_time: Option<EventTime>) -> AnalysisParams {
        AnalysisParams {
            date: NaiveDate::from_ymd_opt(2026, 12, 12).unwrap(),
            preferences: Preferences {
                preferred_temperature: 25.0,
                event_type: EventType::Wedding,
            },
            event_time,
        }
    }

    fn timed(start: &str, end: Option<&str>, is_all_day: bool) -> Option<EventTime> {
        Some(EventTime {
            start_time: Some(start.to_string()),
            end_time: end.map(str::to_string),
            is_all_day,
        })
    }

    fn unwrap_report(result: &LocationAnalysis) -> &LocationReport {
        match result {
            LocationAnalysis::Success(report) => report,
            LocationAnalysis::Failure(f) => panic!("unexpected failure: {}", f.error),
        }
    }

    #[tokio::test]
    async fn test_failing_location_does_not_affect_sibling() {
        let source = FakeSource {
            failing_latitudes: vec![-30.0],
            ..FakeSource::healthy()
        };
        let results = engine(source)
            .analyze_locations(
                vec![
                    location("A", -22.9, -43.2),
                    location("B", -30.0, -51.2),
                    location("C", -8.05, -34.9),
                ],
                &params(None),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(unwrap_report(&results[0]).location.name, "A");
        assert_eq!(unwrap_report(&results[2]).location.name, "C");
        match &results[1] {
            LocationAnalysis::Failure(f) => {
                assert_eq!(f.location.name, "B");
                assert!(f.error.contains("provider unavailable"));
            }
            LocationAnalysis::Success(_) => panic!("B should have failed"),
        }
    }

    #[tokio::test]
    async fn test_report_contents() {
        let results = engine(FakeSource::healthy())
            .analyze_locations(vec![location("Rio", -22.9, -43.2)], &params(None))
            .await;
        let report = unwrap_report(&results[0]);

        assert_eq!(report.requested_date.date, params(None).date);
        assert!((0..=100).contains(&report.requested_date.icp));
        assert_eq!(report.alternative_dates.len(), 4);
        assert_eq!(report.data_source.provider, "NASA POWER");
        assert_eq!(report.data_source.period, "2006-2025");
        assert_eq!(report.data_source.years_analyzed, 20);
        assert_eq!(report.holidays.count, 1);
        assert_eq!(report.holidays.messages[0], "📅 Natal is in 10 days");
        assert!(report.hourly_analysis.is_none());
        assert!(report.recommended_time_slots.is_empty());
    }

    #[tokio::test]
    async fn test_hourly_only_for_timed_events() {
        let engine = engine(FakeSource::healthy());
        let loc = || vec![location("Rio", -22.9, -43.2)];

        let timed_result = engine
            .analyze_locations(loc(), &params(timed("14:00", Some("16:00"), false)))
            .await;
        let report = unwrap_report(&timed_result[0]);
        let analysis = report.hourly_analysis.as_ref().unwrap();
        assert_eq!(analysis.time_slot, "14:00 - 16:00");
        assert_eq!(report.recommended_time_slots.len(), 3);

        let all_day = engine
            .analyze_locations(loc(), &params(timed("14:00", None, true)))
            .await;
        let report = unwrap_report(&all_day[0]);
        assert!(report.hourly_analysis.is_none());
        assert!(report.recommended_time_slots.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_engine_is_reproducible() {
        let engine = engine(FakeSource::healthy());
        let p = params(timed("09:00", None, false));
        let a = engine.process_location(location("Rio", -22.9, -43.2), &p).await;
        let b = engine.process_location(location("Rio", -22.9, -43.2), &p).await;
        let a = unwrap_report(&a).hourly_analysis.clone().unwrap();
        let b = unwrap_report(&b).hourly_analysis.clone().unwrap();
        assert_eq!(a.hourly_data, b.hourly_data);
        assert_eq!(a.comfort_index, b.comfort_index);
    }

    #[tokio::test]
    async fn test_invalid_coordinate_is_a_failure_record() {
        let result = engine(FakeSource::healthy())
            .process_location(location("Nowhere", 120.0, 0.0), &params(None))
            .await;
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["location"]["name"], "Nowhere");
        assert!(json["error"].as_str().unwrap().contains("latitude"));
        assert!(json["requestedDate"].is_null());
        assert_eq!(json["alternativeDates"], serde_json::json!([]));
        assert!(json["dataSource"].is_null());
    }

    /// Panics for one latitude, delegates to a healthy source otherwise.
    struct PanickingSource {
        latitude: f64,
        inner: FakeSource,
    }

    #[async_trait]
    impl HistoricalSource for PanickingSource {
        async fn fetch_window(
            &self,
            coordinate: Coordinate,
            date: NaiveDate,
        ) -> Result<HistoricalWindow, AppError> {
            if coordinate.latitude == self.latitude {
                panic!("corrupt provider payload");
            }
            self.inner.fetch_window(coordinate, date).await
        }
    }

    #[tokio::test]
    async fn test_panicking_location_becomes_failure_record() {
        let source = PanickingSource {
            latitude: -30.0,
            inner: FakeSource::healthy(),
        };
        let engine =
            AnalysisEngine::new(Arc::new(source), Arc::new(FakeHolidays)).with_hourly_seed(11);
        let results = engine
            .analyze_locations(
                vec![location("A", -22.9, -43.2), location("B", -30.0, -51.2)],
                &params(None),
            )
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(unwrap_report(&results[0]).location.name, "A");
        match &results[1] {
            LocationAnalysis::Failure(f) => {
                assert_eq!(f.location.name, "B");
                assert!(f.error.starts_with("Location analysis aborted"));
                assert!(f.requested_date.is_none());
            }
            LocationAnalysis::Success(_) => panic!("B should have failed"),
        }
    }

    #[test]
    fn test_unresolved_location_serializes_null_coordinates() {
        let failure = LocationAnalysis::Failure(LocationFailure::new(
            LocationInput::unresolved("Atlantis".to_string()),
            "not found".to_string(),
        ));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["location"]["name"], "Atlantis");
        assert!(json["location"]["latitude"].is_null());
        assert!(json["location"]["longitude"].is_null());
        assert_eq!(json["error"], "not found");
    }

    #[tokio::test]
    async fn test_success_serializes_flat() {
        let result = engine(FakeSource::healthy())
            .process_location(location("Rio", -22.9, -43.2), &params(None))
            .await;
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("error").is_none());
        assert_eq!(json["location"]["latitude"], -22.9);
        assert!(json["requestedDate"]["icp"].is_i64());
        assert!(json["hourlyAnalysis"].is_null());
        assert_eq!(json["dataSource"]["yearsAnalyzed"], 20);
        assert_eq!(json["holidays"]["count"], 1);
    }
}
