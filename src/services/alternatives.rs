//! Alternative-date ranking.
//!
//! Scores four dates around the target with the same fetch, reduce and score
//! routine as the requested date. Candidates whose fetch fails are dropped.

use chrono::{Duration, NaiveDate};

use crate::errors::AppError;
use crate::models::{ClimateStatistics, Coordinate, DateResult, HistoricalWindow, Preferences};
use crate::services::comfort::calculate_icp;
use crate::services::nasa_power::HistoricalSource;
use crate::services::statistics::calculate_statistics;

/// Day offsets evaluated around the target date.
pub const ALTERNATIVE_OFFSETS_DAYS: [i64; 4] = [-14, -7, 7, 14];

/// A date run through fetch, reduce and score.
#[derive(Debug, Clone)]
pub struct EvaluatedDate {
    pub window: HistoricalWindow,
    pub statistics: ClimateStatistics,
    pub icp: i32,
}

/// Fetch the window for `date`, reduce it and compute the ICP.
pub async fn evaluate_date(
    source: &dyn HistoricalSource,
    coordinate: Coordinate,
    date: NaiveDate,
    preferences: &Preferences,
) -> Result<EvaluatedDate, AppError> {
    let window = source.fetch_window(coordinate, date).await?;
    let statistics = calculate_statistics(&window)?;
    let icp = calculate_icp(
        &statistics,
        preferences.preferred_temperature,
        preferences.event_type,
    );
    Ok(EvaluatedDate {
        window,
        statistics,
        icp,
    })
}

/// Evaluate every offset concurrently and return the successes, best ICP first.
///
/// An empty result is valid output.
pub async fn suggest_alternative_dates(
    source: &dyn HistoricalSource,
    coordinate: Coordinate,
    target: NaiveDate,
    preferences: &Preferences,
) -> Vec<DateResult> {
    let candidates: Vec<NaiveDate> = ALTERNATIVE_OFFSETS_DAYS
        .iter()
        .filter_map(|&offset| target.checked_add_signed(Duration::days(offset)))
        .collect();

    let evaluations = candidates.iter().map(|&date| async move {
        match evaluate_date(source, coordinate, date, preferences).await {
            Ok(evaluated) => Some(DateResult::build(
                date,
                evaluated.icp,
                &evaluated.statistics,
                None,
            )),
            Err(e) => {
                tracing::warn!("Dropping alternative date {}: {}", date, e);
                None
            }
        }
    });

    let mut alternatives: Vec<DateResult> = futures::future::join_all(evaluations)
        .await
        .into_iter()
        .flatten()
        .collect();

    alternatives.sort_by(|a, b| b.icp.cmp(&a.icp));
    alternatives
}
