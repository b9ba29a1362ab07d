//! Personal Comfort Index (ICP).
//!
//! A weighted-penalty score: start from 100 and subtract penalties for
//! temperature deviation, rain frequency, excess wind, humidity deviation and
//! extreme-day frequency. The coefficients define the product's notion of
//! "comfortable" and are not configurable.

use crate::helpers::round_half_up;
use crate::models::{ClimateStatistics, EventType};

const TEMPERATURE_WEIGHT: f64 = 2.5;
const RAIN_WEIGHT: f64 = 0.3;
const WIND_WEIGHT: f64 = 1.5;
const HUMIDITY_WEIGHT: f64 = 0.15;
const EXTREME_WEIGHT: f64 = 1.5;

/// Relative humidity considered ideal (%).
const OPTIMAL_HUMIDITY_PCT: f64 = 60.0;

impl EventType {
    /// Wind speed (km/h) an event tolerates before it is penalised.
    pub fn wind_threshold_kmh(self) -> f64 {
        match self {
            EventType::Wedding | EventType::Corporate => 15.0,
            EventType::Festival => 18.0,
            EventType::Sports | EventType::Outdoor => 20.0,
            EventType::Agriculture => 25.0,
            EventType::Other => 20.0,
        }
    }
}

/// Compute the ICP, an integer in `[0, 100]`.
pub fn calculate_icp(
    stats: &ClimateStatistics,
    preferred_temperature: f64,
    event_type: EventType,
) -> i32 {
    let mut score = 100.0;

    score -= (stats.avg_temperature as f64 - preferred_temperature).abs() * TEMPERATURE_WEIGHT;
    score -= stats.rain_probability as f64 * RAIN_WEIGHT;

    let excess_wind = (stats.avg_wind_speed as f64 - event_type.wind_threshold_kmh()).max(0.0);
    score -= excess_wind * WIND_WEIGHT;

    score -= (stats.avg_humidity as f64 - OPTIMAL_HUMIDITY_PCT).abs() * HUMIDITY_WEIGHT;
    score -= stats.extreme_events_probability as f64 * EXTREME_WEIGHT;

    if !score.is_finite() {
        return 0;
    }
    round_half_up(score).clamp(0, 100)
}
