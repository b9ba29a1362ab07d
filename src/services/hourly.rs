//! Synthetic hourly profile and time-slot recommendations.
//!
//! The profile is shaped from the day's statistics plus uniform jitter; it is
//! not a forecast and involves no second fetch. The random source is passed
//! in so callers control determinism.

use std::f64::consts::PI;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::helpers::{mean, round_1dp, round_half_up};
use crate::models::ClimateStatistics;

/// First synthesized hour (inclusive).
pub const FIRST_HOUR: u32 = 6;
/// Last synthesized hour (inclusive).
pub const LAST_HOUR: u32 = 22;
/// Latest end hour considered when searching for alternative slots.
const LAST_SLOT_END: u32 = 20;
/// Default slot length when the event has no end time.
const DEFAULT_SLOT_HOURS: u32 = 2;
const MAX_RECOMMENDATIONS: usize = 3;

const TEMP_AMPLITUDE_C: f64 = 5.0;
const TEMP_JITTER_C: f64 = 1.0;
const AFTERNOON_RAIN_BIAS: f64 = 10.0;
const RAIN_JITTER: f64 = 7.5;
const HUMIDITY_JITTER: f64 = 5.0;
const WIND_JITTER_KMH: f64 = 2.5;

const CONDITION_RAIN: &str = "possible rain";
const CONDITION_CLOUDY: &str = "partly cloudy";
const CONDITION_CLEAR: &str = "clear";

/// One synthesized hour.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlySample {
    /// Local time of the sample (no offset)
    pub time: NaiveDateTime,
    /// Temperature (°C), one decimal
    pub temp_c: f64,
    /// "possible rain", "partly cloudy" or "clear"
    pub condition: String,
    /// Precipitation amount (mm)
    pub precip_mm: f64,
    /// Chance of rain (%)
    pub chance_of_rain: i32,
    /// Relative humidity (%)
    pub humidity: i32,
    /// Wind speed (km/h), one decimal
    pub wind_kph: f64,
    /// UV index
    pub uv: f64,
    pub is_day: bool,
}

impl HourlySample {
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

/// Aggregates over a requested hour range.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlySlotAnalysis {
    /// e.g. "14:00 - 16:00"
    pub time_slot: String,
    pub average_temperature: f64,
    /// Worst-case rain chance in the slot (%)
    pub max_precipitation_chance: i32,
    pub average_humidity: i32,
    pub average_wind_speed: f64,
    /// Slot comfort index, 0-100
    pub comfort_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
    pub hourly_data: Vec<HourlySample>,
}

/// A same-length slot that scored well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedTimeSlot {
    pub start_hour: u32,
    pub end_hour: u32,
    pub time_slot: String,
    pub comfort_index: i32,
}

/// Outcome of hourly planning for one event; empty when the slot is unusable.
#[derive(Debug, Clone, Default)]
pub struct HourlyPlan {
    pub analysis: Option<HourlySlotAnalysis>,
    pub recommended: Vec<RecommendedTimeSlot>,
}

/// Synthesize one sample per hour for `FIRST_HOUR..=LAST_HOUR`.
pub fn generate_hourly_profile<R: Rng + ?Sized>(
    date: NaiveDate,
    stats: &ClimateStatistics,
    rng: &mut R,
) -> Vec<HourlySample> {
    let mut samples = Vec::with_capacity((LAST_HOUR - FIRST_HOUR + 1) as usize);

    for hour in FIRST_HOUR..=LAST_HOUR {
        let Some(time) = date.and_hms_opt(hour, 0, 0) else {
            continue;
        };

        // Sine peaks at 14:00.
        let curve = ((hour - FIRST_HOUR) as f64 * PI / 16.0).sin() * TEMP_AMPLITUDE_C;
        let temp_c = stats.avg_temperature as f64
            + curve
            + rng.gen_range(-TEMP_JITTER_C..=TEMP_JITTER_C);

        let afternoon = if (14..=18).contains(&hour) {
            AFTERNOON_RAIN_BIAS
        } else {
            0.0
        };
        let rain = (stats.rain_probability as f64
            + afternoon
            + rng.gen_range(-RAIN_JITTER..=RAIN_JITTER))
        .clamp(0.0, 100.0);

        let humidity = (stats.avg_humidity as f64
            + rng.gen_range(-HUMIDITY_JITTER..=HUMIDITY_JITTER))
        .clamp(0.0, 100.0);
        let wind = (stats.avg_wind_speed as f64
            + rng.gen_range(-WIND_JITTER_KMH..=WIND_JITTER_KMH))
        .max(0.0);

        let condition = if rain > 60.0 {
            CONDITION_RAIN
        } else if rain > 30.0 {
            CONDITION_CLOUDY
        } else {
            CONDITION_CLEAR
        };
        let precip_mm = if rain > 60.0 {
            round_1dp(rng.gen_range(0.0..5.0))
        } else {
            0.0
        };
        let uv = if (10..=16).contains(&hour) {
            round_1dp((3.0 + rng.gen_range(0.0_f64..5.0)).min(11.0))
        } else {
            0.0
        };

        samples.push(HourlySample {
            time,
            temp_c: round_1dp(temp_c),
            condition: condition.to_string(),
            precip_mm,
            chance_of_rain: round_half_up(rain),
            humidity: round_half_up(humidity),
            wind_kph: round_1dp(wind),
            uv,
            is_day: hour <= 18,
        });
    }

    samples
}

/// Analyze `start_hour..=end_hour`. `None` when no sample falls in the range.
pub fn analyze_time_slot(
    series: &[HourlySample],
    start_hour: u32,
    end_hour: u32,
) -> Option<HourlySlotAnalysis> {
    let hours: Vec<HourlySample> = series
        .iter()
        .filter(|s| (start_hour..=end_hour).contains(&s.hour()))
        .cloned()
        .collect();

    let temps: Vec<f64> = hours.iter().map(|s| s.temp_c).collect();
    let humidities: Vec<f64> = hours.iter().map(|s| s.humidity as f64).collect();
    let winds: Vec<f64> = hours.iter().map(|s| s.wind_kph).collect();

    let avg_temp = mean(&temps)?;
    let avg_humidity = mean(&humidities)?;
    let avg_wind = mean(&winds)?;
    let max_rain = hours.iter().map(|s| s.chance_of_rain).max()?;

    let comfort_index =
        calculate_slot_comfort_index(avg_temp, max_rain as f64, avg_humidity, avg_wind);

    // Rain first, then heat, then cold.
    let alert_message = if max_rain > 50 {
        Some(format!(
            "High chance of rain ({}%) during the selected time.",
            max_rain
        ))
    } else if avg_temp > 30.0 {
        Some(format!(
            "High average temperature ({:.1}°C) during the selected time.",
            avg_temp
        ))
    } else if avg_temp < 15.0 {
        Some(format!(
            "Low average temperature ({:.1}°C) during the selected time.",
            avg_temp
        ))
    } else {
        None
    };

    Some(HourlySlotAnalysis {
        time_slot: format_slot(start_hour, end_hour),
        average_temperature: round_1dp(avg_temp),
        max_precipitation_chance: max_rain,
        average_humidity: round_half_up(avg_humidity),
        average_wind_speed: round_1dp(avg_wind),
        comfort_index,
        alert_message,
        hourly_data: hours,
    })
}

/// Weighted blend of per-factor scores, each normalized to 0-100.
///
/// Kept separate from the ICP: different weights, different ideal ranges.
pub fn calculate_slot_comfort_index(
    temperature: f64,
    rain_chance: f64,
    humidity: f64,
    wind_speed: f64,
) -> i32 {
    let index = 0.4 * normalize_temperature(temperature)
        + 0.3 * normalize_rain(rain_chance)
        + 0.2 * normalize_humidity(humidity)
        + 0.1 * normalize_wind(wind_speed);
    round_half_up(index)
}

fn normalize_temperature(t: f64) -> f64 {
    if (22.0..=25.0).contains(&t) {
        100.0
    } else if t < 22.0 {
        (100.0 - (22.0 - t) * 5.0).max(0.0)
    } else {
        (100.0 - (t - 25.0) * 5.0).max(0.0)
    }
}

fn normalize_rain(chance: f64) -> f64 {
    (100.0 - chance).max(0.0)
}

fn normalize_humidity(h: f64) -> f64 {
    if (40.0..=60.0).contains(&h) {
        100.0
    } else if h < 40.0 {
        (100.0 - (40.0 - h) * 2.0).max(0.0)
    } else {
        (100.0 - (h - 60.0) * 2.0).max(0.0)
    }
}

fn normalize_wind(speed: f64) -> f64 {
    if speed <= 15.0 {
        100.0
    } else if speed <= 30.0 {
        (100.0 - (speed - 15.0) * 3.0).max(0.0)
    } else {
        10.0
    }
}

/// Score every other slot of the same length that ends by `LAST_SLOT_END`.
///
/// Returns at most three, best first. An inverted range yields nothing.
pub fn find_optimal_time_slots(
    series: &[HourlySample],
    original_start: u32,
    original_end: u32,
) -> Vec<RecommendedTimeSlot> {
    let Some(duration) = original_end.checked_sub(original_start) else {
        return Vec::new();
    };
    let Some(last_start) = LAST_SLOT_END.checked_sub(duration) else {
        return Vec::new();
    };

    let mut slots: Vec<RecommendedTimeSlot> = (FIRST_HOUR..=last_start)
        .filter(|&start| start != original_start)
        .filter_map(|start| {
            let end = start + duration;
            analyze_time_slot(series, start, end).map(|a| RecommendedTimeSlot {
                start_hour: start,
                end_hour: end,
                time_slot: a.time_slot,
                comfort_index: a.comfort_index,
            })
        })
        .collect();

    slots.sort_by(|a, b| b.comfort_index.cmp(&a.comfort_index));
    slots.truncate(MAX_RECOMMENDATIONS);
    slots
}

/// Hour component of an `HH:MM` string.
pub fn parse_hour(value: &str) -> Option<u32> {
    let hour = value.split(':').next()?.trim().parse::<u32>().ok()?;
    (hour < 24).then_some(hour)
}

/// Synthesize the day, analyze the requested slot and rank the alternatives.
///
/// Without an end time the slot lasts two hours. Unparsable times produce an
/// empty plan.
pub fn plan_event_hours<R: Rng + ?Sized>(
    date: NaiveDate,
    stats: &ClimateStatistics,
    start_time: &str,
    end_time: Option<&str>,
    rng: &mut R,
) -> HourlyPlan {
    let Some(start_hour) = parse_hour(start_time) else {
        tracing::warn!("Ignoring unparsable event start time {:?}", start_time);
        return HourlyPlan::default();
    };
    let end_hour = match end_time {
        Some(t) => parse_hour(t),
        None => Some(start_hour + DEFAULT_SLOT_HOURS),
    };
    let Some(end_hour) = end_hour else {
        tracing::warn!("Ignoring unparsable event end time {:?}", end_time);
        return HourlyPlan::default();
    };

    let series = generate_hourly_profile(date, stats, rng);
    let analysis = analyze_time_slot(&series, start_hour, end_hour);
    if analysis.is_none() {
        tracing::debug!(
            "No synthesized hours between {}:00 and {}:00",
            start_hour,
            end_hour
        );
        return HourlyPlan::default();
    }

    HourlyPlan {
        analysis,
        recommended: find_optimal_time_slots(&series, start_hour, end_hour),
    }
}

fn format_slot(start_hour: u32, end_hour: u32) -> String {
    format!("{}:00 - {}:00", start_hour, end_hour)
}
