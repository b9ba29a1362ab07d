//! Reduces a historical window into representative-day statistics.

use crate::errors::AppError;
use crate::helpers::{mean, percentage, round_half_up};
use crate::models::{ClimateStatistics, DailyObservation, HistoricalWindow};

/// Precipitation above this counts as a rainy day (mm).
pub const RAIN_DAY_THRESHOLD_MM: f64 = 1.0;

/// A day colder than this is extreme (°C).
const EXTREME_COLD_C: f64 = 10.0;
/// A day hotter than this is extreme (°C).
const EXTREME_HOT_C: f64 = 35.0;
/// A day wetter than this is extreme (mm).
const EXTREME_RAIN_MM: f64 = 10.0;

pub fn is_rainy(obs: &DailyObservation) -> bool {
    obs.precipitation_mm > RAIN_DAY_THRESHOLD_MM
}

/// Cold, hot and heavy-rain days are collapsed into one "extreme" flag.
pub fn is_extreme(obs: &DailyObservation) -> bool {
    obs.temperature_c < EXTREME_COLD_C
        || obs.temperature_c > EXTREME_HOT_C
        || obs.precipitation_mm > EXTREME_RAIN_MM
}

/// Collapse a `HistoricalWindow` into a `ClimateStatistics` record.
///
/// Fails with `DataInsufficient` when the window holds no years.
pub fn calculate_statistics(window: &HistoricalWindow) -> Result<ClimateStatistics, AppError> {
    let days = &window.observations;
    if days.is_empty() {
        return Err(AppError::DataInsufficient(format!(
            "no historical observations between {} and {}",
            window.start_year, window.end_year
        )));
    }

    let temperatures: Vec<f64> = days.iter().map(|d| d.temperature_c).collect();
    let humidities: Vec<f64> = days.iter().map(|d| d.humidity_pct).collect();
    let winds: Vec<f64> = days.iter().map(|d| d.wind_speed_kmh).collect();
    let clouds: Vec<f64> = days.iter().map(|d| d.cloud_cover_pct).collect();

    let min_t = temperatures.iter().copied().fold(f64::INFINITY, f64::min);
    let max_t = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let rainy_days = days.iter().filter(|d| is_rainy(d)).count();
    let extreme_days = days.iter().filter(|d| is_extreme(d)).count();

    Ok(ClimateStatistics {
        avg_temperature: round_half_up(mean(&temperatures).unwrap_or(0.0)),
        min_temperature: round_half_up(min_t),
        max_temperature: round_half_up(max_t),
        rain_probability: percentage(rainy_days, days.len()),
        avg_humidity: clamp_pct(round_half_up(mean(&humidities).unwrap_or(0.0))),
        avg_wind_speed: round_half_up(mean(&winds).unwrap_or(0.0)).max(0),
        avg_cloud_cover: clamp_pct(round_half_up(mean(&clouds).unwrap_or(0.0))),
        extreme_events_probability: percentage(extreme_days, days.len()),
    })
}

fn clamp_pct(v: i32) -> i32 {
    v.clamp(0, 100)
}

pub fn wind_description(wind_kmh: i32) -> &'static str {
    match wind_kmh {
        w if w < 10 => "Light wind, excellent conditions",
        w if w < 20 => "Moderate wind, normal conditions",
        w if w < 30 => "Strong wind, may cause discomfort",
        _ => "Very strong wind, not recommended for outdoor events",
    }
}

pub fn humidity_description(humidity: i32) -> &'static str {
    match humidity {
        h if h < 40 => "Dry air",
        h if h < 70 => "Comfortable humidity",
        _ => "High humidity, may cause discomfort",
    }
}

pub fn cloud_description(cloud_cover: i32) -> &'static str {
    match cloud_cover {
        c if c < 20 => "Clear sky",
        c if c < 50 => "A few clouds",
        c if c < 80 => "Partly cloudy",
        _ => "Overcast",
    }
}

pub fn extreme_description(probability: i32) -> &'static str {
    match probability {
        p if p < 5 => "Minimal chance of extremes",
        p if p < 15 => "Low chance of extremes",
        p if p < 30 => "Moderate chance of extremes",
        _ => "High chance of extreme events",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn day(year: i32, temperature_c: f64, precipitation_mm: f64) -> DailyObservation {
        DailyObservation {
            year,
            temperature_c,
            precipitation_mm,
            humidity_pct: 68.0,
            wind_speed_kmh: 10.0,
            cloud_cover_pct: 40.0,
        }
    }

    /// 20 years at 24°C, the first `rainy` of them with 5 mm of rain.
    pub(crate) fn twenty_year_window(rainy: usize) -> HistoricalWindow {
        let observations = (0..20)
            .map(|i| {
                let precip = if i < rainy { 5.0 } else { 0.0 };
                day(2006 + i as i32, 24.0, precip)
            })
            .collect();
        HistoricalWindow::new(observations, 2006, 2025)
    }

    #[test]
    fn test_rain_probability_scenario() {
        let stats = calculate_statistics(&twenty_year_window(14)).unwrap();
        assert_eq!(stats.rain_probability, 70);
        assert_eq!(stats.avg_temperature, 24);
        assert_eq!(stats.avg_humidity, 68);
        assert_eq!(stats.avg_wind_speed, 10);
        assert_eq!(stats.extreme_events_probability, 0);
    }

    #[test]
    fn test_rain_threshold_is_strict() {
        let window = HistoricalWindow::new(
            vec![day(2020, 20.0, 1.0), day(2021, 20.0, 1.01)],
            2020,
            2021,
        );
        let stats = calculate_statistics(&window).unwrap();
        assert_eq!(stats.rain_probability, 50, "exactly 1 mm is not a rainy day");
    }

    #[test]
    fn test_extreme_days_any_condition() {
        let window = HistoricalWindow::new(
            vec![
                day(2020, 9.0, 0.0), // cold
                day(2021, 36.0, 0.0), // hot
                day(2022, 20.0, 12.0), // heavy rain
                day(2023, 20.0, 0.0),
            ],
            2020,
            2023,
        );
        let stats = calculate_statistics(&window).unwrap();
        assert_eq!(stats.extreme_events_probability, 75);
    }

    #[test]
    fn test_min_avg_max_ordering() {
        let window = HistoricalWindow::new(
            vec![day(2020, 12.4, 0.0), day(2021, 18.6, 0.0), day(2022, 30.2, 0.0)],
            2020,
            2022,
        );
        let stats = calculate_statistics(&window).unwrap();
        assert_eq!(stats.min_temperature, 12);
        assert_eq!(stats.max_temperature, 30);
        assert_eq!(stats.avg_temperature, 20);
        assert!(stats.min_temperature <= stats.avg_temperature);
        assert!(stats.avg_temperature <= stats.max_temperature);
    }

    #[test]
    fn test_percentages_stay_in_bounds() {
        let mut obs = day(2020, 20.0, 50.0);
        obs.humidity_pct = 104.0;
        obs.cloud_cover_pct = -3.0;
        let window = HistoricalWindow::new(vec![obs], 2020, 2020);
        let stats = calculate_statistics(&window).unwrap();
        for pct in [
            stats.rain_probability,
            stats.avg_humidity,
            stats.avg_cloud_cover,
            stats.extreme_events_probability,
        ] {
            assert!((0..=100).contains(&pct), "{} out of range", pct);
        }
    }

    #[test]
    fn test_empty_window_is_data_insufficient() {
        let window = HistoricalWindow::new(vec![], 2006, 2025);
        let err = calculate_statistics(&window).unwrap_err();
        assert!(matches!(err, AppError::DataInsufficient(_)));
    }

    #[test]
    fn test_statistics_deterministic() {
        let window = twenty_year_window(7);
        let a = calculate_statistics(&window).unwrap();
        let b = calculate_statistics(&window).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(wind_description(5), "Light wind, excellent conditions");
        assert_eq!(wind_description(30), "Very strong wind, not recommended for outdoor events");
        assert_eq!(humidity_description(39), "Dry air");
        assert_eq!(humidity_description(70), "High humidity, may cause discomfort");
        assert_eq!(cloud_description(79), "Partly cloudy");
        assert_eq!(extreme_description(4), "Minimal chance of extremes");
        assert_eq!(extreme_description(30), "High chance of extreme events");
    }
}
