//! Rain-trend detection.
//!
//! Compares rain-day frequency in the oldest five years against the newest
//! five years of the window. This is a two-group comparison, not a regression.

use crate::helpers::round_half_up;
use crate::models::{DailyObservation, HistoricalWindow};
use crate::services::statistics::is_rainy;

/// Minimum number of years before a trend is considered at all.
const MIN_YEARS_FOR_TREND: usize = 10;
/// Years in each comparison group.
const GROUP_SIZE: usize = 5;
/// Shift (percentage points) above which the trend is reported.
const SIGNIFICANCE_PP: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSignal {
    pub is_significant: bool,
    pub message: String,
    /// Signed `recent - older` rain frequency, in percentage points.
    pub difference: f64,
}

impl TrendSignal {
    fn none(difference: f64) -> Self {
        Self {
            is_significant: false,
            message: String::new(),
            difference,
        }
    }

    /// The message, only when significant.
    pub fn alert(&self) -> Option<String> {
        self.is_significant.then(|| self.message.clone())
    }
}

pub fn detect_trend(window: &HistoricalWindow) -> TrendSignal {
    if window.year_count < MIN_YEARS_FOR_TREND {
        return TrendSignal::none(0.0);
    }

    // Sort first: providers are not guaranteed to return years in order.
    let days = window.chronological();
    let older = &days[..GROUP_SIZE];
    let recent = &days[days.len() - GROUP_SIZE..];

    let rain_freq = |group: &[&DailyObservation]| {
        group.iter().filter(|d| is_rainy(d)).count() as f64 * 100.0 / group.len() as f64
    };

    let difference = rain_freq(recent) - rain_freq(older);
    if difference.abs() <= SIGNIFICANCE_PP {
        return TrendSignal::none(difference);
    }

    let magnitude = round_half_up(difference.abs());
    let message = if difference > 0.0 {
        format!(
            "Rain probability increased by {}% over the last decade \
             in this region for this period. \
             We strongly recommend a covered backup plan or alternative dates.",
            magnitude
        )
    } else {
        format!(
            "Rain probability decreased by {}% over the last decade \
             in this region for this period. \
             Conditions have been improving for outdoor events.",
            magnitude
        )
    };

    TrendSignal {
        is_significant: true,
        message,
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::statistics::tests::day;

    fn window_from(precips: &[f64]) -> HistoricalWindow {
        let observations = precips
            .iter()
            .enumerate()
            .map(|(i, &p)| day(2006 + i as i32, 22.0, p))
            .collect();
        HistoricalWindow::new(observations, 2006, 2006 + precips.len() as i32 - 1)
    }

    #[test]
    fn test_short_window_never_significant() {
        let window = window_from(&[0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        let trend = detect_trend(&window);
        assert!(!trend.is_significant);
        assert!(trend.message.is_empty());
        assert_eq!(trend.alert(), None);
    }

    #[test]
    fn test_full_increase() {
        let mut precips = vec![0.0; 5];
        precips.extend(vec![0.0; 10]);
        precips.extend(vec![8.0; 5]);
        let trend = detect_trend(&window_from(&precips));
        assert!(trend.is_significant);
        assert_eq!(trend.difference, 100.0);
        assert!(trend.message.contains("increased by 100%"));
        assert!(trend.message.contains("backup plan"));
    }

    #[test]
    fn test_decrease_message() {
        let precips = [5.0, 5.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let trend = detect_trend(&window_from(&precips));
        assert!(trend.is_significant);
        assert_eq!(trend.difference, -60.0);
        assert!(trend.message.contains("decreased by 60%"));
        assert!(trend.message.contains("improving"));
    }

    #[test]
    fn test_equal_groups_not_significant() {
        let precips = [5.0, 0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0];
        let trend = detect_trend(&window_from(&precips));
        assert!(!trend.is_significant);
        assert_eq!(trend.difference, 0.0);
    }

    #[test]
    fn test_out_of_order_window_is_sorted() {
        // Rainy years are the newest five but arrive first.
        let mut observations: Vec<_> = (2021..=2025).map(|y| day(y, 22.0, 6.0)).collect();
        observations.extend((2006..=2020).map(|y| day(y, 22.0, 0.0)));
        let window = HistoricalWindow::new(observations, 2006, 2025);
        let trend = detect_trend(&window);
        assert!(trend.is_significant);
        assert_eq!(trend.difference, 100.0);
    }
}
