//! Shared numeric helpers.
//!
//! All integer outputs of the engine use half-up rounding (`floor(x + 0.5)`),
//! so `-2.5` rounds to `-2` rather than `-3` as `f64::round` would do.

/// Round to the nearest integer, ties toward positive infinity.
pub(crate) fn round_half_up(v: f64) -> i32 {
    if !v.is_finite() {
        tracing::warn!("round_half_up received non-finite value {}, defaulting to 0", v);
        return 0;
    }
    (v + 0.5).floor() as i32
}

/// Round to one decimal place with the same tie rule as `round_half_up`.
pub(crate) fn round_1dp(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    ((v * 10.0) + 0.5).floor() / 10.0
}

/// Arithmetic mean; `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Share of `count` over `total` as a rounded percentage.
pub(crate) fn percentage(count: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    round_half_up(100.0 * count as f64 / total as f64)
}
