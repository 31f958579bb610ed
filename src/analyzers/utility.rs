//! Descriptive statistics over `f64` samples.
//!
//! Standard deviations, skewness and kurtosis are population (biased)
//! estimators throughout.

use std::cmp::Ordering;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Median, averaging the two middle values for even-length input.
/// Returns 0.0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn central_moment(values: &[f64], mean: f64, order: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(order)).sum::<f64>() / values.len() as f64
}

/// Fisher-Pearson coefficient of skewness. `None` for empty or constant input.
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 == 0.0 {
        return None;
    }
    Some(central_moment(values, m, 3) / m2.powf(1.5))
}

/// Excess kurtosis (normal = 0). `None` for empty or constant input.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 == 0.0 {
        return None;
    }
    Some(central_moment(values, m, 4) / (m2 * m2) - 3.0)
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

/// Percentage of `part` in `total`, one decimal. 0.0 when `total` is zero.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 1)
}

/// Descending order on floats, total over NaN.
pub fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
