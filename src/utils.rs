use chrono::{Datelike, NaiveDate};

/// Average length of a calendar month in days. Every days-to-months
/// conversion in the crate goes through this constant.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Division that never produces `Infinity` or `NaN`: a zero or non-finite
/// denominator (or a non-finite numerator) yields 0.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Returns 0 for fewer than two values.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// The "YYYY-MM" bucket key used by every monthly aggregation.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Growth rate between two period totals, in percent. A zero previous period
/// yields 0 rather than an infinite rate.
pub fn growth_rate(previous: f64, current: f64) -> f64 {
    safe_div(current - previous, previous) * 100.0
}
