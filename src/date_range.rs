use crate::schema::Transaction;
use crate::utils::DAYS_PER_MONTH;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The observed time span of a transaction set.
///
/// `days` is floored at 1 whenever at least one dated transaction exists, so
/// same-day transaction sets never trigger division-by-zero in the per-day
/// averages computed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeSummary {
    pub days: f64,
    pub months: f64,
    pub years: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeSummary {
    pub fn empty() -> Self {
        Self {
            days: 0.0,
            months: 0.0,
            years: 0.0,
            start: None,
            end: None,
        }
    }
}

pub fn observed_range(transactions: &[Transaction]) -> DateRangeSummary {
    let mut dates = transactions.iter().map(|t| t.date);

    let Some(first) = dates.next() else {
        return DateRangeSummary::empty();
    };

    let (start, end) = dates.fold((first, first), |(min, max), d| (min.min(d), max.max(d)));

    let days = ((end - start).num_days() as f64).max(1.0);
    let months = days / DAYS_PER_MONTH;

    DateRangeSummary {
        days,
        months,
        years: months / 12.0,
        start: Some(start),
        end: Some(end),
    }
}
