use crate::error::{LedgerInsightsError, Result};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::{mean, population_stddev, safe_div, DAYS_PER_MONTH};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunables for recurring-payment detection. The defaults absorb
/// weekday/weekend billing drift and minor price variation while rejecting
/// irregular clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringConfig {
    /// Amounts below this are immaterial and never grouped.
    pub min_amount: f64,
    /// Amounts are rounded to the nearest multiple of this when grouping, so
    /// a bill drifting by a few units stays in one series.
    pub amount_bucket: f64,
    /// Maximum coefficient of variation (stddev / mean) of the intervals for
    /// a group to count as recurring.
    pub max_interval_cv: f64,
    /// A pattern is active while `today - last_occurrence` is under this
    /// multiple of the mean interval.
    pub active_window_factor: f64,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            min_amount: 10.0,
            amount_bucket: 10.0,
            max_interval_cv: 0.2,
            active_window_factor: 2.0,
        }
    }
}

impl RecurringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_amount.is_finite() || self.min_amount < 0.0 {
            return Err(LedgerInsightsError::InvalidRecurringConfig(format!(
                "min_amount must be non-negative, got {}",
                self.min_amount
            )));
        }
        if !self.amount_bucket.is_finite() || self.amount_bucket <= 0.0 {
            return Err(LedgerInsightsError::InvalidRecurringConfig(format!(
                "amount_bucket must be positive, got {}",
                self.amount_bucket
            )));
        }
        if !self.max_interval_cv.is_finite() || self.max_interval_cv <= 0.0 {
            return Err(LedgerInsightsError::InvalidRecurringConfig(format!(
                "max_interval_cv must be positive, got {}",
                self.max_interval_cv
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Weekly,
    BiWeekly,
    Monthly,
    BiMonthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Frequency {
    /// Maps a mean inter-occurrence interval to a frequency label via
    /// inclusive day-range buckets. Intervals outside every bucket are
    /// irregular and not recurring.
    pub fn from_mean_interval(days: f64) -> Option<Self> {
        match days {
            d if (6.0..=8.0).contains(&d) => Some(Self::Weekly),
            d if (13.0..=16.0).contains(&d) => Some(Self::BiWeekly),
            d if (27.0..=33.0).contains(&d) => Some(Self::Monthly),
            d if (60.0..=70.0).contains(&d) => Some(Self::BiMonthly),
            d if (85.0..=95.0).contains(&d) => Some(Self::Quarterly),
            d if (175.0..=185.0).contains(&d) => Some(Self::SemiAnnual),
            d if (360.0..=370.0).contains(&d) => Some(Self::Annual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub description: String,
    pub category: String,
    pub kind: TransactionKind,
    pub average_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub frequency: Frequency,
    pub interval_days: f64,
    pub occurrence_count: usize,
    pub consistency_percent: f64,
    pub is_active: bool,
    pub first_occurrence: NaiveDate,
    pub last_occurrence: NaiveDate,
    pub next_expected: NaiveDate,
    pub monthly_equivalent: f64,
}

/// Detects recurring expense obligations: groups outgoing transactions by
/// description, kind and rounded amount, then keeps the groups whose
/// inter-occurrence intervals are statistically consistent. Results are
/// sorted by monthly-equivalent cost, largest first.
pub fn detect_recurring(
    transactions: &[Transaction],
    config: &RecurringConfig,
    today: NaiveDate,
) -> Vec<RecurringPattern> {
    let mut groups: BTreeMap<(String, TransactionKind, i64), Vec<&Transaction>> = BTreeMap::new();

    for tx in transactions {
        // Recurring *obligations* only: money coming in is out of scope.
        if matches!(tx.kind, TransactionKind::Income | TransactionKind::TransferIn) {
            continue;
        }
        let amount = tx.sanitized_amount();
        if amount < config.min_amount {
            continue;
        }

        let bucket = (amount / config.amount_bucket).round() as i64;
        let key = (tx.grouping_label().to_lowercase(), tx.kind, bucket);
        groups.entry(key).or_default().push(tx);
    }

    let mut patterns: Vec<RecurringPattern> = groups
        .into_values()
        .filter_map(|group| analyze_group(group, config, today))
        .collect();

    patterns.sort_by(|a, b| {
        b.monthly_equivalent
            .partial_cmp(&a.monthly_equivalent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    patterns
}

fn analyze_group(
    mut group: Vec<&Transaction>,
    config: &RecurringConfig,
    today: NaiveDate,
) -> Option<RecurringPattern> {
    if group.len() < 2 {
        return None;
    }

    group.sort_by_key(|t| (t.date, t.id));

    let intervals: Vec<f64> = group
        .windows(2)
        .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
        .collect();

    let mean_interval = mean(&intervals);
    if mean_interval <= 0.0 {
        return None;
    }

    let interval_sd = population_stddev(&intervals);
    // A single interval has no variance to judge; otherwise require a low
    // coefficient of variation.
    if intervals.len() > 1 && interval_sd >= config.max_interval_cv * mean_interval {
        return None;
    }

    let frequency = Frequency::from_mean_interval(mean_interval)?;

    let amounts: Vec<f64> = group.iter().map(|t| t.sanitized_amount()).collect();
    let average_amount = mean(&amounts);
    let min_amount = amounts.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_amount = amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let first = group.first()?.date;
    let last = group.last()?.date;
    let next_expected = last + Duration::days(mean_interval.round() as i64);
    let is_active =
        ((today - last).num_days() as f64) < config.active_window_factor * mean_interval;

    let consistency_percent = if intervals.len() == 1 {
        100.0
    } else {
        (1.0 - safe_div(interval_sd, mean_interval)) * 100.0
    };

    let representative = group[0];

    Some(RecurringPattern {
        description: representative.grouping_label().to_string(),
        category: representative.category.clone(),
        kind: representative.kind,
        average_amount,
        min_amount,
        max_amount,
        frequency,
        interval_days: mean_interval,
        occurrence_count: group.len(),
        consistency_percent,
        is_active,
        first_occurrence: first,
        last_occurrence: last,
        next_expected,
        monthly_equivalent: safe_div(average_amount, mean_interval) * DAYS_PER_MONTH,
    })
}
