use crate::error::{LedgerInsightsError, Result};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::{growth_rate, mean, month_key, safe_div};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// How many of the most recent month-over-month growth rates feed the
    /// trend classification.
    pub recent_months: usize,
    /// Average growth above this percent classifies as increasing; below the
    /// negation, decreasing.
    pub trend_threshold_percent: f64,
    /// Weekend per-day average must exceed this multiple of the weekday
    /// per-day average to flag a weekend spike.
    pub weekend_spike_factor: f64,
    /// Half-over-half growth beyond this percent classifies a category as
    /// increasing or decreasing.
    pub category_threshold_percent: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_months: 6,
            trend_threshold_percent: 5.0,
            weekend_spike_factor: 1.5,
            category_threshold_percent: 10.0,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.recent_months == 0 {
            return Err(LedgerInsightsError::InvalidTrendConfig(
                "recent_months must be at least 1".to_string(),
            ));
        }
        if !self.trend_threshold_percent.is_finite() || self.trend_threshold_percent < 0.0 {
            return Err(LedgerInsightsError::InvalidTrendConfig(format!(
                "trend_threshold_percent must be non-negative, got {}",
                self.trend_threshold_percent
            )));
        }
        if !self.category_threshold_percent.is_finite() || self.category_threshold_percent < 0.0 {
            return Err(LedgerInsightsError::InvalidTrendConfig(format!(
                "category_threshold_percent must be non-negative, got {}",
                self.category_threshold_percent
            )));
        }
        if !self.weekend_spike_factor.is_finite() || self.weekend_spike_factor <= 0.0 {
            return Err(LedgerInsightsError::InvalidTrendConfig(format!(
                "weekend_spike_factor must be positive, got {}",
                self.weekend_spike_factor
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpend {
    pub month: String,
    pub total: f64,
    /// Growth versus the previous month, percent. Zero for the first month
    /// and when the previous month had no spend.
    pub growth_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingTrend {
    pub monthly: Vec<MonthlySpend>,
    pub average_growth_percent: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayProfile {
    /// Per-distinct-day average spend, Monday first.
    pub per_day_average: [f64; 7],
    pub weekend_per_day_average: f64,
    pub weekday_per_day_average: f64,
    pub weekend_spike: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub category: String,
    pub first_half_total: f64,
    pub second_half_total: f64,
    pub growth_percent: f64,
    pub direction: TrendDirection,
}

fn expense_iter(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
}

/// Month-over-month expense comparison: calendar-month buckets, growth rates
/// between consecutive months, and a trend classified from the average of
/// the most recent rates.
pub fn month_over_month(transactions: &[Transaction], config: &TrendConfig) -> SpendingTrend {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for tx in expense_iter(transactions) {
        *buckets.entry(month_key(tx.date)).or_insert(0.0) += tx.sanitized_amount();
    }

    // "YYYY-MM" keys sort chronologically.
    let mut monthly = Vec::with_capacity(buckets.len());
    let mut previous: Option<f64> = None;
    for (month, total) in buckets {
        let growth_percent = match previous {
            Some(prev) => growth_rate(prev, total),
            None => 0.0,
        };
        previous = Some(total);
        monthly.push(MonthlySpend {
            month,
            total,
            growth_percent,
        });
    }

    let rates: Vec<f64> = monthly
        .iter()
        .skip(1)
        .map(|m| m.growth_percent)
        .collect();
    let recent_start = rates.len().saturating_sub(config.recent_months);
    let average_growth_percent = mean(&rates[recent_start..]);

    let direction = if average_growth_percent > config.trend_threshold_percent {
        TrendDirection::Increasing
    } else if average_growth_percent < -config.trend_threshold_percent {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    SpendingTrend {
        monthly,
        average_growth_percent,
        direction,
    }
}

/// Day-of-week spending profile using per-distinct-day averages: each
/// bucket's total is divided by the number of distinct calendar dates seen
/// on that weekday, so a weekday with many small transactions is not
/// penalized against one with a single large transaction.
pub fn weekday_profile(transactions: &[Transaction], config: &TrendConfig) -> WeekdayProfile {
    let mut totals = [0.0_f64; 7];
    let mut distinct_dates: [BTreeSet<chrono::NaiveDate>; 7] = Default::default();

    for tx in expense_iter(transactions) {
        let idx = tx.date.weekday().num_days_from_monday() as usize;
        totals[idx] += tx.sanitized_amount();
        distinct_dates[idx].insert(tx.date);
    }

    let mut per_day_average = [0.0_f64; 7];
    for i in 0..7 {
        per_day_average[i] = safe_div(totals[i], distinct_dates[i].len() as f64);
    }

    // Saturday and Sunday are indices 5 and 6.
    let weekend_total: f64 = totals[5] + totals[6];
    let weekend_days = distinct_dates[5].len() + distinct_dates[6].len();
    let weekday_total: f64 = totals[..5].iter().sum();
    let weekday_days: usize = distinct_dates[..5].iter().map(|s| s.len()).sum();

    let weekend_per_day_average = safe_div(weekend_total, weekend_days as f64);
    let weekday_per_day_average = safe_div(weekday_total, weekday_days as f64);
    let weekend_spike = weekday_per_day_average > 0.0
        && weekend_per_day_average > config.weekend_spike_factor * weekday_per_day_average;

    WeekdayProfile {
        per_day_average,
        weekend_per_day_average,
        weekday_per_day_average,
        weekend_spike,
    }
}

/// Expense totals bucketed by day of month (index 0 = the 1st), for
/// visualizing intra-month cadence such as rent or salary-day spending.
pub fn day_of_month_profile(transactions: &[Transaction]) -> [f64; 31] {
    let mut buckets = [0.0_f64; 31];
    for tx in expense_iter(transactions) {
        buckets[tx.date.day0() as usize] += tx.sanitized_amount();
    }
    buckets
}

/// Per-category direction of travel: each category's date range is split at
/// its midpoint and the two halves compared.
pub fn category_trends(transactions: &[Transaction], config: &TrendConfig) -> Vec<CategoryTrend> {
    let mut by_category: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for tx in expense_iter(transactions) {
        by_category.entry(tx.category.as_str()).or_default().push(tx);
    }

    by_category
        .into_iter()
        .filter(|(_, txs)| txs.len() >= 2)
        .map(|(category, txs)| {
            let start = txs.iter().map(|t| t.date).min().unwrap_or_default();
            let end = txs.iter().map(|t| t.date).max().unwrap_or_default();
            let midpoint = start + (end - start) / 2;

            let mut first_half_total = 0.0;
            let mut second_half_total = 0.0;
            for tx in &txs {
                if tx.date <= midpoint {
                    first_half_total += tx.sanitized_amount();
                } else {
                    second_half_total += tx.sanitized_amount();
                }
            }

            let growth_percent = growth_rate(first_half_total, second_half_total);
            let direction = if growth_percent > config.category_threshold_percent {
                TrendDirection::Increasing
            } else if growth_percent < -config.category_threshold_percent {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            };

            CategoryTrend {
                category: category.to_string(),
                first_half_total,
                second_half_total,
                growth_percent,
                direction,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expense(id: u64, date: NaiveDate, amount: f64, category: &str) -> Transaction {
        Transaction {
            id,
            date,
            time: None,
            amount,
            kind: TransactionKind::Expense,
            category: category.to_string(),
            subcategory: None,
            account: "Checking".to_string(),
            note: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_over_month_growth() {
        let txs = vec![
            expense(1, date(2024, 1, 10), 1000.0, "Misc"),
            expense(2, date(2024, 2, 10), 1100.0, "Misc"),
            expense(3, date(2024, 3, 10), 1210.0, "Misc"),
        ];
        let trend = month_over_month(&txs, &TrendConfig::default());
        assert_eq!(trend.monthly.len(), 3);
        assert_eq!(trend.monthly[0].growth_percent, 0.0);
        assert!((trend.monthly[1].growth_percent - 10.0).abs() < 1e-10);
        assert!((trend.monthly[2].growth_percent - 10.0).abs() < 1e-10);
        assert!((trend.average_growth_percent - 10.0).abs() < 1e-10);
        assert_eq!(trend.direction, TrendDirection::Increasing);
    }

    #[test]
    fn test_zero_previous_month_guarded() {
        let txs = vec![
            expense(1, date(2024, 1, 10), 0.0, "Misc"),
            expense(2, date(2024, 2, 10), 500.0, "Misc"),
        ];
        let trend = month_over_month(&txs, &TrendConfig::default());
        assert_eq!(trend.monthly[1].growth_percent, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_stable_within_threshold() {
        let txs = vec![
            expense(1, date(2024, 1, 10), 1000.0, "Misc"),
            expense(2, date(2024, 2, 10), 1020.0, "Misc"),
            expense(3, date(2024, 3, 10), 1000.0, "Misc"),
        ];
        let trend = month_over_month(&txs, &TrendConfig::default());
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_weekday_profile_uses_distinct_days() {
        // 2024-01-06 and 2024-01-13 are Saturdays; 2024-01-08 is a Monday.
        // Five small Monday purchases on one date must average as one day.
        let mut txs = vec![
            expense(1, date(2024, 1, 6), 300.0, "Fun"),
            expense(2, date(2024, 1, 13), 300.0, "Fun"),
        ];
        for i in 0..5 {
            txs.push(expense(10 + i, date(2024, 1, 8), 20.0, "Coffee"));
        }

        let profile = weekday_profile(&txs, &TrendConfig::default());
        assert!((profile.weekend_per_day_average - 300.0).abs() < 1e-10);
        assert!((profile.weekday_per_day_average - 100.0).abs() < 1e-10);
        assert!(profile.weekend_spike, "300 > 1.5 x 100 should flag a spike");
        assert!((profile.per_day_average[0] - 100.0).abs() < 1e-10);
        assert!((profile.per_day_average[5] - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_day_of_month_profile() {
        let txs = vec![
            expense(1, date(2024, 1, 1), 900.0, "Rent"),
            expense(2, date(2024, 2, 1), 900.0, "Rent"),
            expense(3, date(2024, 1, 15), 75.0, "Food"),
        ];
        let profile = day_of_month_profile(&txs);
        assert_eq!(profile[0], 1800.0);
        assert_eq!(profile[14], 75.0);
        assert_eq!(profile[30], 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrendConfig::default().validate().is_ok());
        assert!(TrendConfig {
            recent_months: 0,
            ..TrendConfig::default()
        }
        .validate()
        .is_err());
        assert!(TrendConfig {
            weekend_spike_factor: 0.0,
            ..TrendConfig::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_category_trends_split_at_midpoint() {
        let txs = vec![
            expense(1, date(2024, 1, 1), 100.0, "Dining"),
            expense(2, date(2024, 1, 10), 100.0, "Dining"),
            expense(3, date(2024, 2, 20), 300.0, "Dining"),
            expense(4, date(2024, 3, 1), 300.0, "Dining"),
            expense(5, date(2024, 1, 5), 50.0, "OneOff"),
        ];
        let trends = category_trends(&txs, &TrendConfig::default());
        // OneOff has a single transaction and is skipped.
        assert_eq!(trends.len(), 1);

        let dining = &trends[0];
        assert_eq!(dining.category, "Dining");
        assert_eq!(dining.first_half_total, 200.0);
        assert_eq!(dining.second_half_total, 600.0);
        assert_eq!(dining.direction, TrendDirection::Increasing);
    }
}
