use crate::error::{LedgerInsightsError, Result};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::month_key;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// How many future months to project.
    pub horizon_months: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { horizon_months: 3 }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        if self.horizon_months < 1 {
            return Err(LedgerInsightsError::InvalidForecastHorizon(
                self.horizon_months,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNet {
    pub month: String,
    /// Income minus expense for the month. Transfers are excluded.
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMonth {
    pub month: String,
    pub projected_net: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowForecast {
    pub history: Vec<MonthlyNet>,
    pub projections: Vec<ProjectedMonth>,
    /// Fitted change in monthly net per month.
    pub slope: f64,
    pub intercept: f64,
}

/// Projects future monthly net cash flow by fitting an ordinary
/// least-squares line through the observed months. Returns `None` with
/// fewer than two observed months, where a line is underdetermined.
pub fn forecast_cash_flow(
    transactions: &[Transaction],
    config: &ForecastConfig,
) -> Option<CashFlowForecast> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in transactions {
        let delta = match tx.kind {
            TransactionKind::Income => tx.sanitized_amount(),
            TransactionKind::Expense => -tx.sanitized_amount(),
            TransactionKind::TransferIn | TransactionKind::TransferOut => continue,
        };
        let bucket = tx.date.with_day(1)?;
        *buckets.entry(bucket).or_insert(0.0) += delta;
    }

    if buckets.len() < 2 {
        return None;
    }

    let history: Vec<MonthlyNet> = buckets
        .iter()
        .map(|(date, net)| MonthlyNet {
            month: month_key(*date),
            net: *net,
        })
        .collect();

    let n = history.len() as f64;
    let ys: Vec<f64> = history.iter().map(|m| m.net).collect();
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        covariance += dx * (y - y_mean);
        x_variance += dx * dx;
    }
    // x_variance > 0 whenever there are at least two months.
    let slope = covariance / x_variance;
    let intercept = y_mean - slope * x_mean;

    let last_month = *buckets.keys().next_back()?;
    let projections = (1..=config.horizon_months)
        .filter_map(|step| {
            let date = last_month.checked_add_months(Months::new(step))?;
            let x = (history.len() - 1) as f64 + step as f64;
            Some(ProjectedMonth {
                month: month_key(date),
                projected_net: intercept + slope * x,
            })
        })
        .collect();

    Some(CashFlowForecast {
        history,
        projections,
        slope,
        intercept,
    })
}
