use crate::error::{LedgerInsightsError, Result};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::{mean, population_stddev, safe_div};
use serde::{Deserialize, Serialize};

/// Minimum number of expense transactions before outlier flagging is
/// meaningful. A sample of one or two has no usable variance.
const MIN_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Number of standard deviations above the mean before an expense is
    /// flagged.
    pub sensitivity: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { sensitivity: 2.0 }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(LedgerInsightsError::InvalidSensitivity(self.sensitivity));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// An expense flagged as a statistical outlier, annotated with how far it
/// sits from the sample mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub transaction: Transaction,
    /// Distance from the mean in standard deviations.
    pub deviation: f64,
    pub severity: Severity,
    pub message: String,
}

/// Flags expenses whose amount exceeds `mean + sensitivity × stddev` over
/// the population of expense amounts. Results are sorted by amount,
/// largest first. Fewer than three expenses, or a zero-variance sample,
/// produce no flags.
pub fn detect_anomalies(transactions: &[Transaction], config: &AnomalyConfig) -> Vec<Anomaly> {
    let expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .collect();

    if expenses.len() < MIN_SAMPLE_SIZE {
        return Vec::new();
    }

    let amounts: Vec<f64> = expenses.iter().map(|t| t.sanitized_amount()).collect();
    let avg = mean(&amounts);
    let sd = population_stddev(&amounts);
    if sd == 0.0 {
        return Vec::new();
    }

    let threshold = avg + config.sensitivity * sd;

    let mut flagged: Vec<Anomaly> = expenses
        .into_iter()
        .filter(|t| t.sanitized_amount() > threshold)
        .map(|t| {
            let amount = t.sanitized_amount();
            let deviation = (amount - avg) / sd;
            let severity = if amount > avg + 3.0 * sd {
                Severity::High
            } else if amount > avg + 2.0 * sd {
                Severity::Medium
            } else {
                Severity::Low
            };
            let percent_above = safe_div(amount - avg, avg) * 100.0;

            Anomaly {
                transaction: t.clone(),
                deviation,
                severity,
                message: format!(
                    "{:.0}% above your average expense of {:.2}",
                    percent_above, avg
                ),
            }
        })
        .collect();

    flagged.sort_by(|a, b| {
        b.transaction
            .sanitized_amount()
            .partial_cmp(&a.transaction.sanitized_amount())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    flagged
}
