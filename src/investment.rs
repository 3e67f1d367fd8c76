use crate::utils::{month_key, safe_div};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum InvestmentAction {
    #[schemars(description = "Capital deployed into a holding. Does not affect realized P&L.")]
    Buy,

    #[schemars(description = "Capital withdrawn from a holding. Does not affect realized P&L.")]
    Sell,

    #[schemars(description = "Dividend or payout received; adds to realized P&L")]
    Dividend,

    #[schemars(description = "Brokerage or fee charged; subtracts from realized P&L")]
    Brokerage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InvestmentTransaction {
    pub date: NaiveDate,
    pub action: InvestmentAction,

    #[schemars(description = "Non-negative magnitude; direction comes from `action`")]
    pub amount: f64,

    #[schemars(description = "Optional holding/instrument name")]
    pub holding: Option<String>,
}

impl InvestmentTransaction {
    fn sanitized_amount(&self) -> f64 {
        if self.amount.is_finite() && self.amount >= 0.0 {
            self.amount
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPnl {
    pub month: String,
    pub amount: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    pub total_profit: f64,
    pub total_loss: f64,
    pub net_pnl: f64,
    pub profit_months: usize,
    pub loss_months: usize,
    pub average_monthly_return: f64,
}

/// Realized P&L per calendar month with a running cumulative sum. Only
/// dividends (added) and brokerage (subtracted) move realized P&L; buys and
/// sells shift capital between cash and holdings without realizing anything.
pub fn monthly_pnl(transactions: &[InvestmentTransaction]) -> Vec<MonthlyPnl> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();

    for tx in transactions {
        let delta = match tx.action {
            InvestmentAction::Dividend => tx.sanitized_amount(),
            InvestmentAction::Brokerage => -tx.sanitized_amount(),
            InvestmentAction::Buy | InvestmentAction::Sell => continue,
        };
        *buckets.entry(month_key(tx.date)).or_insert(0.0) += delta;
    }

    let mut cumulative = 0.0;
    buckets
        .into_iter()
        .map(|(month, amount)| {
            cumulative += amount;
            MonthlyPnl {
                month,
                amount,
                cumulative,
            }
        })
        .collect()
}

pub fn pnl_summary(monthly: &[MonthlyPnl]) -> PnlSummary {
    let total_profit: f64 = monthly.iter().filter(|m| m.amount > 0.0).map(|m| m.amount).sum();
    let total_loss: f64 = monthly
        .iter()
        .filter(|m| m.amount < 0.0)
        .map(|m| m.amount.abs())
        .sum();
    let profit_months = monthly.iter().filter(|m| m.amount > 0.0).count();
    let loss_months = monthly.iter().filter(|m| m.amount < 0.0).count();
    let net: f64 = monthly.iter().map(|m| m.amount).sum();

    PnlSummary {
        total_profit,
        total_loss,
        net_pnl: total_profit - total_loss,
        profit_months,
        loss_months,
        average_monthly_return: safe_div(net, monthly.len() as f64),
    }
}

/// Percentage return of a position. Zero invested capital yields 0.
pub fn return_percentage(invested: f64, current_value: f64) -> f64 {
    safe_div(current_value - invested, invested) * 100.0
}
