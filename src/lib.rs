//! # Ledger Insights
//!
//! A library for turning a personal transaction ledger into derived
//! analytics: aggregates, recurring-payment detection, statistical anomaly
//! flagging, spending trends, tax projection, investment P&L, a composite
//! financial-health score, and a cash-flow forecast.
//!
//! ## Core Concepts
//!
//! - **Ledger**: the raw input, a flat list of dated transactions
//! - **Pure analysis**: every operation is a function of the ledger plus an
//!   explicit `today`; nothing reads the system clock
//! - **Graceful degradation**: malformed amounts and sparse data collapse to
//!   zeros or empty results, never to errors. Errors are reserved for
//!   invalid configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_insights::*;
//! use chrono::NaiveDate;
//!
//! let ledger = Ledger {
//!     owner_name: "Asha".to_string(),
//!     transactions: vec![/* ... */],
//! };
//!
//! let today = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
//! let report = analyze_ledger(&ledger, &AnalyzerOptions::default(), today).unwrap();
//! println!("health grade: {}", report.health.grade);
//! ```

pub mod aggregate;
pub mod anomaly;
pub mod date_range;
pub mod error;
pub mod forecast;
pub mod health;
pub mod investment;
pub mod recurring;
pub mod schema;
pub mod tagged;
pub mod tax;
pub mod trends;
pub mod utils;

pub use aggregate::{
    compare_budgets, group_by_account, group_by_category, savings_potential, top_categories,
    BudgetComparison, CategoryGroup, SavingsPotential, TopCategory,
};
pub use anomaly::{detect_anomalies, Anomaly, AnomalyConfig, Severity};
pub use date_range::{observed_range, DateRangeSummary};
pub use error::{LedgerInsightsError, Result};
pub use forecast::{forecast_cash_flow, CashFlowForecast, ForecastConfig};
pub use health::{compose_health_score, HealthInputs, HealthScore};
pub use investment::{
    monthly_pnl, pnl_summary, return_percentage, InvestmentAction, InvestmentTransaction,
    MonthlyPnl, PnlSummary,
};
pub use recurring::{detect_recurring, Frequency, RecurringConfig, RecurringPattern};
pub use schema::*;
pub use tagged::{cashback_summary, reimbursement_summary, TaggedIncomeSummary};
pub use tax::{project_tax, tax_for_income, TaxInputs, TaxProjection, TaxRegime, TaxSlab};
pub use trends::{
    category_trends, day_of_month_profile, month_over_month, weekday_profile, CategoryTrend,
    SpendingTrend, TrendConfig, TrendDirection, WeekdayProfile,
};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunables for a full analysis run. The defaults match the standalone
/// defaults of each module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    pub recurring: RecurringConfig,
    pub anomaly: AnomalyConfig,
    pub trends: TrendConfig,
    pub forecast: ForecastConfig,
    pub tax_inputs: TaxInputs,
    pub tax_regime: TaxRegime,
    /// Current balance per account, used for the emergency-fund metric.
    pub account_balances: BTreeMap<String, f64>,
    /// How many categories the top-spending list keeps.
    pub top_category_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_income: f64,
    pub total_expense: f64,
    pub savings: f64,
    pub savings_rate: f64,
}

/// Everything the analyzer derives from one ledger in a single pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub owner_name: String,
    pub range: DateRangeSummary,
    pub totals: LedgerTotals,
    pub by_category: BTreeMap<String, CategoryGroup>,
    pub top_categories: Vec<TopCategory>,
    pub cashback: TaggedIncomeSummary,
    pub reimbursements: TaggedIncomeSummary,
    pub recurring: Vec<RecurringPattern>,
    pub anomalies: Vec<Anomaly>,
    pub spending_trend: SpendingTrend,
    pub weekday_profile: WeekdayProfile,
    pub category_trends: Vec<CategoryTrend>,
    /// `None` outside a projectable window (fiscal March, or no recent
    /// salary credits).
    pub tax_projection: Option<TaxProjection>,
    pub health: HealthScore,
    /// `None` with fewer than two observed months.
    pub forecast: Option<CashFlowForecast>,
}

impl AnalyticsReport {
    /// The full report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct LedgerAnalyzer;

impl LedgerAnalyzer {
    /// Runs every analysis over the ledger as of `today`. Fails only on
    /// invalid configuration.
    pub fn analyze(
        ledger: &Ledger,
        options: &AnalyzerOptions,
        today: NaiveDate,
    ) -> Result<AnalyticsReport> {
        options.recurring.validate()?;
        options.anomaly.validate()?;
        options.trends.validate()?;
        options.forecast.validate()?;
        options.tax_regime.validate()?;

        info!(
            "Analyzing ledger for {}: {} transactions",
            ledger.owner_name,
            ledger.transactions.len()
        );

        let transactions = &ledger.transactions;
        let range = observed_range(transactions);
        debug!(
            "Observed range spans {} days ({:.1} months)",
            range.days, range.months
        );

        let total_income = aggregate::total_income(transactions);
        let total_expense = aggregate::total_expense(transactions);
        let totals = LedgerTotals {
            total_income,
            total_expense,
            savings: aggregate::savings(total_income, total_expense),
            savings_rate: aggregate::savings_rate(total_income, total_expense),
        };

        let limit = if options.top_category_limit == 0 {
            5
        } else {
            options.top_category_limit
        };

        let recurring = detect_recurring(transactions, &options.recurring, today);
        let anomalies = detect_anomalies(transactions, &options.anomaly);
        debug!(
            "Found {} recurring patterns and {} anomalies",
            recurring.len(),
            anomalies.len()
        );

        let health_inputs = HealthInputs::from_transactions(transactions, &options.account_balances);

        Ok(AnalyticsReport {
            owner_name: ledger.owner_name.clone(),
            range,
            totals,
            by_category: group_by_category(transactions),
            top_categories: top_categories(transactions, limit),
            cashback: cashback_summary(transactions),
            reimbursements: reimbursement_summary(transactions),
            recurring,
            anomalies,
            spending_trend: month_over_month(transactions, &options.trends),
            weekday_profile: weekday_profile(transactions, &options.trends),
            category_trends: category_trends(transactions, &options.trends),
            tax_projection: project_tax(
                transactions,
                &options.tax_inputs,
                &options.tax_regime,
                today,
            ),
            health: compose_health_score(&health_inputs),
            forecast: forecast_cash_flow(transactions, &options.forecast),
        })
    }
}

pub fn analyze_ledger(
    ledger: &Ledger,
    options: &AnalyzerOptions,
    today: NaiveDate,
) -> Result<AnalyticsReport> {
    LedgerAnalyzer::analyze(ledger, options, today)
}
