use crate::schema::{Transaction, TransactionKind, UNCATEGORIZED};
use crate::utils::{safe_div, DAYS_PER_MONTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category rollup produced by [`group_by_category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub total: f64,
    pub count: usize,
    pub transaction_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category: String,
    pub total: f64,
    pub count: usize,
    pub share_percent: f64,
}

/// Projected effect of trimming discretionary spending by a flat percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPotential {
    pub reduction_percent: f64,
    pub current_expense: f64,
    pub reduced_expense: f64,
    pub monthly_savings_gain: f64,
    pub current_savings_rate: f64,
    pub projected_savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetComparison {
    pub category: String,
    pub budget: f64,
    pub actual: f64,
    pub utilization_percent: f64,
    pub over_budget: bool,
}

/// Sum of income amounts. Transfers between the user's own accounts are not
/// income and are excluded.
pub fn total_income(transactions: &[Transaction]) -> f64 {
    sum_of_kind(transactions, TransactionKind::Income)
}

/// Sum of expense amounts. Transfers are excluded.
pub fn total_expense(transactions: &[Transaction]) -> f64 {
    sum_of_kind(transactions, TransactionKind::Expense)
}

fn sum_of_kind(transactions: &[Transaction], kind: TransactionKind) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.sanitized_amount())
        .sum()
}

pub fn savings(income: f64, expense: f64) -> f64 {
    income - expense
}

/// Savings as a percentage of income. Zero income yields 0, never a NaN.
pub fn savings_rate(income: f64, expense: f64) -> f64 {
    safe_div(income - expense, income) * 100.0
}

pub fn percentage(part: f64, total: f64) -> f64 {
    safe_div(part, total) * 100.0
}

pub fn daily_average(total: f64, days: f64) -> f64 {
    safe_div(total, days)
}

pub fn monthly_average(total: f64, days: f64) -> f64 {
    safe_div(total, days) * DAYS_PER_MONTH
}

pub fn average_per_transaction(total: f64, count: usize) -> f64 {
    safe_div(total, count as f64)
}

/// Groups all transactions by category. A missing (empty) category is folded
/// into "Uncategorized".
pub fn group_by_category(transactions: &[Transaction]) -> BTreeMap<String, CategoryGroup> {
    let mut groups: BTreeMap<String, CategoryGroup> = BTreeMap::new();

    for tx in transactions {
        let key = if tx.category.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            tx.category.clone()
        };

        let group = groups.entry(key).or_insert_with(|| CategoryGroup {
            total: 0.0,
            count: 0,
            transaction_ids: Vec::new(),
        });
        group.total += tx.sanitized_amount();
        group.count += 1;
        group.transaction_ids.push(tx.id);
    }

    groups
}

/// Groups all transactions by account name.
pub fn group_by_account(transactions: &[Transaction]) -> BTreeMap<String, CategoryGroup> {
    let mut groups: BTreeMap<String, CategoryGroup> = BTreeMap::new();

    for tx in transactions {
        let group = groups
            .entry(tx.account.clone())
            .or_insert_with(|| CategoryGroup {
                total: 0.0,
                count: 0,
                transaction_ids: Vec::new(),
            });
        group.total += tx.sanitized_amount();
        group.count += 1;
        group.transaction_ids.push(tx.id);
    }

    groups
}

/// The largest expense categories, sorted descending by total and truncated
/// to `limit`. `share_percent` is each category's share of total expense.
pub fn top_categories(transactions: &[Transaction], limit: usize) -> Vec<TopCategory> {
    let expenses: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .cloned()
        .collect();

    let overall = total_expense(&expenses);
    let mut ranked: Vec<TopCategory> = group_by_category(&expenses)
        .into_iter()
        .map(|(category, group)| TopCategory {
            category,
            total: group.total,
            count: group.count,
            share_percent: percentage(group.total, overall),
        })
        .collect();

    ranked.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// What the savings picture would look like if expenses were reduced by a
/// flat percentage. The reduction percent is clamped to [0, 100].
pub fn savings_potential(
    transactions: &[Transaction],
    reduction_percent: f64,
    observed_days: f64,
) -> SavingsPotential {
    let reduction = reduction_percent.clamp(0.0, 100.0);
    let income = total_income(transactions);
    let expense = total_expense(transactions);
    let reduced_expense = expense * (1.0 - reduction / 100.0);
    let gain = expense - reduced_expense;

    SavingsPotential {
        reduction_percent: reduction,
        current_expense: expense,
        reduced_expense,
        monthly_savings_gain: monthly_average(gain, observed_days),
        current_savings_rate: savings_rate(income, expense),
        projected_savings_rate: savings_rate(income, reduced_expense),
    }
}

/// Compares actual expense totals against a per-category budget map. Only
/// budgeted categories are reported; categories with no spend show zero
/// utilization.
pub fn compare_budgets(
    transactions: &[Transaction],
    budgets: &BTreeMap<String, f64>,
) -> Vec<BudgetComparison> {
    let expenses: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .cloned()
        .collect();
    let actuals = group_by_category(&expenses);

    budgets
        .iter()
        .map(|(category, &budget)| {
            let actual = actuals.get(category).map(|g| g.total).unwrap_or(0.0);
            BudgetComparison {
                category: category.clone(),
                budget,
                actual,
                utilization_percent: percentage(actual, budget),
                over_budget: actual > budget,
            }
        })
        .collect()
}
