use crate::aggregate::{group_by_category, savings_rate, total_expense, total_income};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::{mean, month_key, population_stddev, safe_div};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the composer needs, pre-aggregated. Build one with
/// [`HealthInputs::from_transactions`] or assemble the fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInputs {
    pub total_income: f64,
    pub total_expense: f64,
    /// Expense total per calendar month, chronological. Feeds the spending
    /// consistency sub-score.
    pub monthly_expenses: Vec<f64>,
    /// Combined liquid balance across the user's accounts.
    pub liquid_balance: f64,
    /// Expense total per category.
    pub category_spending: BTreeMap<String, f64>,
}

impl HealthInputs {
    pub fn from_transactions(
        transactions: &[Transaction],
        account_balances: &BTreeMap<String, f64>,
    ) -> Self {
        let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
        for tx in transactions {
            if tx.kind == TransactionKind::Expense {
                *monthly.entry(month_key(tx.date)).or_insert(0.0) += tx.sanitized_amount();
            }
        }

        let expenses: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .cloned()
            .collect();
        let category_spending = group_by_category(&expenses)
            .into_iter()
            .map(|(category, group)| (category, group.total))
            .collect();

        Self {
            total_income: total_income(transactions),
            total_expense: total_expense(transactions),
            monthly_expenses: monthly.into_values().collect(),
            liquid_balance: account_balances.values().sum(),
            category_spending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    /// Composite 0-100.
    pub score: u32,
    pub grade: String,
    /// Named sub-scores: savings_rate (max 30), spending_consistency (20),
    /// emergency_fund (25), income_expense_ratio (15),
    /// category_concentration (10).
    pub metrics: BTreeMap<String, u32>,
    pub savings_rate: f64,
    pub months_covered: f64,
    pub recommendations: Vec<String>,
}

/// Combines five independently bucketed sub-scores into a single 0-100
/// financial-health score with a letter grade and per-metric
/// recommendations.
pub fn compose_health_score(inputs: &HealthInputs) -> HealthScore {
    let mut metrics = BTreeMap::new();
    let mut recommendations = Vec::new();

    let rate = savings_rate(inputs.total_income, inputs.total_expense);
    let savings_points = match rate {
        r if r >= 20.0 => 30,
        r if r >= 15.0 => 25,
        r if r >= 10.0 => 20,
        r if r >= 5.0 => 10,
        _ => 5,
    };
    metrics.insert("savings_rate".to_string(), savings_points);
    if savings_points < 25 {
        recommendations.push(format!(
            "Savings rate is {:.1}%; aim for 20% of income or more",
            rate
        ));
    }

    let monthly_mean = mean(&inputs.monthly_expenses);
    let variation_percent =
        safe_div(population_stddev(&inputs.monthly_expenses), monthly_mean) * 100.0;
    let consistency_points = match variation_percent {
        v if v <= 15.0 => 20,
        v if v <= 25.0 => 15,
        v if v <= 35.0 => 10,
        _ => 5,
    };
    metrics.insert("spending_consistency".to_string(), consistency_points);
    if consistency_points < 15 {
        recommendations.push(format!(
            "Monthly spending swings by {:.0}%; smoothing it out makes planning easier",
            variation_percent
        ));
    }

    // A user with no expenses on record has nothing to cover.
    let months_covered = safe_div(inputs.liquid_balance, monthly_mean);
    let emergency_points = if monthly_mean == 0.0 && inputs.liquid_balance > 0.0 {
        25
    } else {
        match months_covered {
            m if m >= 6.0 => 25,
            m if m >= 3.0 => 20,
            m if m >= 1.0 => 10,
            _ => 5,
        }
    };
    metrics.insert("emergency_fund".to_string(), emergency_points);
    if emergency_points < 20 {
        recommendations.push(format!(
            "Emergency fund covers {:.1} months of expenses; build toward 6",
            months_covered
        ));
    }

    let ratio = if inputs.total_expense == 0.0 {
        1.0
    } else {
        inputs.total_income / inputs.total_expense
    };
    let ratio_points = match ratio {
        r if r >= 1.5 => 15,
        r if r >= 1.2 => 12,
        r if r >= 1.0 => 8,
        _ => 3,
    };
    metrics.insert("income_expense_ratio".to_string(), ratio_points);
    if ratio_points < 12 {
        recommendations.push(format!(
            "Income is only {:.2}x expenses; widen the gap to build a buffer",
            ratio
        ));
    }

    let largest_category = inputs
        .category_spending
        .values()
        .cloned()
        .fold(0.0_f64, f64::max);
    let concentration_percent = safe_div(largest_category, inputs.total_expense) * 100.0;
    let concentration_points = match concentration_percent {
        c if c <= 30.0 => 10,
        c if c <= 40.0 => 7,
        c if c <= 50.0 => 4,
        _ => 2,
    };
    metrics.insert("category_concentration".to_string(), concentration_points);
    if concentration_points < 7 {
        recommendations.push(format!(
            "A single category takes {:.0}% of spending; check whether it can be trimmed",
            concentration_percent
        ));
    }

    let score = metrics.values().sum::<u32>().min(100);

    HealthScore {
        score,
        grade: grade_for(score).to_string(),
        metrics,
        savings_rate: rate,
        months_covered,
        recommendations,
    }
}

fn grade_for(score: u32) -> &'static str {
    match score {
        s if s >= 90 => "A+",
        s if s >= 85 => "A",
        s if s >= 80 => "A-",
        s if s >= 75 => "B+",
        s if s >= 70 => "B",
        s if s >= 65 => "B-",
        s if s >= 60 => "C+",
        s if s >= 55 => "C",
        s if s >= 50 => "C-",
        _ => "D",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_inputs() -> HealthInputs {
        // Ratio 100/64 = 1.56 and no category above 25% of spend, so every
        // sub-score lands in its top band.
        let mut category_spending = BTreeMap::new();
        category_spending.insert("Rent".to_string(), 16_000.0);
        category_spending.insert("Food".to_string(), 16_000.0);
        category_spending.insert("Transport".to_string(), 16_000.0);
        category_spending.insert("Utilities".to_string(), 16_000.0);

        HealthInputs {
            total_income: 100_000.0,
            total_expense: 64_000.0,
            monthly_expenses: vec![21_000.0, 21_500.0, 21_500.0],
            liquid_balance: 160_000.0,
            category_spending,
        }
    }

    #[test]
    fn test_strong_profile_scores_high() {
        let score = compose_health_score(&strong_inputs());
        // 30 + 20 + 25 + 15 + 10
        assert_eq!(score.score, 100);
        assert_eq!(score.grade, "A+");
        assert!(score.recommendations.is_empty());
        assert_eq!(score.metrics["savings_rate"], 30);
        assert_eq!(score.metrics["emergency_fund"], 25);
    }

    #[test]
    fn test_middling_ratio_drops_a_band() {
        // 100,000 / 72,000 = 1.39, inside the [1.2, 1.5) band.
        let mut inputs = strong_inputs();
        inputs.total_expense = 72_000.0;
        inputs.category_spending.insert("Food".to_string(), 18_000.0);
        inputs.category_spending.insert("Utilities".to_string(), 18_000.0);
        inputs.category_spending.insert("Rent".to_string(), 18_000.0);
        inputs.category_spending.insert("Transport".to_string(), 18_000.0);
        inputs.monthly_expenses = vec![24_000.0, 24_500.0, 23_500.0];

        let score = compose_health_score(&inputs);
        assert_eq!(score.metrics["income_expense_ratio"], 12);
        assert_eq!(score.score, 97);
        assert!(score
            .recommendations
            .iter()
            .any(|r| r.contains("1.39x expenses")));
    }

    #[test]
    fn test_weak_profile_scores_low() {
        let mut category_spending = BTreeMap::new();
        category_spending.insert("Rent".to_string(), 60_000.0);
        category_spending.insert("Other".to_string(), 38_000.0);

        let inputs = HealthInputs {
            total_income: 100_000.0,
            total_expense: 98_000.0,
            monthly_expenses: vec![20_000.0, 48_000.0, 30_000.0],
            liquid_balance: 10_000.0,
            category_spending,
        };
        let score = compose_health_score(&inputs);
        // 5 + 5 + 5 + 8 + 2
        assert_eq!(score.score, 25);
        assert_eq!(score.grade, "D");
        assert_eq!(score.recommendations.len(), 5);
    }

    #[test]
    fn test_zero_expense_ratio_defaults_to_one() {
        let inputs = HealthInputs {
            total_income: 50_000.0,
            total_expense: 0.0,
            monthly_expenses: vec![],
            liquid_balance: 20_000.0,
            category_spending: BTreeMap::new(),
        };
        let score = compose_health_score(&inputs);
        assert_eq!(score.metrics["income_expense_ratio"], 8);
        // Nothing to cover counts as fully covered.
        assert_eq!(score.metrics["emergency_fund"], 25);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(grade_for(100), "A+");
        assert_eq!(grade_for(90), "A+");
        assert_eq!(grade_for(86), "A");
        assert_eq!(grade_for(80), "A-");
        assert_eq!(grade_for(72), "B");
        assert_eq!(grade_for(60), "C+");
        assert_eq!(grade_for(49), "D");
    }

    #[test]
    fn test_from_transactions_builds_inputs() {
        use crate::schema::{Transaction, TransactionKind};
        use chrono::NaiveDate;

        let txs = vec![
            Transaction {
                id: 1,
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                time: None,
                amount: 50_000.0,
                kind: TransactionKind::Income,
                category: "Salary".to_string(),
                subcategory: None,
                account: "Checking".to_string(),
                note: None,
            },
            Transaction {
                id: 2,
                date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
                time: None,
                amount: 9_000.0,
                kind: TransactionKind::Expense,
                category: "Rent".to_string(),
                subcategory: None,
                account: "Checking".to_string(),
                note: None,
            },
            Transaction {
                id: 3,
                date: NaiveDate::from_ymd_opt(2024, 2, 12).unwrap(),
                time: None,
                amount: 8_000.0,
                kind: TransactionKind::Expense,
                category: "Rent".to_string(),
                subcategory: None,
                account: "Checking".to_string(),
                note: None,
            },
        ];
        let mut balances = BTreeMap::new();
        balances.insert("Checking".to_string(), 40_000.0);
        balances.insert("Savings".to_string(), 60_000.0);

        let inputs = HealthInputs::from_transactions(&txs, &balances);
        assert_eq!(inputs.total_income, 50_000.0);
        assert_eq!(inputs.total_expense, 17_000.0);
        assert_eq!(inputs.monthly_expenses, vec![9_000.0, 8_000.0]);
        assert_eq!(inputs.liquid_balance, 100_000.0);
        assert_eq!(inputs.category_spending["Rent"], 17_000.0);
    }
}
