use crate::error::{LedgerInsightsError, Result};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::mean;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One marginal bracket of a progressive tax regime. The rate applies only
/// to the income portion between `floor` and `ceiling`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub floor: f64,
    /// `None` for the open-ended top bracket.
    pub ceiling: Option<f64>,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRegime {
    /// Brackets in ascending order; each floor must equal the previous
    /// ceiling and the last bracket must be open-ended.
    pub slabs: Vec<TaxSlab>,
    /// Flat surcharge applied on top of the computed bracket tax.
    pub cess_percent: f64,
    /// Fixed annual allowance deducted alongside the standard deduction.
    pub professional_tax: f64,
}

impl Default for TaxRegime {
    fn default() -> Self {
        let boundaries = [400_000.0, 800_000.0, 1_200_000.0, 1_600_000.0, 2_000_000.0, 2_400_000.0];
        let rates = [5.0, 10.0, 15.0, 20.0, 25.0, 30.0];

        let mut slabs = vec![TaxSlab {
            floor: 0.0,
            ceiling: Some(boundaries[0]),
            rate_percent: 0.0,
        }];
        for i in 0..boundaries.len() {
            slabs.push(TaxSlab {
                floor: boundaries[i],
                ceiling: boundaries.get(i + 1).copied(),
                rate_percent: rates[i],
            });
        }

        Self {
            slabs,
            cess_percent: 4.0,
            professional_tax: 2_400.0,
        }
    }
}

impl TaxRegime {
    pub fn validate(&self) -> Result<()> {
        if self.slabs.is_empty() {
            return Err(LedgerInsightsError::InvalidTaxRegime(
                "regime has no slabs".to_string(),
            ));
        }

        let mut expected_floor = 0.0;
        for (idx, slab) in self.slabs.iter().enumerate() {
            if slab.floor != expected_floor {
                return Err(LedgerInsightsError::InvalidTaxRegime(format!(
                    "slab #{} floor {} does not continue from {}",
                    idx, slab.floor, expected_floor
                )));
            }
            if !slab.rate_percent.is_finite() || slab.rate_percent < 0.0 {
                return Err(LedgerInsightsError::InvalidTaxRegime(format!(
                    "slab #{} has invalid rate {}",
                    idx, slab.rate_percent
                )));
            }
            match slab.ceiling {
                Some(ceiling) if ceiling <= slab.floor => {
                    return Err(LedgerInsightsError::InvalidTaxRegime(format!(
                        "slab #{} ceiling {} is not above floor {}",
                        idx, ceiling, slab.floor
                    )));
                }
                Some(ceiling) => expected_floor = ceiling,
                None if idx != self.slabs.len() - 1 => {
                    return Err(LedgerInsightsError::InvalidTaxRegime(format!(
                        "slab #{} is open-ended but not last",
                        idx
                    )));
                }
                None => {}
            }
        }

        if self.slabs.last().map(|s| s.ceiling).unwrap_or(None).is_some() {
            return Err(LedgerInsightsError::InvalidTaxRegime(
                "last slab must be open-ended".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caller-supplied figures for the fiscal year so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInputs {
    pub total_income_so_far: f64,
    pub standard_deduction: f64,
    pub total_tax_liability_so_far: f64,
    /// How many trailing months of salary credits feed the projection.
    pub salary_lookback_months: u32,
}

impl Default for TaxInputs {
    fn default() -> Self {
        Self {
            total_income_so_far: 0.0,
            standard_deduction: 75_000.0,
            total_tax_liability_so_far: 0.0,
            salary_lookback_months: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxProjection {
    pub avg_monthly_salary: f64,
    pub months_remaining: u32,
    pub projected_annual_salary: f64,
    pub projected_taxable_income: f64,
    pub projected_total_tax: f64,
    pub additional_tax_liability: f64,
    pub current_tax: f64,
}

/// Progressive bracket tax on an income, without cess. Each bracket's rate
/// applies only to the portion of income inside that bracket.
pub fn tax_for_income(regime: &TaxRegime, income: f64) -> f64 {
    if !income.is_finite() || income <= 0.0 {
        return 0.0;
    }

    regime
        .slabs
        .iter()
        .map(|slab| {
            let upper = slab.ceiling.unwrap_or(f64::INFINITY).min(income);
            let taxed_in_slab = (upper - slab.floor).max(0.0);
            taxed_in_slab * slab.rate_percent / 100.0
        })
        .sum()
}

/// Bracket tax plus the flat cess surcharge.
pub fn total_tax_with_cess(regime: &TaxRegime, income: f64) -> f64 {
    tax_for_income(regime, income) * (1.0 + regime.cess_percent / 100.0)
}

/// Zero-based month index within the April-to-March fiscal year.
fn fiscal_month_index(date: NaiveDate) -> u32 {
    let m0 = date.month0();
    if m0 >= 3 {
        m0 - 3
    } else {
        m0 + 9
    }
}

fn is_salary_credit(tx: &Transaction) -> bool {
    if tx.kind != TransactionKind::Income {
        return false;
    }
    tx.category.to_lowercase().contains("salary")
        || tx
            .note
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains("salary"))
}

/// Projects year-end tax liability from the recent salary trend. Returns
/// `None` in the final month of the fiscal year (nothing left to project)
/// and when no qualifying salary credits landed in the trailing window —
/// callers hide the projection rather than showing a zero estimate.
pub fn project_tax(
    transactions: &[Transaction],
    inputs: &TaxInputs,
    regime: &TaxRegime,
    today: NaiveDate,
) -> Option<TaxProjection> {
    let months_remaining = 11_u32.saturating_sub(fiscal_month_index(today));
    if months_remaining == 0 {
        return None;
    }

    let cutoff = today
        .checked_sub_months(Months::new(inputs.salary_lookback_months))
        .unwrap_or(today);
    let recent_salaries: Vec<f64> = transactions
        .iter()
        .filter(|t| is_salary_credit(t) && t.date > cutoff && t.date <= today)
        .map(|t| t.sanitized_amount())
        .collect();

    if recent_salaries.is_empty() {
        return None;
    }

    let avg_monthly_salary = mean(&recent_salaries);
    let projected_annual_salary =
        inputs.total_income_so_far + avg_monthly_salary * months_remaining as f64;

    let deductions = inputs.standard_deduction + regime.professional_tax;
    let projected_taxable_income = (projected_annual_salary - deductions).max(0.0);
    let projected_total_tax = total_tax_with_cess(regime, projected_taxable_income);
    let current_tax =
        total_tax_with_cess(regime, (inputs.total_income_so_far - deductions).max(0.0));

    Some(TaxProjection {
        avg_monthly_salary,
        months_remaining,
        projected_annual_salary,
        projected_taxable_income,
        projected_total_tax,
        additional_tax_liability: projected_total_tax - inputs.total_tax_liability_so_far,
        current_tax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salary(id: u64, date: NaiveDate, amount: f64) -> Transaction {
        Transaction {
            id,
            date,
            time: None,
            amount,
            kind: TransactionKind::Income,
            category: "Salary".to_string(),
            subcategory: None,
            account: "Checking".to_string(),
            note: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_progressive_slab_anchors() {
        let regime = TaxRegime::default();
        assert_eq!(tax_for_income(&regime, 500_000.0), 5_000.0);
        assert_eq!(tax_for_income(&regime, 800_000.0), 20_000.0);
        assert_eq!(tax_for_income(&regime, 1_000_000.0), 40_000.0);
        assert_eq!(tax_for_income(&regime, 3_000_000.0), 480_000.0);
    }

    #[test]
    fn test_no_tax_below_first_boundary() {
        let regime = TaxRegime::default();
        assert_eq!(tax_for_income(&regime, 0.0), 0.0);
        assert_eq!(tax_for_income(&regime, 399_999.0), 0.0);
        assert_eq!(tax_for_income(&regime, -100.0), 0.0);
        assert_eq!(tax_for_income(&regime, f64::NAN), 0.0);
    }

    #[test]
    fn test_cess_applied_on_top() {
        let regime = TaxRegime::default();
        assert!((total_tax_with_cess(&regime, 1_000_000.0) - 41_600.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_regime_validates() {
        assert!(TaxRegime::default().validate().is_ok());
    }

    #[test]
    fn test_gapped_slabs_rejected() {
        let regime = TaxRegime {
            slabs: vec![
                TaxSlab {
                    floor: 0.0,
                    ceiling: Some(100_000.0),
                    rate_percent: 0.0,
                },
                TaxSlab {
                    floor: 200_000.0,
                    ceiling: None,
                    rate_percent: 10.0,
                },
            ],
            cess_percent: 4.0,
            professional_tax: 0.0,
        };
        assert!(regime.validate().is_err());
    }

    #[test]
    fn test_fiscal_month_index() {
        assert_eq!(fiscal_month_index(date(2024, 4, 1)), 0);
        assert_eq!(fiscal_month_index(date(2024, 12, 15)), 8);
        assert_eq!(fiscal_month_index(date(2025, 1, 10)), 9);
        assert_eq!(fiscal_month_index(date(2025, 3, 31)), 11);
    }

    #[test]
    fn test_projection_from_recent_salaries() {
        let txs = vec![
            salary(1, date(2024, 8, 1), 100_000.0),
            salary(2, date(2024, 9, 1), 100_000.0),
            salary(3, date(2024, 10, 1), 100_000.0),
        ];
        let inputs = TaxInputs {
            total_income_so_far: 700_000.0,
            standard_deduction: 75_000.0,
            total_tax_liability_so_far: 10_000.0,
            salary_lookback_months: 3,
        };
        let today = date(2024, 10, 15); // October: fiscal month 6, 5 remaining
        let projection = project_tax(&txs, &inputs, &TaxRegime::default(), today).unwrap();

        assert_eq!(projection.months_remaining, 5);
        assert_eq!(projection.avg_monthly_salary, 100_000.0);
        assert_eq!(projection.projected_annual_salary, 1_200_000.0);
        assert_eq!(projection.projected_taxable_income, 1_122_600.0);

        let expected_tax = total_tax_with_cess(&TaxRegime::default(), 1_122_600.0);
        assert!((projection.projected_total_tax - expected_tax).abs() < 1e-9);
        assert!((projection.additional_tax_liability - (expected_tax - 10_000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_none_in_final_fiscal_month() {
        let txs = vec![salary(1, date(2025, 2, 28), 100_000.0)];
        let result = project_tax(
            &txs,
            &TaxInputs::default(),
            &TaxRegime::default(),
            date(2025, 3, 10),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_none_without_recent_salary() {
        // Salary credits exist but fall outside the trailing window.
        let txs = vec![salary(1, date(2024, 1, 1), 100_000.0)];
        let result = project_tax(
            &txs,
            &TaxInputs::default(),
            &TaxRegime::default(),
            date(2024, 10, 15),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_salary_matched_via_note() {
        let mut tx = salary(1, date(2024, 9, 20), 90_000.0);
        tx.category = "Income".to_string();
        tx.note = Some("Monthly salary credit".to_string());

        let projection = project_tax(
            &[tx],
            &TaxInputs::default(),
            &TaxRegime::default(),
            date(2024, 10, 15),
        );
        assert!(projection.is_some());
    }
}
