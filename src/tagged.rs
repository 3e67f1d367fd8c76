use crate::aggregate::{percentage, total_income};
use crate::schema::{Transaction, TransactionKind};
use crate::utils::month_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rollup of income transactions carrying a particular tag (cashback,
/// reimbursement) in their category or subcategory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedIncomeSummary {
    pub tag: String,
    pub total: f64,
    pub count: usize,
    pub share_of_income_percent: f64,
    pub by_month: BTreeMap<String, f64>,
}

pub fn cashback_summary(transactions: &[Transaction]) -> TaggedIncomeSummary {
    tagged_income_summary(transactions, "cashback")
}

pub fn reimbursement_summary(transactions: &[Transaction]) -> TaggedIncomeSummary {
    tagged_income_summary(transactions, "reimbursement")
}

/// Extracts income transactions whose category or subcategory contains the
/// tag, case-insensitively. "Credit Card Cashback" and "cashback" both match.
pub fn tagged_income_summary(transactions: &[Transaction], tag: &str) -> TaggedIncomeSummary {
    let needle = tag.to_lowercase();
    let mut total = 0.0;
    let mut count = 0;
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();

    for tx in transactions {
        if tx.kind != TransactionKind::Income {
            continue;
        }
        let matches = tx.category.to_lowercase().contains(&needle)
            || tx.subcategory_or_default().to_lowercase().contains(&needle);
        if !matches {
            continue;
        }

        let amount = tx.sanitized_amount();
        total += amount;
        count += 1;
        *by_month.entry(month_key(tx.date)).or_insert(0.0) += amount;
    }

    TaggedIncomeSummary {
        tag: tag.to_string(),
        total,
        count,
        share_of_income_percent: percentage(total, total_income(transactions)),
        by_month,
    }
}
