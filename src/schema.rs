use chrono::{NaiveDate, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum TransactionKind {
    #[schemars(description = "Money received from an external source (salary, cashback, refunds)")]
    Income,

    #[schemars(description = "Money paid to an external party")]
    Expense,

    #[schemars(
        description = "Money arriving from another of the user's own accounts. Excluded from income totals and savings-rate computation."
    )]
    TransferIn,

    #[schemars(
        description = "Money leaving for another of the user's own accounts. Excluded from expense totals and savings-rate computation."
    )]
    TransferOut,
}

impl TransactionKind {
    /// True for transfers between the user's own accounts.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::TransferIn | Self::TransferOut)
    }
}

/// An immutable ledger record. Construction is the only place amounts are
/// sanitized: downstream analytics assume `amount` is finite and non-negative.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Unique identifier, used as a stable ordering key when dates tie")]
    pub id: u64,

    #[schemars(description = "Calendar date of the transaction")]
    pub date: NaiveDate,

    #[schemars(description = "Optional time of day")]
    pub time: Option<NaiveTime>,

    #[schemars(
        description = "Non-negative magnitude. The direction of the money flow is carried by `kind`, not by the sign."
    )]
    pub amount: f64,

    #[schemars(description = "Direction/classification of the money flow")]
    pub kind: TransactionKind,

    #[schemars(description = "Free-text category label")]
    pub category: String,

    #[schemars(description = "Optional free-text subcategory; absent means 'Uncategorized'")]
    pub subcategory: Option<String>,

    #[schemars(description = "Source or destination account name")]
    pub account: String,

    #[schemars(
        description = "Optional memo. Primary grouping key for recurring-pattern detection; detection falls back to `category` when absent."
    )]
    pub note: Option<String>,
}

impl Transaction {
    /// The amount with malformed values degraded to zero. A `NaN`, infinite
    /// or negative amount is treated as 0 rather than poisoning aggregates.
    pub fn sanitized_amount(&self) -> f64 {
        if self.amount.is_finite() && self.amount >= 0.0 {
            self.amount
        } else {
            0.0
        }
    }

    /// The subcategory with the absent case mapped to "Uncategorized".
    pub fn subcategory_or_default(&self) -> &str {
        self.subcategory.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// The grouping key used by recurring detection: the memo when present,
    /// the category otherwise.
    pub fn grouping_label(&self) -> &str {
        match self.note.as_deref() {
            Some(note) if !note.trim().is_empty() => note,
            _ => &self.category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Ledger {
    #[schemars(description = "Display name for the ledger owner")]
    pub owner_name: String,

    #[schemars(description = "All transactions, in no particular order")]
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Ledger)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
