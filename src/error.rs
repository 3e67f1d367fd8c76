use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerInsightsError {
    #[error("Invalid anomaly sensitivity {0}: must be a finite value greater than 0")]
    InvalidSensitivity(f64),

    #[error("Invalid recurring-detection config: {0}")]
    InvalidRecurringConfig(String),

    #[error("Invalid tax regime: {0}")]
    InvalidTaxRegime(String),

    #[error("Invalid forecast horizon {0}: must be at least 1 month")]
    InvalidForecastHorizon(u32),

    #[error("Invalid trend config: {0}")]
    InvalidTrendConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerInsightsError>;
