use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Unknown {kind}: '{value}'")]
    UnknownValue { kind: &'static str, value: String },
    #[error("Invalid period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Transaction {0} cannot be reconciled from its current status")]
    NotReconcilable(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FinError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        FinError::UnknownValue { kind, value: value.to_string() }
    }
}
