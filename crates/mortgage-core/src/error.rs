use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("Invalid rate {rate}: {reason}")]
    InvalidRate { rate: Decimal, reason: String },

    #[error("Invalid term: {reason}")]
    InvalidTerm { reason: String },

    #[error("Invalid mortgage terms: {field}: {reason}")]
    InvalidTerms { field: String, reason: String },

    #[error("Negative amortization at month {month}: payment {payment} never covers interest {interest}")]
    NegativeAmortization {
        month: u32,
        payment: Decimal,
        interest: Decimal,
    },

    #[error("Paydown {paydown} exceeds remaining balance {remaining}")]
    Overpaydown { paydown: Decimal, remaining: Decimal },

    #[error("Invalid extra payment {amount}: {reason}")]
    ExcessPaydown { amount: Decimal, reason: String },

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    #[error("Date error: {0}")]
    Date(String),
}
