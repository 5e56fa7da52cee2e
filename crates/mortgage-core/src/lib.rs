pub mod amortization;
pub mod compounding;
pub mod error;
pub mod types;

#[cfg(feature = "renewal")]
pub mod renewal;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all mortgage calculations
pub type MortgageResult<T> = Result<T, MortgageError>;
