use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub(crate) fn compound(rate: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

/// Convert a nominal annual rate with semi-annual compounding into the
/// effective monthly rate used for Canadian mortgages.
///
/// Canadian mortgage rates are compounded semi-annually but collected
/// monthly, so the quoted annual rate must pass through the effective
/// annual rate before the monthly rate can be taken as its twelfth root.
pub fn effective_monthly_rate(annual_rate: Rate) -> MortgageResult<Rate> {
    if annual_rate < Decimal::ZERO {
        return Err(MortgageError::InvalidRate {
            rate: annual_rate,
            reason: "annual rate must be non-negative".into(),
        });
    }
    if annual_rate >= Decimal::ONE {
        return Err(MortgageError::InvalidRate {
            rate: annual_rate,
            reason: "annual rate must be below 100%".into(),
        });
    }
    if annual_rate.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let semi_annual = annual_rate / dec!(2);
    let one_plus_semi = Decimal::ONE + semi_annual;
    let effective_annual = one_plus_semi * one_plus_semi - Decimal::ONE;
    let monthly = (Decimal::ONE + effective_annual).powd(Decimal::ONE / dec!(12)) - Decimal::ONE;
    Ok(monthly)
}

/// Fixed monthly annuity payment for a loan of `principal` amortized over
/// `n_months` at `monthly_rate`. Zero-rate loans fall back to straight-line.
pub fn monthly_payment(
    principal: Money,
    monthly_rate: Rate,
    n_months: u32,
) -> MortgageResult<Money> {
    if n_months == 0 {
        return Err(MortgageError::InvalidTerm {
            reason: "amortization length must be at least one month".into(),
        });
    }
    if principal <= Decimal::ZERO {
        return Err(MortgageError::InvalidTerm {
            reason: format!("principal must be positive, got {principal}"),
        });
    }
    if monthly_rate < Decimal::ZERO {
        return Err(MortgageError::InvalidRate {
            rate: monthly_rate,
            reason: "monthly rate must be non-negative".into(),
        });
    }

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(n_months));
    }

    // payment = P * r * (1+r)^n / ((1+r)^n - 1)
    let factor = compound(monthly_rate, n_months);
    Ok(principal * monthly_rate * factor / (factor - Decimal::ONE))
}

/// Future value of a lump sum compounded monthly at `annual_rate` over
/// `months`. Used by the renewal planner for opportunity-cost comparison.
pub fn future_value(principal: Money, annual_rate: Rate, months: u32) -> Money {
    if annual_rate.is_zero() || months == 0 {
        return principal;
    }
    let monthly = annual_rate / dec!(12);
    principal * compound(monthly, months)
}
