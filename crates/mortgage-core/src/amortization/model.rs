use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::{
    build_schedule, AmortizationSchedule, ExtraPayments, GapPolicy, GapWindow, ScheduleParams,
};
use crate::compounding::{effective_monthly_rate, monthly_payment};
use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// The static terms of a Canadian fixed-rate mortgage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageTerms {
    pub original_principal: Money,
    pub annual_rate: Rate,
    pub amortization_months: u32,
    pub term_months: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub mortgage_gap: Option<GapWindow>,
}

impl MortgageTerms {
    fn validate(&self) -> MortgageResult<()> {
        if self.original_principal <= Decimal::ZERO {
            return Err(MortgageError::InvalidTerms {
                field: "original_principal".into(),
                reason: format!("must be positive, got {}", self.original_principal),
            });
        }
        if self.amortization_months == 0 {
            return Err(MortgageError::InvalidTerms {
                field: "amortization_months".into(),
                reason: "must be at least one month".into(),
            });
        }
        if self.term_months == 0 || self.term_months > self.amortization_months {
            return Err(MortgageError::InvalidTerms {
                field: "term_months".into(),
                reason: format!(
                    "must lie in [1, {}], got {}",
                    self.amortization_months, self.term_months
                ),
            });
        }
        if let Some(gap) = &self.mortgage_gap {
            let amortization_end = self
                .start_date
                .checked_add_months(Months::new(self.amortization_months))
                .ok_or_else(|| {
                    MortgageError::Date(format!(
                        "cannot advance {} by {} months",
                        self.start_date, self.amortization_months
                    ))
                })?;
            if gap.start < self.start_date || gap.end >= amortization_end {
                return Err(MortgageError::InvalidTerms {
                    field: "mortgage_gap".into(),
                    reason: format!(
                        "gap {} to {} must lie within {} to {}",
                        gap.start, gap.end, self.start_date, amortization_end
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Balance and cumulative totals at a point in the schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// The term-end hand-off consumed by the renewal planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalSnapshot {
    pub renewal_date: NaiveDate,
    pub remaining_balance: Money,
    pub remaining_amortization_months: u32,
    pub elapsed_interest: Money,
}

/// A mortgage with its derived monthly rate and scheduled payment.
///
/// Construction fails fast on invalid terms; everything downstream works
/// with values validated here.
#[derive(Debug, Clone)]
pub struct MortgageModel {
    terms: MortgageTerms,
    monthly_rate: Rate,
    scheduled_payment: Money,
}

impl MortgageModel {
    pub fn new(terms: MortgageTerms) -> MortgageResult<Self> {
        terms.validate()?;
        let monthly_rate = effective_monthly_rate(terms.annual_rate)?;
        let scheduled_payment =
            monthly_payment(terms.original_principal, monthly_rate, terms.amortization_months)?;
        Ok(Self {
            terms,
            monthly_rate,
            scheduled_payment,
        })
    }

    pub fn terms(&self) -> &MortgageTerms {
        &self.terms
    }

    pub fn monthly_rate(&self) -> Rate {
        self.monthly_rate
    }

    pub fn scheduled_payment(&self) -> Money {
        self.scheduled_payment
    }

    /// Full amortization schedule over the whole amortization period.
    pub fn build_schedule(&self) -> MortgageResult<AmortizationSchedule> {
        self.build_schedule_with(ExtraPayments::none(), GapPolicy::default())
    }

    /// Schedule with extra payments layered on top of the base terms.
    pub fn build_schedule_with(
        &self,
        extras: ExtraPayments,
        gap_policy: GapPolicy,
    ) -> MortgageResult<AmortizationSchedule> {
        build_schedule(&ScheduleParams {
            starting_balance: self.terms.original_principal,
            monthly_rate: self.monthly_rate,
            scheduled_payment: self.scheduled_payment,
            horizon_months: self.terms.amortization_months,
            start_date: self.terms.start_date,
            extras,
            gap: self.terms.mortgage_gap,
            gap_policy,
        })
    }

    /// Balance and cumulative totals after `month_index` payments.
    /// Month 0 is the unpaid starting position.
    pub fn snapshot_at(&self, month_index: u32) -> MortgageResult<Snapshot> {
        if month_index > self.terms.amortization_months {
            return Err(MortgageError::InvalidTerm {
                reason: format!(
                    "snapshot month {} exceeds amortization of {} months",
                    month_index, self.terms.amortization_months
                ),
            });
        }
        if month_index == 0 {
            return Ok(Snapshot {
                balance: self.terms.original_principal,
                cumulative_interest: Decimal::ZERO,
                cumulative_principal: Decimal::ZERO,
            });
        }

        let schedule = self.build_schedule()?;
        let index = (month_index as usize).min(schedule.len());
        let record = &schedule.records[index - 1];
        Ok(Snapshot {
            balance: record.ending_balance,
            cumulative_interest: record.cumulative_interest,
            cumulative_principal: record.cumulative_principal,
        })
    }

    /// The state handed to the renewal planner at the end of the term.
    pub fn renewal_snapshot(&self) -> MortgageResult<RenewalSnapshot> {
        let snapshot = self.snapshot_at(self.terms.term_months)?;
        let renewal_date = self
            .terms
            .start_date
            .checked_add_months(Months::new(self.terms.term_months))
            .ok_or_else(|| {
                MortgageError::Date(format!(
                    "cannot advance {} by {} months",
                    self.terms.start_date, self.terms.term_months
                ))
            })?;
        Ok(RenewalSnapshot {
            renewal_date,
            remaining_balance: snapshot.balance,
            remaining_amortization_months: self.terms.amortization_months - self.terms.term_months,
            elapsed_interest: snapshot.cumulative_interest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn typical_terms() -> MortgageTerms {
        MortgageTerms {
            original_principal: dec!(500000),
            annual_rate: dec!(0.05),
            amortization_months: 300,
            term_months: 60,
            start_date: date(2024, 1, 1),
            mortgage_gap: None,
        }
    }

    #[test]
    fn test_model_derives_rate_and_payment() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        assert!((model.monthly_rate() - dec!(0.004124)).abs() < dec!(0.000001));
        assert!(model.scheduled_payment() > dec!(2900));
    }

    #[test]
    fn test_term_longer_than_amortization_rejected() {
        let mut terms = typical_terms();
        terms.term_months = 301;
        assert!(matches!(
            MortgageModel::new(terms),
            Err(MortgageError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn test_gap_outside_amortization_window_rejected() {
        let mut terms = typical_terms();
        terms.mortgage_gap = Some(GapWindow {
            start: date(2023, 1, 1),
            end: date(2023, 6, 1),
        });
        assert!(MortgageModel::new(terms.clone()).is_err());

        terms.mortgage_gap = Some(GapWindow {
            start: date(2048, 1, 1),
            end: date(2049, 6, 1),
        });
        assert!(MortgageModel::new(terms).is_err());
    }

    #[test]
    fn test_gap_inside_amortization_window_accepted() {
        let mut terms = typical_terms();
        terms.mortgage_gap = Some(GapWindow {
            start: date(2026, 3, 1),
            end: date(2026, 6, 1),
        });
        assert!(MortgageModel::new(terms).is_ok());
    }

    #[test]
    fn test_snapshot_at_zero_is_starting_position() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        let snapshot = model.snapshot_at(0).unwrap();
        assert_eq!(snapshot.balance, dec!(500000));
        assert_eq!(snapshot.cumulative_interest, dec!(0));
    }

    #[test]
    fn test_snapshot_matches_schedule_record() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        let schedule = model.build_schedule().unwrap();
        let snapshot = model.snapshot_at(12).unwrap();
        assert_eq!(snapshot.balance, schedule.records[11].ending_balance);
        assert_eq!(
            snapshot.cumulative_interest,
            schedule.records[11].cumulative_interest
        );
    }

    #[test]
    fn test_snapshot_beyond_amortization_rejected() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        assert!(model.snapshot_at(301).is_err());
    }

    #[test]
    fn test_renewal_snapshot() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        let snapshot = model.renewal_snapshot().unwrap();
        assert_eq!(snapshot.renewal_date, date(2029, 1, 1));
        assert_eq!(snapshot.remaining_amortization_months, 240);
        assert!(snapshot.remaining_balance > dec!(0));
        assert!(snapshot.remaining_balance < dec!(500000));
        assert!(snapshot.elapsed_interest > dec!(0));
    }

    #[test]
    fn test_extra_payments_layered_on_model() {
        let model = MortgageModel::new(typical_terms()).unwrap();
        let plain = model.build_schedule().unwrap();
        let extras = ExtraPayments {
            monthly: dec!(0),
            annual: dec!(20000),
            anniversary_offset: 0,
        };
        let fast = model
            .build_schedule_with(extras, GapPolicy::default())
            .unwrap();
        assert!(fast.months_to_payoff().unwrap() < plain.months_to_payoff().unwrap());
        assert!(fast.total_interest_paid < plain.total_interest_paid);
    }
}
