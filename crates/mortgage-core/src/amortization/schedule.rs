use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Balances within a micro-dollar of zero count as retired. Payment
/// amounts carry division rounding that would otherwise leave a
/// vanishing residual on the final month.
const PAYOFF_EPSILON: Decimal = rust_decimal_macros::dec!(0.000001);

/// What happens to interest during a payment gap.
///
/// The default capitalizes accrued interest onto the balance, matching how
/// lenders treat ownership-transfer gaps. `PauseAmortization` freezes the
/// balance entirely and exists for comparison runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapPolicy {
    #[default]
    CapitalizeInterest,
    PauseAmortization,
}

/// A period with no scheduled payments, e.g. an ownership transfer gap.
/// Both dates are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl GapWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    fn validate(&self) -> MortgageResult<()> {
        if self.start >= self.end {
            return Err(MortgageError::InvalidTerms {
                field: "mortgage_gap".into(),
                reason: format!("gap start {} must precede gap end {}", self.start, self.end),
            });
        }
        Ok(())
    }
}

/// Recurring prepayments applied on top of the scheduled payment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtraPayments {
    /// Added to principal reduction every non-gap month.
    #[serde(default)]
    pub monthly: Money,
    /// Lump sum applied once per 12-month anniversary.
    #[serde(default)]
    pub annual: Money,
    /// Which month of the year the annual lump sum lands on;
    /// 0 means each 12-month anniversary (months 12, 24, ...).
    #[serde(default)]
    pub anniversary_offset: u32,
}

impl ExtraPayments {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> MortgageResult<()> {
        if self.monthly < Decimal::ZERO {
            return Err(MortgageError::ExcessPaydown {
                amount: self.monthly,
                reason: "extra monthly payment must be non-negative".into(),
            });
        }
        if self.annual < Decimal::ZERO {
            return Err(MortgageError::ExcessPaydown {
                amount: self.annual,
                reason: "extra annual payment must be non-negative".into(),
            });
        }
        if self.anniversary_offset >= 12 {
            return Err(MortgageError::InvalidTerm {
                reason: format!(
                    "anniversary offset must be below 12, got {}",
                    self.anniversary_offset
                ),
            });
        }
        Ok(())
    }

    fn annual_applies(&self, month_index: u32) -> bool {
        self.annual > Decimal::ZERO && month_index % 12 == self.anniversary_offset
    }
}

/// One scheduled month in an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub month_index: u32,
    pub date: NaiveDate,
    pub scheduled_payment: Money,
    pub interest_portion: Money,
    pub scheduled_principal_portion: Money,
    pub extra_principal_applied: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// Per-year rollup of a schedule, one row per 12-month block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualSummary {
    /// 1-based year of the schedule; the last year may be partial.
    pub year_index: u32,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub ending_balance: Money,
}

/// An ordered month-by-month schedule with derived totals.
/// Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub records: Vec<PaymentRecord>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    /// Month the balance reached zero; may be earlier than the nominal
    /// horizon when extra payments retire the loan early.
    pub actual_payoff_month: Option<u32>,
}

impl AmortizationSchedule {
    /// A schedule for a loan retired in full before its first payment.
    pub fn settled() -> Self {
        Self {
            records: Vec::new(),
            total_interest_paid: Decimal::ZERO,
            total_principal_paid: Decimal::ZERO,
            actual_payoff_month: Some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record_at(&self, month_index: u32) -> Option<&PaymentRecord> {
        if month_index == 0 {
            return None;
        }
        self.records.get(month_index as usize - 1)
    }

    /// Roll the schedule up into yearly principal/interest/balance rows.
    pub fn annual_summaries(&self) -> Vec<AnnualSummary> {
        let mut summaries = Vec::with_capacity(self.records.len().div_ceil(12));
        for (year, months) in self.records.chunks(12).enumerate() {
            let Some(last) = months.last() else { continue };
            summaries.push(AnnualSummary {
                year_index: year as u32 + 1,
                interest_paid: months.iter().map(|r| r.interest_portion).sum(),
                principal_paid: months
                    .iter()
                    .map(|r| r.scheduled_principal_portion + r.extra_principal_applied)
                    .sum(),
                ending_balance: last.ending_balance,
            });
        }
        summaries
    }

    /// Month the balance reached zero. `None` means the loan is still
    /// outstanding at the end of the horizon, which can happen when gap
    /// months capitalize enough interest to outlast it.
    pub fn months_to_payoff(&self) -> Option<u32> {
        self.actual_payoff_month
    }
}

/// Inputs for one schedule build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub starting_balance: Money,
    pub monthly_rate: Rate,
    pub scheduled_payment: Money,
    pub horizon_months: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub extras: ExtraPayments,
    #[serde(default)]
    pub gap: Option<GapWindow>,
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

impl ScheduleParams {
    fn validate(&self) -> MortgageResult<()> {
        if self.starting_balance <= Decimal::ZERO {
            return Err(MortgageError::InvalidTerm {
                reason: format!(
                    "starting balance must be positive, got {}",
                    self.starting_balance
                ),
            });
        }
        if self.monthly_rate < Decimal::ZERO {
            return Err(MortgageError::InvalidRate {
                rate: self.monthly_rate,
                reason: "monthly rate must be non-negative".into(),
            });
        }
        if self.scheduled_payment <= Decimal::ZERO {
            return Err(MortgageError::InvalidTerm {
                reason: format!(
                    "scheduled payment must be positive, got {}",
                    self.scheduled_payment
                ),
            });
        }
        if self.horizon_months == 0 {
            return Err(MortgageError::InvalidTerm {
                reason: "horizon must be at least one month".into(),
            });
        }
        self.extras.validate()?;
        if let Some(gap) = &self.gap {
            gap.validate()?;
        }
        Ok(())
    }
}

/// Payment date for a given month index: `start_date` plus that many
/// months, with the day-of-month clamped to a valid calendar day.
fn payment_date(start_date: NaiveDate, month_index: u32) -> MortgageResult<NaiveDate> {
    start_date
        .checked_add_months(Months::new(month_index))
        .ok_or_else(|| {
            MortgageError::Date(format!(
                "cannot advance {start_date} by {month_index} months"
            ))
        })
}

/// Build a month-by-month amortization schedule.
///
/// Iterates from month 1 up to the horizon, or until the balance reaches
/// exactly zero. Gap months make no payment; under the default policy the
/// accrued interest is capitalized onto the balance. The final payment is
/// truncated so the ending balance can never go negative. A schedule whose
/// payment fails to cover interest for more than one consecutive month is
/// rejected whole; no partial schedule is ever returned.
pub fn build_schedule(params: &ScheduleParams) -> MortgageResult<AmortizationSchedule> {
    params.validate()?;

    let mut records: Vec<PaymentRecord> = Vec::with_capacity(params.horizon_months as usize);
    let mut balance = params.starting_balance;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;
    let mut actual_payoff_month = None;
    let mut stalled_months: u32 = 0;

    for month_index in 1..=params.horizon_months {
        let date = payment_date(params.start_date, month_index)?;
        let in_gap = params.gap.map_or(false, |gap| gap.contains(date));

        let record = if in_gap {
            let accrued = match params.gap_policy {
                GapPolicy::CapitalizeInterest => balance * params.monthly_rate,
                GapPolicy::PauseAmortization => Decimal::ZERO,
            };
            balance += accrued;
            cumulative_interest += accrued;
            stalled_months = 0;
            PaymentRecord {
                month_index,
                date,
                scheduled_payment: Decimal::ZERO,
                interest_portion: accrued,
                scheduled_principal_portion: Decimal::ZERO,
                extra_principal_applied: Decimal::ZERO,
                ending_balance: balance,
                cumulative_interest,
                cumulative_principal,
            }
        } else {
            let interest = balance * params.monthly_rate;
            let mut payment = params.scheduled_payment;
            let mut principal = payment - interest;
            if principal >= balance - PAYOFF_EPSILON {
                // Final-payment truncation: retire exactly what remains.
                principal = balance;
                payment = interest + principal;
            }

            let after_scheduled = balance - principal;
            let mut extra = Decimal::ZERO;
            if params.extras.monthly > Decimal::ZERO && after_scheduled > Decimal::ZERO {
                extra = params.extras.monthly.min(after_scheduled);
            }
            if params.extras.annual_applies(month_index) && after_scheduled - extra > Decimal::ZERO
            {
                extra += params.extras.annual.min(after_scheduled - extra);
            }

            let ending = balance - principal - extra;
            if ending >= balance {
                stalled_months += 1;
                if stalled_months > 1 {
                    return Err(MortgageError::NegativeAmortization {
                        month: month_index,
                        payment: params.scheduled_payment,
                        interest,
                    });
                }
            } else {
                stalled_months = 0;
            }

            balance = ending;
            cumulative_interest += interest;
            cumulative_principal += principal + extra;
            PaymentRecord {
                month_index,
                date,
                scheduled_payment: payment,
                interest_portion: interest,
                scheduled_principal_portion: principal,
                extra_principal_applied: extra,
                ending_balance: balance,
                cumulative_interest,
                cumulative_principal,
            }
        };

        records.push(record);

        if balance <= Decimal::ZERO {
            actual_payoff_month = Some(month_index);
            break;
        }
    }

    Ok(AmortizationSchedule {
        records,
        total_interest_paid: cumulative_interest,
        total_principal_paid: cumulative_principal,
        actual_payoff_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compounding::{effective_monthly_rate, monthly_payment};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params(principal: Money, annual_rate: Rate, months: u32) -> ScheduleParams {
        let rate = effective_monthly_rate(annual_rate).unwrap();
        let payment = monthly_payment(principal, rate, months).unwrap();
        ScheduleParams {
            starting_balance: principal,
            monthly_rate: rate,
            scheduled_payment: payment,
            horizon_months: months,
            start_date: date(2024, 1, 1),
            extras: ExtraPayments::none(),
            gap: None,
            gap_policy: GapPolicy::default(),
        }
    }

    #[test]
    fn test_capital_conservation() {
        // sum(interest) + principal == sum(payments + extras)
        let p = params(dec!(500000), dec!(0.0199), 300);
        let schedule = build_schedule(&p).unwrap();

        let paid: Money = schedule
            .records
            .iter()
            .map(|r| r.scheduled_payment + r.extra_principal_applied)
            .sum();
        let interest: Money = schedule.records.iter().map(|r| r.interest_portion).sum();

        assert!((interest + dec!(500000) - paid).abs() < dec!(0.000001));
        assert_eq!(schedule.total_interest_paid, interest);
        assert!((schedule.total_principal_paid - dec!(500000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_balance_non_increasing_and_terminal_zero() {
        let p = params(dec!(500000), dec!(0.05), 300);
        let schedule = build_schedule(&p).unwrap();

        let mut previous = p.starting_balance;
        for record in &schedule.records {
            assert!(record.ending_balance <= previous);
            previous = record.ending_balance;
        }
        assert_eq!(schedule.records.last().unwrap().ending_balance, dec!(0));
        assert_eq!(schedule.actual_payoff_month, Some(300));
    }

    #[test]
    fn test_balance_recurrence_holds() {
        let p = params(dec!(400000), dec!(0.04), 300);
        let schedule = build_schedule(&p).unwrap();

        let mut previous = p.starting_balance;
        for record in &schedule.records {
            let expected = previous
                - record.scheduled_principal_portion
                - record.extra_principal_applied;
            assert_eq!(record.ending_balance, expected);
            previous = record.ending_balance;
        }
    }

    #[test]
    fn test_interest_decreases_over_time() {
        let p = params(dec!(500000), dec!(0.05), 300);
        let schedule = build_schedule(&p).unwrap();
        assert!(
            schedule.records[0].interest_portion > schedule.records[59].interest_portion
        );
    }

    #[test]
    fn test_first_payment_date_one_month_after_start() {
        let mut p = params(dec!(500000), dec!(0.05), 300);
        p.start_date = date(2024, 1, 15);
        let schedule = build_schedule(&p).unwrap();
        assert_eq!(schedule.records[0].date, date(2024, 2, 15));
    }

    #[test]
    fn test_year_end_rollover_and_day_clamping() {
        let mut p = params(dec!(500000), dec!(0.05), 300);
        p.start_date = date(2023, 12, 20);
        let schedule = build_schedule(&p).unwrap();
        assert_eq!(schedule.records[0].date, date(2024, 1, 20));

        p.start_date = date(2024, 1, 31);
        let schedule = build_schedule(&p).unwrap();
        // January 31 + 1 month clamps to leap-year February 29.
        assert_eq!(schedule.records[0].date, date(2024, 2, 29));
    }

    #[test]
    fn test_zero_rate_schedule_is_straight_line() {
        let p = ScheduleParams {
            starting_balance: dec!(120000),
            monthly_rate: dec!(0),
            scheduled_payment: dec!(1000),
            horizon_months: 120,
            start_date: date(2024, 1, 1),
            extras: ExtraPayments::none(),
            gap: None,
            gap_policy: GapPolicy::default(),
        };
        let schedule = build_schedule(&p).unwrap();
        assert_eq!(schedule.actual_payoff_month, Some(120));
        assert_eq!(schedule.total_interest_paid, dec!(0));
        assert_eq!(schedule.records[0].ending_balance, dec!(119000));
    }

    #[test]
    fn test_extra_annual_payment_shortens_schedule() {
        let base = params(dec!(400000), dec!(0.05), 300);
        let plain = build_schedule(&base).unwrap();

        let mut accelerated = base.clone();
        accelerated.extras.annual = dec!(40000);
        let fast = build_schedule(&accelerated).unwrap();

        let plain_months = plain.months_to_payoff().unwrap();
        let fast_months = fast.months_to_payoff().unwrap();
        assert!(fast_months < plain_months);
        assert!(fast.total_interest_paid < plain.total_interest_paid);
        // 10% annual prepayment should shave more than five years.
        assert!(plain_months - fast_months > 60);
    }

    #[test]
    fn test_extra_annual_lands_on_anniversaries_only() {
        let mut p = params(dec!(400000), dec!(0.04), 300);
        p.extras.annual = dec!(12000);
        let schedule = build_schedule(&p).unwrap();

        for record in schedule.records.iter().take(30) {
            if record.month_index % 12 == 0 {
                assert_eq!(record.extra_principal_applied, dec!(12000));
            } else {
                assert_eq!(record.extra_principal_applied, dec!(0));
            }
        }
    }

    #[test]
    fn test_extra_monthly_payment_applied_every_month() {
        let mut p = params(dec!(400000), dec!(0.04), 300);
        p.extras.monthly = dec!(500);
        let schedule = build_schedule(&p).unwrap();

        for record in schedule.records.iter().take(12) {
            assert_eq!(record.extra_principal_applied, dec!(500));
        }
        assert!(schedule.months_to_payoff().unwrap() < 300);
    }

    #[test]
    fn test_gap_capitalizes_interest() {
        let base = params(dec!(500000), dec!(0.05), 300);
        let plain = build_schedule(&base).unwrap();

        let mut gapped = base.clone();
        gapped.gap = Some(GapWindow {
            start: date(2024, 6, 1),
            end: date(2024, 8, 31),
        });
        let schedule = build_schedule(&gapped).unwrap();

        // Payments dated Jun, Jul, Aug 2024 fall inside the window.
        let gap_months: Vec<&PaymentRecord> = schedule
            .records
            .iter()
            .filter(|r| r.scheduled_payment == dec!(0))
            .collect();
        assert_eq!(gap_months.len(), 3);
        for record in &gap_months {
            assert!(record.interest_portion > dec!(0));
            assert_eq!(record.scheduled_principal_portion, dec!(0));
        }

        // Balance after the gap is strictly higher than the gap-free run.
        let after_gap = gap_months.last().unwrap().month_index as usize;
        assert!(
            schedule.records[after_gap].ending_balance
                > plain.records[after_gap].ending_balance
        );
        // Gap months grow the balance by exactly the accrued interest.
        let first_gap = gap_months[0];
        let before = schedule.records[first_gap.month_index as usize - 2].ending_balance;
        assert_eq!(first_gap.ending_balance, before + first_gap.interest_portion);
    }

    #[test]
    fn test_gap_pause_policy_freezes_balance() {
        let mut p = params(dec!(500000), dec!(0.05), 300);
        p.gap = Some(GapWindow {
            start: date(2024, 6, 1),
            end: date(2024, 8, 31),
        });
        p.gap_policy = GapPolicy::PauseAmortization;
        let schedule = build_schedule(&p).unwrap();

        for record in &schedule.records {
            if record.scheduled_payment == dec!(0) {
                assert_eq!(record.interest_portion, dec!(0));
                let before = schedule.records[record.month_index as usize - 2].ending_balance;
                assert_eq!(record.ending_balance, before);
            }
        }
    }

    #[test]
    fn test_negative_amortization_rejected() {
        let p = ScheduleParams {
            starting_balance: dec!(100000),
            monthly_rate: dec!(0.004),
            scheduled_payment: dec!(100),
            horizon_months: 300,
            start_date: date(2024, 1, 1),
            extras: ExtraPayments::none(),
            gap: None,
            gap_policy: GapPolicy::default(),
        };
        let err = build_schedule(&p).unwrap_err();
        assert!(matches!(
            err,
            MortgageError::NegativeAmortization { month: 2, .. }
        ));
    }

    #[test]
    fn test_payment_equal_to_interest_stalls() {
        // Payment exactly covers interest: zero progress, never amortizes.
        let p = ScheduleParams {
            starting_balance: dec!(100000),
            monthly_rate: dec!(0.001),
            scheduled_payment: dec!(100),
            horizon_months: 300,
            start_date: date(2024, 1, 1),
            extras: ExtraPayments::none(),
            gap: None,
            gap_policy: GapPolicy::default(),
        };
        assert!(matches!(
            build_schedule(&p),
            Err(MortgageError::NegativeAmortization { .. })
        ));
    }

    #[test]
    fn test_extra_payment_can_rescue_underwater_payment() {
        // Payment below interest, but the extra monthly payment keeps the
        // balance moving toward payoff.
        let p = ScheduleParams {
            starting_balance: dec!(100000),
            monthly_rate: dec!(0.004),
            scheduled_payment: dec!(100),
            horizon_months: 600,
            start_date: date(2024, 1, 1),
            extras: ExtraPayments {
                monthly: dec!(1000),
                annual: dec!(0),
                anniversary_offset: 0,
            },
            gap: None,
            gap_policy: GapPolicy::default(),
        };
        let schedule = build_schedule(&p).unwrap();
        assert!(schedule.records[0].ending_balance < dec!(100000));
    }

    #[test]
    fn test_negative_extra_payment_rejected() {
        let mut p = params(dec!(400000), dec!(0.04), 300);
        p.extras.monthly = dec!(-1);
        assert!(matches!(
            build_schedule(&p),
            Err(MortgageError::ExcessPaydown { .. })
        ));
    }

    #[test]
    fn test_inverted_gap_rejected() {
        let mut p = params(dec!(400000), dec!(0.04), 300);
        p.gap = Some(GapWindow {
            start: date(2025, 1, 1),
            end: date(2024, 1, 1),
        });
        assert!(matches!(
            build_schedule(&p),
            Err(MortgageError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn test_annual_summaries_roll_up_schedule() {
        let p = params(dec!(500000), dec!(0.05), 300);
        let schedule = build_schedule(&p).unwrap();
        let years = schedule.annual_summaries();

        assert_eq!(years.len(), 25);
        assert_eq!(years[0].year_index, 1);
        assert_eq!(years[0].ending_balance, schedule.records[11].ending_balance);
        assert_eq!(years.last().unwrap().ending_balance, dec!(0));
        assert!(years[0].interest_paid > years[10].interest_paid);

        let interest: Money = years.iter().map(|y| y.interest_paid).sum();
        let principal: Money = years.iter().map(|y| y.principal_paid).sum();
        assert_eq!(interest, schedule.total_interest_paid);
        assert_eq!(principal, schedule.total_principal_paid);
    }

    #[test]
    fn test_gapped_horizon_reports_no_payoff() {
        // Three capitalized gap months leave a positive balance at month
        // 300; that must not read as a 300-month payoff.
        let mut p = params(dec!(500000), dec!(0.05), 300);
        p.gap = Some(GapWindow {
            start: date(2024, 6, 1),
            end: date(2024, 8, 31),
        });
        let schedule = build_schedule(&p).unwrap();
        assert_eq!(schedule.months_to_payoff(), None);
        assert_eq!(schedule.len(), 300);
        assert!(schedule.records.last().unwrap().ending_balance > dec!(0));
    }

    #[test]
    fn test_settled_schedule() {
        let schedule = AmortizationSchedule::settled();
        assert!(schedule.is_empty());
        assert_eq!(schedule.months_to_payoff(), Some(0));
        assert_eq!(schedule.total_interest_paid, dec!(0));
    }
}
