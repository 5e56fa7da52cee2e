use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::amortization::{
    build_schedule, AmortizationSchedule, ExtraPayments, GapPolicy, MortgageModel,
    RenewalSnapshot, ScheduleParams,
};
use crate::compounding::{effective_monthly_rate, future_value, monthly_payment};
use crate::error::MortgageError;
use crate::renewal::scenario::{
    PlannerRow, RenewalScenario, ScenarioDefinition, ScenarioOutcome,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

/// Sweep granularity used when the caller does not supply one.
pub const DEFAULT_PAYDOWN_STEP: Money = dec!(25000);

/// Flat tabular result of a planning run. Replaced wholesale on each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub remaining_balance: Money,
    pub remaining_amortization_months: u32,
    pub rows: Vec<PlannerRow>,
}

/// Compares renewal scenarios against a conservative baseline, sweeping
/// lump-sum paydown amounts and weighing each against investing the same
/// capital at an assumed external rate.
///
/// The planner only ever sees the immutable term-end snapshot; it never
/// reaches back into the mortgage model it came from.
#[derive(Debug, Clone)]
pub struct RenewalPlanner {
    snapshot: RenewalSnapshot,
    investment_rate: Rate,
}

impl RenewalPlanner {
    pub fn new(model: &MortgageModel, investment_rate: Rate) -> MortgageResult<Self> {
        let snapshot = model.renewal_snapshot()?;
        Self::from_snapshot(snapshot, investment_rate)
    }

    pub fn from_snapshot(
        snapshot: RenewalSnapshot,
        investment_rate: Rate,
    ) -> MortgageResult<Self> {
        if snapshot.remaining_balance <= Decimal::ZERO {
            return Err(MortgageError::InvalidTerm {
                reason: "mortgage is already retired at renewal; nothing to plan".into(),
            });
        }
        if snapshot.remaining_amortization_months == 0 {
            return Err(MortgageError::InvalidTerm {
                reason: "no amortization remaining after the current term".into(),
            });
        }
        if investment_rate < Decimal::ZERO {
            return Err(MortgageError::InvalidRate {
                rate: investment_rate,
                reason: "assumed investment rate must be non-negative".into(),
            });
        }
        Ok(Self {
            snapshot,
            investment_rate,
        })
    }

    pub fn snapshot(&self) -> &RenewalSnapshot {
        &self.snapshot
    }

    /// Evaluate every scenario across the paydown sweep
    /// `0, step, 2·step, … max_paydown`, plus each scenario's own paydown.
    ///
    /// Rows come back in scenario order, ascending by paydown, each keyed
    /// uniquely by (scenario_name, paydown_amount).
    pub fn scenario_analysis(
        &self,
        scenarios: &[ScenarioDefinition],
        max_paydown: Money,
        paydown_step: Option<Money>,
    ) -> MortgageResult<ComputationOutput<PlannerOutput>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        if scenarios.is_empty() {
            return Err(MortgageError::InvalidScenario {
                name: String::new(),
                reason: "at least one scenario is required".into(),
            });
        }

        let mut seen = HashSet::new();
        for definition in scenarios {
            definition.validate()?;
            if !seen.insert(definition.name.as_str()) {
                return Err(MortgageError::InvalidScenario {
                    name: definition.name.clone(),
                    reason: "scenario names must be unique within a planning run".into(),
                });
            }
        }

        let remaining = self.snapshot.remaining_balance;
        if max_paydown < Decimal::ZERO {
            return Err(MortgageError::InvalidTerms {
                field: "max_paydown".into(),
                reason: format!("must be non-negative, got {max_paydown}"),
            });
        }
        if max_paydown > remaining {
            return Err(MortgageError::Overpaydown {
                paydown: max_paydown,
                remaining,
            });
        }
        for definition in scenarios {
            if definition.principal_paydown > remaining {
                return Err(MortgageError::Overpaydown {
                    paydown: definition.principal_paydown,
                    remaining,
                });
            }
        }

        let step = paydown_step.unwrap_or(DEFAULT_PAYDOWN_STEP);
        if step <= Decimal::ZERO {
            return Err(MortgageError::InvalidTerms {
                field: "paydown_step".into(),
                reason: format!("must be positive, got {step}"),
            });
        }

        let base_points = sweep_points(max_paydown, step);
        let mut rows = Vec::new();

        for definition in scenarios {
            // Conservative baseline: same rate, no paydown, no extras.
            let baseline = self.evaluate(definition, Decimal::ZERO, true, Decimal::ZERO)?;
            let baseline_interest = baseline.outcome.total_interest_paid;

            let mut points = base_points.clone();
            if definition.principal_paydown > Decimal::ZERO
                && !points.contains(&definition.principal_paydown)
            {
                points.push(definition.principal_paydown);
                points.sort();
            }

            for paydown in points {
                if paydown == remaining {
                    warnings.push(format!(
                        "scenario '{}': paydown of {} retires the mortgage at renewal",
                        definition.name, paydown
                    ));
                }
                let scenario = self.evaluate(definition, paydown, false, baseline_interest)?;
                rows.push(scenario.to_row());
            }
        }

        let output = PlannerOutput {
            remaining_balance: remaining,
            remaining_amortization_months: self.snapshot.remaining_amortization_months,
            rows,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Renewal Scenario Paydown Sweep",
            &serde_json::json!({
                "renewal_date": self.snapshot.renewal_date,
                "remaining_balance": remaining.to_string(),
                "remaining_amortization_months": self.snapshot.remaining_amortization_months,
                "assumed_investment_rate": self.investment_rate.to_string(),
                "max_paydown": max_paydown.to_string(),
                "paydown_step": step.to_string(),
                "gap_interest_policy": "capitalize",
            }),
            warnings,
            elapsed,
            output,
        ))
    }

    /// Build one post-renewal mortgage variant and measure it.
    fn evaluate(
        &self,
        definition: &ScenarioDefinition,
        paydown: Money,
        as_baseline: bool,
        baseline_interest: Money,
    ) -> MortgageResult<RenewalScenario> {
        let remaining = self.snapshot.remaining_balance;
        if paydown > remaining {
            return Err(MortgageError::Overpaydown {
                paydown,
                remaining,
            });
        }
        let new_principal = remaining - paydown;

        let outcome = if new_principal.is_zero() {
            // Exact-balance paydown: immediate payoff, zero interest.
            ScenarioOutcome {
                new_principal,
                new_monthly_payment: Decimal::ZERO,
                resulting_schedule: AmortizationSchedule::settled(),
                total_interest_paid: Decimal::ZERO,
                months_to_payoff: 0,
                interest_saved_vs_baseline: baseline_interest,
                opportunity_cost: -baseline_interest,
            }
        } else {
            let monthly_rate = effective_monthly_rate(definition.new_rate)?;
            let horizon = self.snapshot.remaining_amortization_months;
            let payment = monthly_payment(new_principal, monthly_rate, horizon)?;
            let extras = if as_baseline {
                ExtraPayments::none()
            } else {
                ExtraPayments {
                    monthly: definition.extra_monthly_payment,
                    annual: definition.extra_annual_payment,
                    anniversary_offset: 0,
                }
            };
            let schedule = build_schedule(&ScheduleParams {
                starting_balance: new_principal,
                monthly_rate,
                scheduled_payment: payment,
                horizon_months: horizon,
                start_date: self.snapshot.renewal_date,
                extras,
                gap: None,
                gap_policy: GapPolicy::default(),
            })?;

            // Gap-free with a payment sized to the horizon, so the
            // schedule always retires within it.
            let months_to_payoff = schedule.months_to_payoff().unwrap_or(horizon);
            let total_interest_paid = schedule.total_interest_paid;
            let interest_saved = baseline_interest - total_interest_paid;
            let foregone_growth =
                future_value(paydown, self.investment_rate, months_to_payoff) - paydown;

            ScenarioOutcome {
                new_principal,
                new_monthly_payment: payment,
                resulting_schedule: schedule,
                total_interest_paid,
                months_to_payoff,
                interest_saved_vs_baseline: interest_saved,
                opportunity_cost: foregone_growth - interest_saved,
            }
        };

        Ok(RenewalScenario {
            name: definition.name.clone(),
            new_rate: definition.new_rate,
            paydown_amount: paydown,
            extra_monthly_payment: if as_baseline {
                Decimal::ZERO
            } else {
                definition.extra_monthly_payment
            },
            extra_annual_payment: if as_baseline {
                Decimal::ZERO
            } else {
                definition.extra_annual_payment
            },
            outcome,
        })
    }
}

/// Paydown sweep values from zero to `max_paydown`, always ending exactly
/// on `max_paydown` even when the step does not divide it.
fn sweep_points(max_paydown: Money, step: Money) -> Vec<Money> {
    let mut values = Vec::new();
    let mut current = Decimal::ZERO;
    while current <= max_paydown {
        values.push(current);
        current += step;
    }
    if let Some(&last) = values.last() {
        if last < max_paydown {
            values.push(max_paydown);
        }
    }
    values
}
