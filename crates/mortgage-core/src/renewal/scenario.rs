use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::AmortizationSchedule;
use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// One renewal hypothesis: the rate and prepayments a borrower could take
/// at the end of the current term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub new_rate: Rate,
    #[serde(default)]
    pub principal_paydown: Money,
    #[serde(default)]
    pub extra_monthly_payment: Money,
    #[serde(default)]
    pub extra_annual_payment: Money,
}

impl ScenarioDefinition {
    pub fn validate(&self) -> MortgageResult<()> {
        if self.name.trim().is_empty() {
            return Err(MortgageError::InvalidScenario {
                name: self.name.clone(),
                reason: "scenario name must not be empty".into(),
            });
        }
        if self.new_rate < Decimal::ZERO {
            return Err(MortgageError::InvalidRate {
                rate: self.new_rate,
                reason: format!("scenario '{}' has a negative renewal rate", self.name),
            });
        }
        if self.principal_paydown < Decimal::ZERO {
            return Err(MortgageError::InvalidScenario {
                name: self.name.clone(),
                reason: format!(
                    "principal paydown must be non-negative, got {}",
                    self.principal_paydown
                ),
            });
        }
        if self.extra_monthly_payment < Decimal::ZERO {
            return Err(MortgageError::ExcessPaydown {
                amount: self.extra_monthly_payment,
                reason: format!("scenario '{}' extra monthly payment is negative", self.name),
            });
        }
        if self.extra_annual_payment < Decimal::ZERO {
            return Err(MortgageError::ExcessPaydown {
                amount: self.extra_annual_payment,
                reason: format!("scenario '{}' extra annual payment is negative", self.name),
            });
        }
        Ok(())
    }
}

/// Computed result bundle for one (scenario, paydown) evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub new_principal: Money,
    pub new_monthly_payment: Money,
    pub resulting_schedule: AmortizationSchedule,
    pub total_interest_paid: Money,
    pub months_to_payoff: u32,
    pub interest_saved_vs_baseline: Money,
    /// Growth foregone by paying down instead of investing, net of interest
    /// avoided. Negative means the paydown wins.
    pub opportunity_cost: Money,
}

/// A renewal hypothesis together with its computed outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalScenario {
    pub name: String,
    pub new_rate: Rate,
    pub paydown_amount: Money,
    pub extra_monthly_payment: Money,
    pub extra_annual_payment: Money,
    pub outcome: ScenarioOutcome,
}

impl RenewalScenario {
    /// Flatten into a tabular row, dropping the full schedule.
    pub fn to_row(&self) -> PlannerRow {
        PlannerRow {
            scenario_name: self.name.clone(),
            paydown_amount: self.paydown_amount,
            new_rate: self.new_rate,
            new_principal: self.outcome.new_principal,
            new_monthly_payment: self.outcome.new_monthly_payment,
            extra_monthly_payment: self.extra_monthly_payment,
            extra_annual_payment: self.extra_annual_payment,
            months_to_payoff: self.outcome.months_to_payoff,
            total_interest_paid: self.outcome.total_interest_paid,
            interest_saved_vs_baseline: self.outcome.interest_saved_vs_baseline,
            opportunity_cost: self.outcome.opportunity_cost,
        }
    }
}

/// One row of the planner's tabular output, uniquely keyed by
/// (scenario_name, paydown_amount).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerRow {
    pub scenario_name: String,
    pub paydown_amount: Money,
    pub new_rate: Rate,
    pub new_principal: Money,
    pub new_monthly_payment: Money,
    pub extra_monthly_payment: Money,
    pub extra_annual_payment: Money,
    pub months_to_payoff: u32,
    pub total_interest_paid: Money,
    pub interest_saved_vs_baseline: Money,
    pub opportunity_cost: Money,
}
