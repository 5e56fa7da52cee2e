use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_core::amortization::{
    ExtraPayments, GapPolicy, GapWindow, MortgageModel, MortgageTerms,
};
use mortgage_core::compounding::{effective_monthly_rate, monthly_payment};

/// Arguments for monthly payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Mortgage principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a decimal (e.g. 0.0499 for 4.99%)
    #[arg(long)]
    pub rate: Decimal,

    /// Amortization period in months (e.g. 300 for 25 years)
    #[arg(long)]
    pub amortization_months: u32,
}

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Mortgage principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Decimal,

    /// Amortization period in months
    #[arg(long)]
    pub amortization_months: u32,

    /// Current term length in months
    #[arg(long, default_value = "60")]
    pub term_months: u32,

    /// Mortgage start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Extra payment applied to principal every month
    #[arg(long, default_value = "0")]
    pub extra_monthly: Decimal,

    /// Extra lump sum applied on each 12-month anniversary
    #[arg(long, default_value = "0")]
    pub extra_annual: Decimal,

    /// Start of a payment gap (YYYY-MM-DD); requires --gap-end
    #[arg(long, requires = "gap_end")]
    pub gap_start: Option<NaiveDate>,

    /// End of a payment gap (YYYY-MM-DD); requires --gap-start
    #[arg(long, requires = "gap_start")]
    pub gap_end: Option<NaiveDate>,

    /// Pause amortization during the gap instead of capitalizing interest
    #[arg(long)]
    pub pause_gap_interest: bool,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let monthly_rate = effective_monthly_rate(args.rate)?;
    let payment = monthly_payment(args.principal, monthly_rate, args.amortization_months)?;

    Ok(serde_json::json!({
        "principal": args.principal.to_string(),
        "annual_rate": args.rate.to_string(),
        "effective_monthly_rate": monthly_rate.round_dp(8).to_string(),
        "amortization_months": args.amortization_months,
        "monthly_payment": payment.round_dp(2).to_string(),
    }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let gap = match (args.gap_start, args.gap_end) {
        (Some(start), Some(end)) => Some(GapWindow { start, end }),
        _ => None,
    };
    let model = MortgageModel::new(MortgageTerms {
        original_principal: args.principal,
        annual_rate: args.rate,
        amortization_months: args.amortization_months,
        term_months: args.term_months,
        start_date: args.start_date,
        mortgage_gap: gap,
    })?;

    let extras = ExtraPayments {
        monthly: args.extra_monthly,
        annual: args.extra_annual,
        anniversary_offset: 0,
    };
    let policy = if args.pause_gap_interest {
        GapPolicy::PauseAmortization
    } else {
        GapPolicy::CapitalizeInterest
    };
    let schedule = model.build_schedule_with(extras, policy)?;
    // Term-end balance must come from the schedule being displayed, not a
    // plain rebuild; extras and the gap policy change it.
    let term_balance = schedule
        .record_at(args.term_months.min(schedule.len() as u32))
        .map(|r| r.ending_balance)
        .unwrap_or(Decimal::ZERO);

    let rows: Vec<Value> = schedule
        .records
        .iter()
        .map(|r| {
            serde_json::json!({
                "month": r.month_index,
                "date": r.date,
                "payment": r.scheduled_payment.round_dp(2).to_string(),
                "interest": r.interest_portion.round_dp(2).to_string(),
                "principal": r.scheduled_principal_portion.round_dp(2).to_string(),
                "extra": r.extra_principal_applied.round_dp(2).to_string(),
                "balance": r.ending_balance.round_dp(2).to_string(),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "monthly_payment": model.scheduled_payment().round_dp(2).to_string(),
        "months_to_payoff": schedule.months_to_payoff(),
        "total_interest_paid": schedule.total_interest_paid.round_dp(2).to_string(),
        "total_principal_paid": schedule.total_principal_paid.round_dp(2).to_string(),
        "balance_at_term_end": term_balance.round_dp(2).to_string(),
        "rows": rows,
    }))
}
