use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use mortgage_core::amortization::{MortgageModel, MortgageTerms};
use mortgage_core::renewal::{RenewalPlanner, ScenarioDefinition};

use crate::input;

/// A complete renewal planning request, usually loaded from a file.
#[derive(Debug, Deserialize)]
pub struct RenewalRequest {
    pub mortgage: MortgageTerms,
    /// Assumed annual return if the paydown capital were invested instead.
    pub investment_rate: Decimal,
    pub max_paydown: Decimal,
    #[serde(default)]
    pub paydown_step: Option<Decimal>,
    pub scenarios: Vec<ScenarioDefinition>,
}

/// Arguments for renewal scenario analysis
#[derive(Args)]
pub struct RenewalArgs {
    /// Path to a JSON or YAML file with the full renewal request
    /// (mortgage terms, investment rate, paydown sweep, scenarios)
    #[arg(long)]
    pub input: Option<String>,

    /// Assumed annual investment return for opportunity-cost comparison
    /// (overrides the file value when given)
    #[arg(long)]
    pub investment_rate: Option<Decimal>,

    /// Maximum lump-sum paydown to sweep (overrides the file value)
    #[arg(long)]
    pub max_paydown: Option<Decimal>,

    /// Paydown sweep step (overrides the file value)
    #[arg(long)]
    pub paydown_step: Option<Decimal>,
}

pub fn run_renewal(args: RenewalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: RenewalRequest = if let Some(ref path) = args.input {
        input::read_request(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file is required (or pipe a request on stdin)".into());
    };

    if let Some(rate) = args.investment_rate {
        request.investment_rate = rate;
    }
    if let Some(max) = args.max_paydown {
        request.max_paydown = max;
    }
    if let Some(step) = args.paydown_step {
        request.paydown_step = Some(step);
    }

    let model = MortgageModel::new(request.mortgage)?;
    let planner = RenewalPlanner::new(&model, request.investment_rate)?;
    let analysis =
        planner.scenario_analysis(&request.scenarios, request.max_paydown, request.paydown_step)?;

    Ok(serde_json::to_value(analysis)?)
}
