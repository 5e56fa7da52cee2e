pub mod planner;
pub mod scenario;

pub use planner::{PlannerOutput, RenewalPlanner, DEFAULT_PAYDOWN_STEP};
pub use scenario::{PlannerRow, RenewalScenario, ScenarioDefinition, ScenarioOutcome};
