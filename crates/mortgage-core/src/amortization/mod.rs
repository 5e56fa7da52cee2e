pub mod model;
pub mod schedule;

pub use model::{MortgageModel, MortgageTerms, RenewalSnapshot, Snapshot};
pub use schedule::{
    build_schedule, AmortizationSchedule, AnnualSummary, ExtraPayments, GapPolicy, GapWindow,
    PaymentRecord, ScheduleParams,
};
