//! Tax projection and contribution calculators.
//!
//! Leaves first: [`brackets`] and [`fica`] feed [`projection`]; the
//! [`optimizer`] and [`quarterly`] calculators consume projections; [`rsu`]
//! is independent and feeds recognized income back into a projection.

pub mod brackets;
pub mod common;
pub mod fica;
pub mod optimizer;
pub mod projection;
pub mod quarterly;
pub mod rsu;

pub use brackets::{BracketCalculator, BracketContribution, BracketTaxResult, tax};
pub use fica::{FicaBreakdown, FicaCalculator, fica};
pub use optimizer::{
    ContributionOptimizer, ContributionScenario, OptimizerInput, OptimizerResult, PeriodProjection,
    SavingsBasis, TaxSavingsMethod,
};
pub use projection::{
    JurisdictionMarginalRate, JurisdictionTax, MarginalRates, ProjectionInput, ProjectionResult,
    TaxCredit, TaxProjector, Withholding,
};
pub use quarterly::{
    InstallmentAmount, PriorYear, QuarterlyEstimate, QuarterlyEstimator, QuarterlySchedule,
    SafeHarbor, split_annual,
};
pub use rsu::{
    RsuIncome, RsuVestingSummary, ScheduleWarning, income_for_year,
    prepare_event, summarize, validate_schedule,
};
