//! 401(k) contribution pacing.
//!
//! Finds the contribution percent that reaches the statutory limit by the last
//! paycheck without going over, and estimates what the contributions save in
//! tax.
//!
//! | Quantity                 | Definition                                           |
//! |--------------------------|------------------------------------------------------|
//! | max contribution         | base limit, plus catch-up at or after the catch-up age |
//! | remaining room           | `max(0, max − ytd)`                                  |
//! | per-period salary        | `annual salary ÷ pay periods per year`               |
//! | recommended percent      | largest step-grid percent whose projection fits      |
//! | projected year-end total | `min(max, ytd + per-period × pct ÷ 100 × periods)`   |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::common::{floor_to_step, max, min, round_half_up};
use crate::calculations::projection::{ProjectionInput, TaxProjector};
use crate::error::{CalculationError, Component, require_non_negative};
use crate::models::RetirementPlanConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerInput {
    pub annual_salary: Decimal,
    pub current_contribution_percent: Decimal,
    pub ytd_contribution: Decimal,
    pub remaining_pay_periods: u32,
    pub age: u32,
}

/// How tax savings are estimated.
#[derive(Debug, Clone, Copy)]
pub enum TaxSavingsMethod<'a> {
    /// `projected contribution × rate`.
    FlatRate(Decimal),
    /// Exact difference between projections without and with the projected
    /// contribution as a pre-tax deduction.
    Differential {
        projector: &'a TaxProjector<'a>,
        base: &'a ProjectionInput,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SavingsBasis {
    FlatRate {
        rate: Decimal,
    },
    Differential {
        tax_without_contribution: Decimal,
        tax_with_contribution: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerResult {
    pub current_contribution_percent: Decimal,
    pub recommended_percent: Decimal,
    pub max_contribution: Decimal,
    pub catch_up_eligible: bool,
    pub remaining_room: Decimal,
    pub per_period_salary: Decimal,
    pub projected_year_end_contribution: Decimal,
    pub tax_savings: Decimal,
    pub savings_basis: SavingsBasis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodProjection {
    pub period: u32,
    pub contribution: Decimal,
    pub cumulative: Decimal,
    pub remaining_room: Decimal,
}

/// Paycheck-by-paycheck projection at a fixed percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionScenario {
    pub contribution_percent: Decimal,
    pub max_contribution: Decimal,
    pub catch_up_eligible: bool,
    pub per_period_contribution: Decimal,
    pub periods: Vec<PeriodProjection>,
    pub final_contribution: Decimal,
    pub will_max_out: bool,
    /// First remaining period at which the cumulative total reaches the cap.
    pub max_out_period: Option<u32>,
}

pub struct ContributionOptimizer<'a> {
    plan: &'a RetirementPlanConfig,
}

impl<'a> ContributionOptimizer<'a> {
    pub fn new(plan: &'a RetirementPlanConfig) -> Self {
        Self { plan }
    }

    pub fn max_contribution(
        &self,
        age: u32,
    ) -> Decimal {
        self.plan.max_contribution(age)
    }

    /// Recommends a contribution percent and estimates its tax savings.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::Configuration`] if the plan constants are invalid.
    /// * [`CalculationError::InvalidInput`] for a negative salary, YTD amount,
    ///   or percent, a percent above 100, or more remaining pay periods than
    ///   the plan year has.
    /// * Any projection error from the differential method, wrapped with
    ///   [`Component::Optimizer`].
    pub fn optimize(
        &self,
        input: &OptimizerInput,
        savings: TaxSavingsMethod<'_>,
    ) -> Result<OptimizerResult, CalculationError> {
        self.plan.validate()?;
        self.validate_input(input)?;

        let max_contribution = self.max_contribution(input.age);
        let remaining_room = max(Decimal::ZERO, max_contribution - input.ytd_contribution);
        let per_period_salary = self.per_period_salary(input.annual_salary);
        let recommended_percent = self.recommended_percent(input, remaining_room, per_period_salary);
        let projected_year_end_contribution = Self::projected_year_end(
            input,
            recommended_percent,
            per_period_salary,
            max_contribution,
        );
        let (tax_savings, savings_basis) = Self::tax_savings(projected_year_end_contribution, savings)?;

        info!(
            age = input.age,
            max_contribution = %max_contribution,
            remaining_room = %remaining_room,
            recommended_percent = %recommended_percent,
            projected = %projected_year_end_contribution,
            "401(k) recommendation computed"
        );

        Ok(OptimizerResult {
            current_contribution_percent: input.current_contribution_percent,
            recommended_percent,
            max_contribution,
            catch_up_eligible: self.plan.catch_up_eligible(input.age),
            remaining_room,
            per_period_salary: round_half_up(per_period_salary),
            projected_year_end_contribution,
            tax_savings,
            savings_basis,
        })
    }

    /// Projects the remaining paychecks at `input.current_contribution_percent`.
    /// Contributions stop once the cap is reached.
    pub fn scenario(
        &self,
        input: &OptimizerInput,
    ) -> Result<ContributionScenario, CalculationError> {
        self.plan.validate()?;
        self.validate_input(input)?;

        let max_contribution = self.max_contribution(input.age);
        let per_period_contribution = round_half_up(
            self.per_period_salary(input.annual_salary) * input.current_contribution_percent
                / Decimal::ONE_HUNDRED,
        );

        let mut cumulative = input.ytd_contribution;
        let mut max_out_period = None;
        let mut periods = Vec::with_capacity(input.remaining_pay_periods as usize);

        for period in 1..=input.remaining_pay_periods {
            let room = max(Decimal::ZERO, max_contribution - cumulative);
            let contribution = min(per_period_contribution, room);
            cumulative += contribution;
            if max_out_period.is_none() && cumulative >= max_contribution {
                max_out_period = Some(period);
            }
            periods.push(PeriodProjection {
                period,
                contribution,
                cumulative,
                remaining_room: max(Decimal::ZERO, max_contribution - cumulative),
            });
        }

        debug!(
            percent = %input.current_contribution_percent,
            final_contribution = %cumulative,
            max_out_period = ?max_out_period,
            "Contribution scenario projected"
        );

        Ok(ContributionScenario {
            contribution_percent: input.current_contribution_percent,
            max_contribution,
            catch_up_eligible: self.plan.catch_up_eligible(input.age),
            per_period_contribution,
            periods,
            final_contribution: cumulative,
            will_max_out: cumulative >= max_contribution,
            max_out_period,
        })
    }

    fn validate_input(
        &self,
        input: &OptimizerInput,
    ) -> Result<(), CalculationError> {
        require_non_negative("annual_salary", input.annual_salary)?;
        require_non_negative("ytd_contribution", input.ytd_contribution)?;
        require_non_negative("contribution_percent", input.current_contribution_percent)?;
        if input.current_contribution_percent > Decimal::ONE_HUNDRED {
            return Err(CalculationError::invalid(
                "contribution_percent",
                format!(
                    "must not exceed 100, got {}",
                    input.current_contribution_percent
                ),
            ));
        }
        if input.remaining_pay_periods > self.plan.pay_periods_per_year {
            return Err(CalculationError::invalid(
                "remaining_pay_periods",
                format!(
                    "{} exceeds the {} pay periods in a year",
                    input.remaining_pay_periods, self.plan.pay_periods_per_year
                ),
            ));
        }
        Ok(())
    }

    fn per_period_salary(
        &self,
        annual_salary: Decimal,
    ) -> Decimal {
        annual_salary / Decimal::from(self.plan.pay_periods_per_year)
    }

    fn recommended_percent(
        &self,
        input: &OptimizerInput,
        remaining_room: Decimal,
        per_period_salary: Decimal,
    ) -> Decimal {
        if input.remaining_pay_periods == 0 || per_period_salary.is_zero() {
            debug!("No remaining pay periods or salary; keeping current percent");
            return input.current_contribution_percent;
        }
        if remaining_room.is_zero() {
            return Decimal::ZERO;
        }

        let remaining_salary = per_period_salary * Decimal::from(input.remaining_pay_periods);
        let needed = remaining_room / remaining_salary * Decimal::ONE_HUNDRED;
        let capped = min(needed, self.plan.max_contribution_percent);
        floor_to_step(capped, self.plan.contribution_percent_step)
    }

    fn projected_year_end(
        input: &OptimizerInput,
        percent: Decimal,
        per_period_salary: Decimal,
        max_contribution: Decimal,
    ) -> Decimal {
        let future = per_period_salary * percent / Decimal::ONE_HUNDRED
            * Decimal::from(input.remaining_pay_periods);
        round_half_up(min(max_contribution, input.ytd_contribution + future))
    }

    fn tax_savings(
        projected: Decimal,
        method: TaxSavingsMethod<'_>,
    ) -> Result<(Decimal, SavingsBasis), CalculationError> {
        match method {
            TaxSavingsMethod::FlatRate(rate) => {
                if rate < Decimal::ZERO || rate > Decimal::ONE {
                    return Err(CalculationError::invalid(
                        "marginal_rate",
                        format!("must be between 0 and 1, got {rate}"),
                    ));
                }
                Ok((round_half_up(projected * rate), SavingsBasis::FlatRate { rate }))
            }
            TaxSavingsMethod::Differential { projector, base } => {
                let wrap = |e: CalculationError| e.within(Component::Optimizer, "tax savings");
                let without = projector
                    .project(&base.with_pre_tax_contributions(Decimal::ZERO))
                    .map_err(wrap)?;
                let with = projector
                    .project(&base.with_pre_tax_contributions(projected))
                    .map_err(wrap)?;
                Ok((
                    without.total_tax - with.total_tax,
                    SavingsBasis::Differential {
                        tax_without_contribution: without.total_tax,
                        tax_with_contribution: with.total_tax,
                    },
                ))
            }
        }
    }
}
