use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 401(k) plan limits and payroll constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementPlanConfig {
    /// Statutory elective deferral limit (2025: $23,500).
    pub elective_deferral_limit: Decimal,
    /// Extra allowance once `catch_up_age` is reached (2025: $7,500).
    pub catch_up_limit: Decimal,
    pub catch_up_age: u32,
    pub pay_periods_per_year: u32,
    /// Highest contribution percent the plan accepts.
    pub max_contribution_percent: Decimal,
    /// Granularity of contribution percents accepted by payroll.
    pub contribution_percent_step: Decimal,
    /// Flat rate used when tax savings are estimated without a projection.
    pub assumed_marginal_rate: Decimal,
}

impl RetirementPlanConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - a limit is negative
    /// - `pay_periods_per_year` is zero
    /// - `max_contribution_percent` is not in `(0, 100]`
    /// - `contribution_percent_step` is not positive
    /// - `assumed_marginal_rate` is not in `[0, 1]`
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("elective deferral limit", self.elective_deferral_limit)?;
        ConfigError::check_non_negative("catch-up limit", self.catch_up_limit)?;
        if self.pay_periods_per_year == 0 {
            return Err(ConfigError::ZeroPayPeriods);
        }
        ConfigError::check_positive("max contribution percent", self.max_contribution_percent)?;
        ConfigError::check_range(
            "max contribution percent",
            self.max_contribution_percent,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        ConfigError::check_positive("contribution percent step", self.contribution_percent_step)?;
        ConfigError::check_range(
            "assumed marginal rate",
            self.assumed_marginal_rate,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        Ok(())
    }

    pub fn catch_up_eligible(
        &self,
        age: u32,
    ) -> bool {
        age >= self.catch_up_age
    }

    /// Statutory maximum for someone of `age`, catch-up included when eligible.
    pub fn max_contribution(
        &self,
        age: u32,
    ) -> Decimal {
        if self.catch_up_eligible(age) {
            self.elective_deferral_limit + self.catch_up_limit
        } else {
            self.elective_deferral_limit
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn plan_2025() -> RetirementPlanConfig {
        RetirementPlanConfig {
            elective_deferral_limit: dec!(23500),
            catch_up_limit: dec!(7500),
            catch_up_age: 50,
            pay_periods_per_year: 26,
            max_contribution_percent: dec!(75),
            contribution_percent_step: dec!(0.1),
            assumed_marginal_rate: dec!(0.41),
        }
    }

    #[test]
    fn max_contribution_without_catch_up() {
        assert_eq!(plan_2025().max_contribution(49), dec!(23500));
    }

    #[test]
    fn max_contribution_with_catch_up_at_fifty() {
        assert_eq!(plan_2025().max_contribution(50), dec!(31000));
    }

    #[test]
    fn validate_accepts_2025_plan() {
        assert_eq!(plan_2025().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_pay_periods() {
        let plan = RetirementPlanConfig {
            pay_periods_per_year: 0,
            ..plan_2025()
        };

        assert_eq!(plan.validate(), Err(ConfigError::ZeroPayPeriods));
    }

    #[test]
    fn validate_rejects_percent_above_hundred() {
        let plan = RetirementPlanConfig {
            max_contribution_percent: dec!(150),
            ..plan_2025()
        };

        assert!(matches!(plan.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn validate_rejects_zero_step() {
        let plan = RetirementPlanConfig {
            contribution_percent_step: dec!(0),
            ..plan_2025()
        };

        assert!(matches!(plan.validate(), Err(ConfigError::NotPositive { .. })));
    }
}
