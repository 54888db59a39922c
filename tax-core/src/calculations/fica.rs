//! Employee-side payroll taxes.
//!
//! | Component           | Base                               |
//! |---------------------|------------------------------------|
//! | Social Security     | `min(wages, wage_base) × ss_rate`  |
//! | Medicare            | `wages × medicare_rate`            |
//! | Additional Medicare | `max(0, wages − threshold) × rate` |
//!
//! Each component is rounded half-up to the cent; the total is their sum.
//! Wages must be wage income only; the calculator cannot tell otherwise.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{max, min, round_half_up};
use crate::error::{CalculationError, require_non_negative};
use crate::models::FicaConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaBreakdown {
    pub wages: Decimal,
    pub social_security: Decimal,
    pub medicare: Decimal,
    pub additional_medicare: Decimal,
    pub total: Decimal,
}

pub struct FicaCalculator<'a> {
    config: &'a FicaConfig,
}

impl<'a> FicaCalculator<'a> {
    pub fn new(config: &'a FicaConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// * [`CalculationError::Configuration`] if the constants fail validation.
    /// * [`CalculationError::InvalidInput`] if `wages` is negative.
    pub fn calculate(
        &self,
        wages: Decimal,
    ) -> Result<FicaBreakdown, CalculationError> {
        self.config.validate()?;
        require_non_negative("wages", wages)?;

        let social_security = self.social_security(wages);
        let medicare = round_half_up(wages * self.config.medicare_rate);
        let additional_medicare = self.additional_medicare(wages);
        let total = social_security + medicare + additional_medicare;

        debug!(
            wages = %wages,
            social_security = %social_security,
            medicare = %medicare,
            additional_medicare = %additional_medicare,
            "FICA computed"
        );

        Ok(FicaBreakdown {
            wages,
            social_security,
            medicare,
            additional_medicare,
            total,
        })
    }

    /// Combined payroll rate on the next dollar of `wages`.
    pub fn marginal_rate(
        &self,
        wages: Decimal,
    ) -> Decimal {
        let mut rate = self.config.medicare_rate;
        if wages < self.config.social_security_wage_base {
            rate += self.config.social_security_rate;
        }
        if wages >= self.config.additional_medicare_threshold {
            rate += self.config.additional_medicare_rate;
        }
        rate
    }

    fn social_security(
        &self,
        wages: Decimal,
    ) -> Decimal {
        let capped = min(wages, self.config.social_security_wage_base);
        round_half_up(capped * self.config.social_security_rate)
    }

    fn additional_medicare(
        &self,
        wages: Decimal,
    ) -> Decimal {
        let excess = max(Decimal::ZERO, wages - self.config.additional_medicare_threshold);
        round_half_up(excess * self.config.additional_medicare_rate)
    }
}

/// FICA on `wages` under `config`.
pub fn fica(
    wages: Decimal,
    config: &FicaConfig,
) -> Result<FicaBreakdown, CalculationError> {
    FicaCalculator::new(config).calculate(wages)
}
