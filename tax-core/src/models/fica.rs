use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Payroll tax constants (employee share).
///
/// For 2025, MFJ: 6.2% Social Security up to $176,100 of wages, 1.45%
/// Medicare on all wages, and a 0.9% additional Medicare surtax on wages
/// above $250,000.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaConfig {
    pub social_security_rate: Decimal,
    /// Annual wages above which Social Security stops.
    pub social_security_wage_base: Decimal,
    pub medicare_rate: Decimal,
    pub additional_medicare_rate: Decimal,
    /// Filing-status dependent threshold for the additional Medicare surtax.
    pub additional_medicare_threshold: Decimal,
}

impl FicaConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - any rate is outside `[0, 1]`
    /// - the wage base is not positive
    /// - the additional Medicare threshold is negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range(
            "social security rate",
            self.social_security_rate,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        ConfigError::check_positive("social security wage base", self.social_security_wage_base)?;
        ConfigError::check_range("medicare rate", self.medicare_rate, Decimal::ZERO, Decimal::ONE)?;
        ConfigError::check_range(
            "additional medicare rate",
            self.additional_medicare_rate,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        ConfigError::check_non_negative(
            "additional medicare threshold",
            self.additional_medicare_threshold,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn config_2025_mfj() -> FicaConfig {
        FicaConfig {
            social_security_rate: dec!(0.062),
            social_security_wage_base: dec!(176100),
            medicare_rate: dec!(0.0145),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_threshold: dec!(250000),
        }
    }

    #[test]
    fn validate_accepts_2025_values() {
        assert_eq!(config_2025_mfj().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let config = FicaConfig {
            medicare_rate: dec!(1.45),
            ..config_2025_mfj()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "medicare rate",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_zero_wage_base() {
        let config = FicaConfig {
            social_security_wage_base: dec!(0),
            ..config_2025_mfj()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "social security wage base",
                value: dec!(0)
            })
        );
    }

    #[test]
    fn validate_rejects_negative_threshold() {
        let config = FicaConfig {
            additional_medicare_threshold: dec!(-1),
            ..config_2025_mfj()
        };

        assert!(config.validate().is_err());
    }
}
