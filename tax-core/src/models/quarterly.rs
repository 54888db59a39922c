use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, ConfigError, require_non_negative};

/// Estimated-payment quarter. Only 1 through 4 can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl TryFrom<u8> for Quarter {
    type Error = CalculationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            other => Err(CalculationError::invalid(
                "quarter",
                format!("must be between 1 and 4, got {other}"),
            )),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(quarter: Quarter) -> Self {
        quarter.number()
    }
}

impl fmt::Display for Quarter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// A payment the taxpayer recorded against one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyPayment {
    pub tax_year: i32,
    pub quarter: Quarter,
    pub amount: Decimal,
}

impl QuarterlyPayment {
    /// Validates a payment as entered: `quarter` must be 1–4 and `amount`
    /// non-negative.
    pub fn new(
        tax_year: i32,
        quarter: u8,
        amount: Decimal,
    ) -> Result<Self, CalculationError> {
        let quarter = Quarter::try_from(quarter)?;
        require_non_negative("amount", amount)?;
        Ok(Self {
            tax_year,
            quarter,
            amount,
        })
    }
}

/// Due dates and safe-harbor factors for estimated payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyConfig {
    pub due_dates: [NaiveDate; 4],
    /// Share of the current-year liability that satisfies safe harbor (0.90).
    pub current_year_factor: Decimal,
    /// Share of the prior-year liability that satisfies safe harbor above the
    /// AGI threshold, or when AGI is unknown (1.10).
    pub prior_year_factor: Decimal,
    /// Prior-year share at or under the AGI threshold (1.00).
    pub standard_prior_year_factor: Decimal,
    pub high_income_agi_threshold: Decimal,
    /// Whether FICA is part of the installment base. Payroll withholding
    /// normally covers it, so the default is income tax only.
    #[serde(default)]
    pub include_fica: bool,
}

impl QuarterlyConfig {
    pub fn due_date(
        &self,
        quarter: Quarter,
    ) -> NaiveDate {
        self.due_dates[quarter.index()]
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the due dates are not strictly increasing,
    /// a factor is outside `[0, 2]`, or the AGI threshold is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pair in self.due_dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ConfigError::DueDatesOutOfOrder {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        let two = Decimal::TWO;
        ConfigError::check_range(
            "current-year safe harbor factor",
            self.current_year_factor,
            Decimal::ZERO,
            two,
        )?;
        ConfigError::check_range(
            "prior-year safe harbor factor",
            self.prior_year_factor,
            Decimal::ZERO,
            two,
        )?;
        ConfigError::check_range(
            "standard prior-year safe harbor factor",
            self.standard_prior_year_factor,
            Decimal::ZERO,
            two,
        )?;
        ConfigError::check_non_negative("high-income AGI threshold", self.high_income_agi_threshold)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config_2025() -> QuarterlyConfig {
        QuarterlyConfig {
            due_dates: [
                date(2025, 4, 15),
                date(2025, 6, 15),
                date(2025, 9, 15),
                date(2026, 1, 15),
            ],
            current_year_factor: dec!(0.90),
            prior_year_factor: dec!(1.10),
            standard_prior_year_factor: dec!(1.00),
            high_income_agi_threshold: dec!(150000),
            include_fica: false,
        }
    }

    #[test]
    fn quarter_try_from_accepts_one_through_four() {
        let quarters: Vec<Quarter> = (1..=4).map(|n| Quarter::try_from(n).unwrap()).collect();

        assert_eq!(quarters, Quarter::ALL.to_vec());
    }

    #[test]
    fn quarter_try_from_rejects_zero_and_five() {
        for n in [0, 5] {
            let err = Quarter::try_from(n).unwrap_err();
            assert!(matches!(err, CalculationError::InvalidInput { field: "quarter", .. }));
        }
    }

    #[test]
    fn quarter_displays_with_prefix() {
        assert_eq!(Quarter::Q3.to_string(), "Q3");
    }

    #[test]
    fn payment_new_validates_quarter_and_amount() {
        assert_eq!(
            QuarterlyPayment::new(2025, 3, dec!(500)),
            Ok(QuarterlyPayment {
                tax_year: 2025,
                quarter: Quarter::Q3,
                amount: dec!(500),
            })
        );
        assert!(matches!(
            QuarterlyPayment::new(2025, 0, dec!(500)),
            Err(CalculationError::InvalidInput { field: "quarter", .. })
        ));
        assert!(matches!(
            QuarterlyPayment::new(2025, 1, dec!(-0.01)),
            Err(CalculationError::InvalidInput { field: "amount", .. })
        ));
    }

    #[test]
    fn due_date_selects_by_quarter() {
        assert_eq!(config_2025().due_date(Quarter::Q4), date(2026, 1, 15));
    }

    #[test]
    fn validate_accepts_2025_schedule() {
        assert_eq!(config_2025().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_order_due_dates() {
        let mut config = config_2025();
        config.due_dates[2] = date(2025, 6, 15);

        assert_eq!(
            config.validate(),
            Err(ConfigError::DueDatesOutOfOrder {
                previous: date(2025, 6, 15),
                next: date(2025, 6, 15)
            })
        );
    }

    #[test]
    fn validate_rejects_negative_factor() {
        let config = QuarterlyConfig {
            current_year_factor: dec!(-0.9),
            ..config_2025()
        };

        assert!(config.validate().is_err());
    }
}
