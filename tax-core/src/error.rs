//! Error taxonomy shared by every calculator.
//!
//! Two families exist:
//!
//! * [`ConfigError`] describes malformed tax-year constants. It is raised once,
//!   at load time, and the application refuses to run while it persists.
//! * [`CalculationError`] describes a bad request against valid configuration.
//!   Nothing is clamped or retried; the caller receives the field and reason,
//!   wrapped with the component and jurisdiction that failed.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::BracketTableError;

/// Malformed tax-year configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("jurisdiction '{jurisdiction}' has an invalid bracket table: {source}")]
    Brackets {
        jurisdiction: String,
        #[source]
        source: BracketTableError,
    },

    #[error("at least one jurisdiction must be configured")]
    NoJurisdictions,

    #[error("jurisdiction id must not be empty")]
    EmptyJurisdictionId,

    #[error("jurisdiction '{0}' is configured more than once")]
    DuplicateJurisdiction(String),

    #[error("jurisdiction '{jurisdiction}' has a negative standard deduction of {amount}")]
    NegativeDeduction {
        jurisdiction: String,
        amount: Decimal,
    },

    #[error("jurisdiction '{jurisdiction}' credits taxes paid to unknown jurisdiction '{target}'")]
    UnknownCreditTarget {
        jurisdiction: String,
        target: String,
    },

    #[error(
        "jurisdiction '{jurisdiction}' credits taxes paid to '{target}', which is not a sourced-only jurisdiction"
    )]
    CreditTargetNotSourced {
        jurisdiction: String,
        target: String,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: Decimal },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("pay periods per year must be at least 1")]
    ZeroPayPeriods,

    #[error("quarterly due dates must be strictly increasing, got {previous} then {next}")]
    DueDatesOutOfOrder { previous: NaiveDate, next: NaiveDate },
}

impl ConfigError {
    /// Range check used by every `validate` method.
    pub(crate) fn check_range(
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    ) -> Result<(), Self> {
        if value < min || value > max {
            return Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    pub(crate) fn check_positive(
        field: &'static str,
        value: Decimal,
    ) -> Result<(), Self> {
        if value <= Decimal::ZERO {
            return Err(Self::NotPositive { field, value });
        }
        Ok(())
    }

    pub(crate) fn check_non_negative(
        field: &'static str,
        value: Decimal,
    ) -> Result<(), Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Self::Negative { field, value });
        }
        Ok(())
    }
}

/// The calculator a [`CalculationError::Context`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Brackets,
    Fica,
    Projection,
    Optimizer,
    Quarterly,
}

impl fmt::Display for Component {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Brackets => "bracket calculation",
            Self::Fica => "FICA calculation",
            Self::Projection => "tax projection",
            Self::Optimizer => "401(k) optimization",
            Self::Quarterly => "quarterly estimate",
        };
        f.write_str(name)
    }
}

/// Errors raised while evaluating a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("{component} failed for '{scope}': {source}")]
    Context {
        component: Component,
        scope: String,
        #[source]
        source: Box<CalculationError>,
    },
}

impl CalculationError {
    pub fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Wraps `self` with the component and scope (jurisdiction id, quarter, …).
    pub fn within(
        self,
        component: Component,
        scope: impl Into<String>,
    ) -> Self {
        Self::Context {
            component,
            scope: scope.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root(&self) -> &CalculationError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Rejects negative money amounts.
pub(crate) fn require_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn invalid_input_names_field_and_reason() {
        let err = CalculationError::invalid("income", "must not be negative, got -1");

        assert_eq!(err.to_string(), "invalid income: must not be negative, got -1");
    }

    #[test]
    fn context_includes_component_and_scope() {
        let err = CalculationError::invalid("income", "must not be negative, got -1")
            .within(Component::Brackets, "state-a");

        assert_eq!(
            err.to_string(),
            "bracket calculation failed for 'state-a': invalid income: must not be negative, got -1"
        );
    }

    #[test]
    fn root_skips_nested_context() {
        let inner = CalculationError::invalid("quarter", "must be between 1 and 4, got 5");
        let err = inner
            .clone()
            .within(Component::Quarterly, "Q5")
            .within(Component::Projection, "federal");

        assert_eq!(err.root(), &inner);
    }

    #[test]
    fn require_non_negative_accepts_zero() {
        assert!(require_non_negative("amount", dec!(0)).is_ok());
    }

    #[test]
    fn require_non_negative_rejects_negative() {
        let err = require_non_negative("amount", dec!(-0.01)).unwrap_err();

        assert!(matches!(err, CalculationError::InvalidInput { field: "amount", .. }));
    }

    #[test]
    fn check_range_reports_bounds() {
        let err = ConfigError::check_range("rate", dec!(1.5), dec!(0), dec!(1)).unwrap_err();

        assert_eq!(err.to_string(), "rate must be between 0 and 1, got 1.5");
    }

    #[test]
    fn check_non_negative_accepts_negative_zero() {
        assert!(ConfigError::check_non_negative("limit", -dec!(0)).is_ok());
    }
}
