use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::BracketTable;

/// Income-tax constants for one taxing jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionConfig {
    /// Stable identifier such as `"federal"` or `"state-a"`.
    pub id: String,
    /// Display name.
    pub name: String,
    pub brackets: BracketTable,
    #[serde(default)]
    pub standard_deduction: Decimal,
    /// Taxed only on income sourced to this jurisdiction (non-resident state).
    #[serde(default)]
    pub sourced_only: bool,
    /// Jurisdictions whose tax on the same income is credited against this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credit_for_taxes_paid_to: Vec<String>,
}

impl JurisdictionConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        brackets: BracketTable,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brackets,
            standard_deduction: Decimal::ZERO,
            sourced_only: false,
            credit_for_taxes_paid_to: Vec::new(),
        }
    }

    pub fn with_standard_deduction(
        mut self,
        amount: Decimal,
    ) -> Self {
        self.standard_deduction = amount;
        self
    }

    pub fn sourced_only(mut self) -> Self {
        self.sourced_only = true;
        self
    }

    pub fn with_credit_for(
        mut self,
        jurisdiction: impl Into<String>,
    ) -> Self {
        self.credit_for_taxes_paid_to.push(jurisdiction.into());
        self
    }
}

/// Checks a jurisdiction list as a whole: ids unique and non-empty,
/// deductions non-negative, credit targets known and sourced-only.
pub fn validate_jurisdictions(jurisdictions: &[JurisdictionConfig]) -> Result<(), ConfigError> {
    if jurisdictions.is_empty() {
        return Err(ConfigError::NoJurisdictions);
    }

    let mut seen = HashSet::new();
    for jurisdiction in jurisdictions {
        if jurisdiction.id.trim().is_empty() {
            return Err(ConfigError::EmptyJurisdictionId);
        }
        if !seen.insert(jurisdiction.id.as_str()) {
            return Err(ConfigError::DuplicateJurisdiction(jurisdiction.id.clone()));
        }
        if jurisdiction.standard_deduction < Decimal::ZERO {
            return Err(ConfigError::NegativeDeduction {
                jurisdiction: jurisdiction.id.clone(),
                amount: jurisdiction.standard_deduction,
            });
        }
    }

    for jurisdiction in jurisdictions {
        for target in &jurisdiction.credit_for_taxes_paid_to {
            let credited = jurisdictions
                .iter()
                .find(|other| &other.id == target && other.id != jurisdiction.id)
                .ok_or_else(|| ConfigError::UnknownCreditTarget {
                    jurisdiction: jurisdiction.id.clone(),
                    target: target.clone(),
                })?;
            if !credited.sourced_only {
                return Err(ConfigError::CreditTargetNotSourced {
                    jurisdiction: jurisdiction.id.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    Ok(())
}
