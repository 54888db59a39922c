use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{
    FicaConfig, FilingStatusCode, JurisdictionConfig, QuarterlyConfig, RetirementPlanConfig,
    validate_jurisdictions,
};

/// Every statutory constant for one tax year and filing status.
///
/// Loaded once at process start and passed by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,
    pub jurisdictions: Vec<JurisdictionConfig>,
    pub fica: FicaConfig,
    pub retirement_plan: RetirementPlanConfig,
    pub quarterly: QuarterlyConfig,
}

impl TaxYearConfig {
    /// Validates the configuration as a whole.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_jurisdictions(&self.jurisdictions)?;
        self.fica.validate()?;
        self.retirement_plan.validate()?;
        self.quarterly.validate()?;
        Ok(())
    }

    pub fn jurisdiction(
        &self,
        id: &str,
    ) -> Option<&JurisdictionConfig> {
        self.jurisdictions.iter().find(|jurisdiction| jurisdiction.id == id)
    }

    pub fn jurisdiction_ids(&self) -> impl Iterator<Item = &str> {
        self.jurisdictions.iter().map(|jurisdiction| jurisdiction.id.as_str())
    }
}
