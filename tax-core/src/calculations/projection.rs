//! Full-year tax projection across every configured jurisdiction.
//!
//! For each jurisdiction the bracket calculator runs on its income base:
//!
//! * resident jurisdictions tax gross income less pre-tax retirement
//!   contributions, less the jurisdiction's standard deduction;
//! * `sourced_only` jurisdictions tax only the income sourced to them.
//!
//! A resident jurisdiction that credits taxes paid to a sourced-only
//! jurisdiction reduces its tax by
//! `min(other tax, own tax × sourced income ÷ gross income)`, never below 0.
//! FICA is added on top. `refund_or_owed = withheld − total tax`, positive
//! meaning a refund.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::{BracketCalculator, BracketTaxResult};
use crate::calculations::common::{max, min, round_half_up, round_rate};
use crate::calculations::fica::{FicaBreakdown, FicaCalculator};
use crate::error::{CalculationError, Component, require_non_negative};
use crate::models::{FicaConfig, JurisdictionConfig, TaxYearConfig, validate_jurisdictions};

/// Amounts withheld so far this year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withholding {
    /// Income tax withheld, keyed by jurisdiction id.
    #[serde(default)]
    pub by_jurisdiction: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub fica: Decimal,
}

impl Withholding {
    pub fn total(&self) -> Decimal {
        self.by_jurisdiction.values().copied().sum::<Decimal>() + self.fica
    }
}

/// Request for one projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub ytd_gross_income: Decimal,
    pub ytd_withholding: Withholding,
    /// Estimated full-year wage income.
    pub full_year_income: Decimal,
    /// Recognized RSU income for the year, added to gross income and wages.
    #[serde(default)]
    pub rsu_income: Decimal,
    /// FICA wages; defaults to full-year income plus RSU income.
    #[serde(default)]
    pub fica_wages: Option<Decimal>,
    /// Pre-tax retirement contributions. Reduce resident income-tax bases only.
    #[serde(default)]
    pub pre_tax_contributions: Decimal,
    /// Income sourced to each `sourced_only` jurisdiction.
    #[serde(default)]
    pub sourced_income: BTreeMap<String, Decimal>,
}

impl ProjectionInput {
    pub fn new(full_year_income: Decimal) -> Self {
        Self {
            full_year_income,
            ..Self::default()
        }
    }

    pub fn with_pre_tax_contributions(
        &self,
        amount: Decimal,
    ) -> Self {
        Self {
            pre_tax_contributions: amount,
            ..self.clone()
        }
    }

    pub fn gross_income(&self) -> Decimal {
        self.full_year_income + self.rsu_income
    }

    fn fica_wages(&self) -> Decimal {
        self.fica_wages.unwrap_or_else(|| self.gross_income())
    }

    fn sourced(
        &self,
        jurisdiction: &str,
    ) -> Decimal {
        self.sourced_income
            .get(jurisdiction)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Credit taken against one jurisdiction for tax paid to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCredit {
    pub paid_to: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionTax {
    pub jurisdiction: String,
    pub name: String,
    /// Income before the standard deduction.
    pub income_base: Decimal,
    pub brackets: BracketTaxResult,
    pub tax_before_credits: Decimal,
    pub credits: Vec<TaxCredit>,
    pub tax: Decimal,
    pub withheld: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub gross_income: Decimal,
    pub ytd_gross_income: Decimal,
    pub pre_tax_contributions: Decimal,
    pub jurisdictions: Vec<JurisdictionTax>,
    pub fica: FicaBreakdown,
    /// Sum of jurisdiction taxes after credits.
    pub income_tax: Decimal,
    pub total_tax: Decimal,
    /// `total_tax / gross_income` as a fraction, four decimal places.
    pub effective_rate: Decimal,
    pub projected_liability: Decimal,
    pub withheld_ytd: Decimal,
    /// Positive: refund. Negative: amount owed.
    pub refund_or_owed: Decimal,
}

impl ProjectionResult {
    pub fn jurisdiction(
        &self,
        id: &str,
    ) -> Option<&JurisdictionTax> {
        self.jurisdictions.iter().find(|j| j.jurisdiction == id)
    }

    pub fn is_refund(&self) -> bool {
        self.refund_or_owed > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionMarginalRate {
    pub jurisdiction: String,
    pub taxable_income: Decimal,
    pub rate: Decimal,
    pub sourced_only: bool,
}

/// Statutory rates on the next dollar; credits are not modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginalRates {
    pub jurisdictions: Vec<JurisdictionMarginalRate>,
    pub fica: Decimal,
    /// Resident jurisdictions plus FICA.
    pub combined: Decimal,
}

/// Evaluates [`ProjectionInput`]s against one set of constants.
#[derive(Debug, Clone, Copy)]
pub struct TaxProjector<'a> {
    jurisdictions: &'a [JurisdictionConfig],
    fica: &'a FicaConfig,
}

impl<'a> TaxProjector<'a> {
    pub fn new(
        jurisdictions: &'a [JurisdictionConfig],
        fica: &'a FicaConfig,
    ) -> Self {
        Self { jurisdictions, fica }
    }

    pub fn from_config(config: &'a TaxYearConfig) -> Self {
        Self::new(&config.jurisdictions, &config.fica)
    }

    /// Projects the year.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::Configuration`] if the jurisdiction list is malformed.
    /// * [`CalculationError::InvalidInput`] for negative amounts, pre-tax
    ///   contributions above income, or income keyed to an unknown jurisdiction.
    /// * [`CalculationError::Context`] wrapping a component failure with the
    ///   jurisdiction it occurred in.
    pub fn project(
        &self,
        input: &ProjectionInput,
    ) -> Result<ProjectionResult, CalculationError> {
        validate_jurisdictions(self.jurisdictions)?;
        self.validate_input(input)?;

        let gross_income = input.gross_income();
        let mut jurisdictions = self
            .jurisdictions
            .iter()
            .map(|jurisdiction| self.jurisdiction_tax(jurisdiction, input))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_credits(&mut jurisdictions, input);

        let fica = FicaCalculator::new(self.fica)
            .calculate(input.fica_wages())
            .map_err(|e| e.within(Component::Fica, "fica"))?;

        let income_tax: Decimal = jurisdictions.iter().map(|j| j.tax).sum();
        let total_tax = income_tax + fica.total;
        let effective_rate = if gross_income.is_zero() {
            Decimal::ZERO
        } else {
            round_rate(total_tax / gross_income)
        };
        let withheld_ytd = input.ytd_withholding.total();

        debug!(
            gross_income = %gross_income,
            income_tax = %income_tax,
            fica = %fica.total,
            total_tax = %total_tax,
            "Projection complete"
        );

        Ok(ProjectionResult {
            gross_income,
            ytd_gross_income: input.ytd_gross_income,
            pre_tax_contributions: input.pre_tax_contributions,
            jurisdictions,
            fica,
            income_tax,
            total_tax,
            effective_rate,
            projected_liability: total_tax,
            withheld_ytd,
            refund_or_owed: withheld_ytd - total_tax,
        })
    }

    /// Rates on the next dollar of wages for the given input.
    pub fn marginal_rates(
        &self,
        input: &ProjectionInput,
    ) -> Result<MarginalRates, CalculationError> {
        validate_jurisdictions(self.jurisdictions)?;
        self.validate_input(input)?;

        let jurisdictions: Vec<JurisdictionMarginalRate> = self
            .jurisdictions
            .iter()
            .map(|jurisdiction| {
                let base = Self::income_base(jurisdiction, input);
                let taxable_income = max(Decimal::ZERO, base - jurisdiction.standard_deduction);
                JurisdictionMarginalRate {
                    jurisdiction: jurisdiction.id.clone(),
                    taxable_income,
                    rate: BracketCalculator::new(&jurisdiction.brackets).marginal_rate(taxable_income),
                    sourced_only: jurisdiction.sourced_only,
                }
            })
            .collect();

        let fica = FicaCalculator::new(self.fica).marginal_rate(input.fica_wages());
        let combined = jurisdictions
            .iter()
            .filter(|j| !j.sourced_only)
            .map(|j| j.rate)
            .sum::<Decimal>()
            + fica;

        Ok(MarginalRates {
            jurisdictions,
            fica,
            combined,
        })
    }

    fn validate_input(
        &self,
        input: &ProjectionInput,
    ) -> Result<(), CalculationError> {
        require_non_negative("ytd_gross_income", input.ytd_gross_income)?;
        require_non_negative("full_year_income", input.full_year_income)?;
        require_non_negative("rsu_income", input.rsu_income)?;
        require_non_negative("pre_tax_contributions", input.pre_tax_contributions)?;
        require_non_negative("fica_withheld", input.ytd_withholding.fica)?;
        if let Some(wages) = input.fica_wages {
            require_non_negative("fica_wages", wages)?;
        }

        let gross_income = input.gross_income();
        if input.pre_tax_contributions > gross_income {
            return Err(CalculationError::invalid(
                "pre_tax_contributions",
                format!(
                    "{} exceeds gross income of {gross_income}",
                    input.pre_tax_contributions
                ),
            ));
        }

        for (id, amount) in &input.ytd_withholding.by_jurisdiction {
            if !self.jurisdictions.iter().any(|j| &j.id == id) {
                return Err(CalculationError::invalid(
                    "withholding",
                    format!("unknown jurisdiction '{id}'"),
                ));
            }
            require_non_negative("withholding", *amount)?;
        }

        for (id, amount) in &input.sourced_income {
            match self.jurisdictions.iter().find(|j| &j.id == id) {
                None => {
                    return Err(CalculationError::invalid(
                        "sourced_income",
                        format!("unknown jurisdiction '{id}'"),
                    ));
                }
                Some(j) if !j.sourced_only => {
                    return Err(CalculationError::invalid(
                        "sourced_income",
                        format!("jurisdiction '{id}' taxes all income, not sourced income"),
                    ));
                }
                Some(_) => {}
            }
            require_non_negative("sourced_income", *amount)?;
            if *amount > gross_income {
                return Err(CalculationError::invalid(
                    "sourced_income",
                    format!("income sourced to '{id}' exceeds gross income of {gross_income}"),
                ));
            }
        }

        Ok(())
    }

    fn income_base(
        jurisdiction: &JurisdictionConfig,
        input: &ProjectionInput,
    ) -> Decimal {
        if jurisdiction.sourced_only {
            input.sourced(&jurisdiction.id)
        } else {
            input.gross_income() - input.pre_tax_contributions
        }
    }

    fn jurisdiction_tax(
        &self,
        jurisdiction: &JurisdictionConfig,
        input: &ProjectionInput,
    ) -> Result<JurisdictionTax, CalculationError> {
        let income_base = Self::income_base(jurisdiction, input);
        let brackets = BracketCalculator::new(&jurisdiction.brackets)
            .calculate(income_base, jurisdiction.standard_deduction)
            .map_err(|e| e.within(Component::Brackets, jurisdiction.id.as_str()))?;
        let tax = brackets.total_tax;

        debug!(
            jurisdiction = %jurisdiction.id,
            income_base = %income_base,
            taxable_income = %brackets.taxable_income,
            tax = %tax,
            "Jurisdiction tax computed"
        );

        Ok(JurisdictionTax {
            jurisdiction: jurisdiction.id.clone(),
            name: jurisdiction.name.clone(),
            income_base,
            brackets,
            tax_before_credits: tax,
            credits: Vec::new(),
            tax,
            withheld: input
                .ytd_withholding
                .by_jurisdiction
                .get(&jurisdiction.id)
                .copied()
                .unwrap_or(Decimal::ZERO),
        })
    }

    /// Credits are computed from pre-credit taxes, so the order of the
    /// jurisdiction list does not matter.
    fn apply_credits(
        &self,
        taxes: &mut [JurisdictionTax],
        input: &ProjectionInput,
    ) {
        let gross_income = input.gross_income();
        if gross_income.is_zero() {
            return;
        }

        let pre_credit: BTreeMap<String, Decimal> = taxes
            .iter()
            .map(|t| (t.jurisdiction.clone(), t.tax_before_credits))
            .collect();

        for (config, tax) in self.jurisdictions.iter().zip(taxes.iter_mut()) {
            let mut remaining = tax.tax_before_credits;
            for target in &config.credit_for_taxes_paid_to {
                let paid = pre_credit.get(target).copied().unwrap_or(Decimal::ZERO);
                let sourced = input.sourced(target);
                if paid.is_zero() || sourced.is_zero() {
                    continue;
                }
                let own_on_sourced = round_half_up(tax.tax_before_credits * sourced / gross_income);
                let amount = min(remaining, min(paid, own_on_sourced));
                remaining -= amount;

                debug!(
                    jurisdiction = %config.id,
                    paid_to = %target,
                    credit = %amount,
                    "Credit for taxes paid to another jurisdiction"
                );
                tax.credits.push(TaxCredit {
                    paid_to: target.clone(),
                    amount,
                });
            }
            tax.tax = remaining;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::ConfigError;
    use crate::fixtures::{config_2025_mfj, federal_brackets, fica_2025_mfj};

    fn federal_only() -> Vec<JurisdictionConfig> {
        vec![
            JurisdictionConfig::new("federal", "Federal", federal_brackets())
                .with_standard_deduction(dec!(30000)),
        ]
    }

    // =========================================================================
    // project tests
    // =========================================================================

    #[test]
    fn project_federal_only() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);

        let result = projector.project(&ProjectionInput::new(dec!(126950))).unwrap();

        let federal = result.jurisdiction("federal").unwrap();
        assert_eq!(federal.brackets.taxable_income, dec!(96950));
        assert_eq!(federal.tax, dec!(11157.00));
        // SS capped at 126950 × 6.2% = 7870.90, medicare 1840.775 → 1840.78
        assert_eq!(result.fica.total, dec!(9711.68));
        assert_eq!(result.total_tax, dec!(20868.68));
    }

    #[test]
    fn project_effective_rate_is_fraction() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);

        let result = projector.project(&ProjectionInput::new(dec!(126950))).unwrap();

        // 20868.68 / 126950 = 0.16438...
        assert_eq!(result.effective_rate, dec!(0.1644));
    }

    #[test]
    fn project_zero_income() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);

        let result = projector.project(&ProjectionInput::new(dec!(0))).unwrap();

        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert_eq!(result.refund_or_owed, dec!(0));
    }

    #[test]
    fn project_refund_when_over_withheld() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);
        let mut input = ProjectionInput::new(dec!(126950));
        input.ytd_withholding.by_jurisdiction.insert("federal".into(), dec!(12000));
        input.ytd_withholding.fica = dec!(9711.68);

        let result = projector.project(&input).unwrap();

        assert_eq!(result.withheld_ytd, dec!(21711.68));
        assert_eq!(result.refund_or_owed, dec!(843.00));
        assert!(result.is_refund());
        assert_eq!(result.jurisdiction("federal").unwrap().withheld, dec!(12000));
    }

    #[test]
    fn project_owed_when_under_withheld() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);

        let result = projector.project(&ProjectionInput::new(dec!(126950))).unwrap();

        assert_eq!(result.refund_or_owed, dec!(-20868.68));
        assert!(!result.is_refund());
    }

    #[test]
    fn project_pre_tax_contributions_reduce_income_tax_not_fica() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);
        let base = ProjectionInput::new(dec!(150450));

        let without = projector.project(&base).unwrap();
        let with = projector
            .project(&base.with_pre_tax_contributions(dec!(23500)))
            .unwrap();

        assert_eq!(with.jurisdictions[0].income_base, dec!(126950));
        assert_eq!(with.jurisdictions[0].tax, dec!(11157.00));
        assert_eq!(with.fica, without.fica);
        // 23500 × 22%
        assert_eq!(without.income_tax - with.income_tax, dec!(5170.00));
    }

    #[test]
    fn project_sourced_only_jurisdiction_taxes_sourced_income() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(200000));
        input.sourced_income.insert("state-b".into(), dec!(30000));

        let result = projector.project(&input).unwrap();

        let state_b = result.jurisdiction("state-b").unwrap();
        assert_eq!(state_b.income_base, dec!(30000));
        assert_eq!(state_b.brackets.taxable_income, dec!(15000));
        // 5 + 22.50 + 43.75 + 63.25 + 90 + 133.00
        assert_eq!(state_b.tax, dec!(357.50));
    }

    #[test]
    fn project_sourced_only_without_sourced_income_is_zero() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);

        let result = projector.project(&ProjectionInput::new(dec!(200000))).unwrap();

        assert_eq!(result.jurisdiction("state-b").unwrap().tax, dec!(0));
        assert!(result.jurisdiction("state-a").unwrap().credits.is_empty());
    }

    #[test]
    fn project_state_a_surcharge_above_one_million() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);

        let result = projector.project(&ProjectionInput::new(dec!(2000000))).unwrap();

        let state_a = result.jurisdiction("state-a").unwrap();
        assert_eq!(state_a.brackets.taxable_income, dec!(1988920));
        // Extra 1% on 988920 over the plain 2025 schedule (212936.00).
        assert_eq!(state_a.tax, dec!(222825.20));
    }

    #[test]
    fn project_resident_credit_is_smaller_of_paid_and_proportional_tax() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(200000));
        input.sourced_income.insert("state-b".into(), dec!(30000));

        let result = projector.project(&input).unwrap();

        let state_a = result.jurisdiction("state-a").unwrap();
        let state_b = result.jurisdiction("state-b").unwrap();
        let proportional = round_half_up(state_a.tax_before_credits * dec!(30000) / dec!(200000));
        let expected_credit = min(state_b.tax, proportional);
        assert_eq!(state_a.credits.len(), 1);
        assert_eq!(state_a.credits[0].paid_to, "state-b");
        assert_eq!(state_a.credits[0].amount, expected_credit);
        assert_eq!(state_a.tax, state_a.tax_before_credits - expected_credit);
        assert_eq!(
            result.income_tax,
            result.jurisdictions.iter().map(|j| j.tax).sum::<Decimal>()
        );
    }

    #[test]
    fn project_is_idempotent() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(310000));
        input.sourced_income.insert("state-b".into(), dec!(45000));
        input.pre_tax_contributions = dec!(23500);

        assert_eq!(projector.project(&input).unwrap(), projector.project(&input).unwrap());
    }

    #[test]
    fn project_rsu_income_adds_to_gross_and_fica_wages() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);
        let mut input = ProjectionInput::new(dec!(100000));
        input.rsu_income = dec!(26950);

        let result = projector.project(&input).unwrap();

        assert_eq!(result.gross_income, dec!(126950));
        assert_eq!(result.fica.wages, dec!(126950));
        assert_eq!(result.jurisdictions[0].tax, dec!(11157.00));
    }

    #[test]
    fn project_explicit_fica_wages_override() {
        let jurisdictions = federal_only();
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);
        let mut input = ProjectionInput::new(dec!(126950));
        input.fica_wages = Some(dec!(100000));

        let result = projector.project(&input).unwrap();

        assert_eq!(result.fica.total, dec!(7650.00));
    }

    #[test]
    fn project_rejects_negative_income() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);

        let err = projector.project(&ProjectionInput::new(dec!(-5))).unwrap_err();

        assert!(matches!(
            err,
            CalculationError::InvalidInput {
                field: "full_year_income",
                ..
            }
        ));
    }

    #[test]
    fn project_rejects_contributions_above_income() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let input = ProjectionInput::new(dec!(10000)).with_pre_tax_contributions(dec!(23500));

        let err = projector.project(&input).unwrap_err();

        assert!(matches!(
            err,
            CalculationError::InvalidInput {
                field: "pre_tax_contributions",
                ..
            }
        ));
    }

    #[test]
    fn project_rejects_sourced_income_for_resident_jurisdiction() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(100000));
        input.sourced_income.insert("state-a".into(), dec!(1000));

        let err = projector.project(&input).unwrap_err();

        assert!(matches!(
            err,
            CalculationError::InvalidInput {
                field: "sourced_income",
                ..
            }
        ));
    }

    #[test]
    fn project_rejects_withholding_for_unknown_jurisdiction() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(100000));
        input.ytd_withholding.by_jurisdiction.insert("state-z".into(), dec!(10));

        let err = projector.project(&input).unwrap_err();

        assert_eq!(
            err,
            CalculationError::invalid("withholding", "unknown jurisdiction 'state-z'")
        );
    }

    #[test]
    fn project_rejects_malformed_jurisdiction_list() {
        let mut jurisdictions = federal_only();
        jurisdictions.push(jurisdictions[0].clone());
        let fica = fica_2025_mfj();
        let projector = TaxProjector::new(&jurisdictions, &fica);

        let err = projector.project(&ProjectionInput::new(dec!(1000))).unwrap_err();

        assert_eq!(
            err,
            CalculationError::Configuration(ConfigError::DuplicateJurisdiction("federal".into()))
        );
    }

    #[test]
    fn project_wraps_fica_errors_with_component() {
        let jurisdictions = federal_only();
        let fica = FicaConfig {
            social_security_wage_base: dec!(0),
            ..fica_2025_mfj()
        };
        let projector = TaxProjector::new(&jurisdictions, &fica);

        let err = projector.project(&ProjectionInput::new(dec!(1000))).unwrap_err();

        assert!(matches!(
            err,
            CalculationError::Context {
                component: Component::Fica,
                ..
            }
        ));
    }

    // =========================================================================
    // marginal_rates tests
    // =========================================================================

    #[test]
    fn marginal_rates_high_earner() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);

        let rates = projector.marginal_rates(&ProjectionInput::new(dec!(450000))).unwrap();

        assert_eq!(rates.jurisdictions[0].rate, dec!(0.32));
        assert_eq!(rates.jurisdictions[1].rate, dec!(0.093));
        assert_eq!(rates.fica, dec!(0.0235));
        assert_eq!(rates.combined, dec!(0.4365));
    }

    #[test]
    fn marginal_rates_exclude_sourced_only_from_combined() {
        let config = config_2025_mfj();
        let projector = TaxProjector::from_config(&config);
        let mut input = ProjectionInput::new(dec!(100000));
        input.sourced_income.insert("state-b".into(), dec!(40000));

        let rates = projector.marginal_rates(&input).unwrap();

        let state_b = &rates.jurisdictions[2];
        assert!(state_b.sourced_only);
        assert_eq!(state_b.rate, dec!(0.0475));
        // 12% + 6% + 7.65%
        assert_eq!(rates.combined, dec!(0.2565));
    }
}
