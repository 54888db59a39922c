//! Progressive-bracket tax for a single jurisdiction.
//!
//! Taxable income is `max(0, income - deduction)`. Each bracket taxes the
//! slice of taxable income between the previous upper bound and its own
//! (inclusive) upper bound. Every bracket produces a contribution, zero when
//! income does not reach it, and each contribution is rounded half-up to the
//! cent. The total is the sum of the rounded contributions.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::BracketCalculator;
//! use tax_core::models::{Bracket, BracketTable};
//!
//! let table = BracketTable::new(vec![
//!     Bracket::bounded(dec!(23850), dec!(0.10)),
//!     Bracket::bounded(dec!(96950), dec!(0.12)),
//!     Bracket::top(dec!(0.22)),
//! ])
//! .unwrap();
//!
//! let result = BracketCalculator::new(&table)
//!     .calculate(dec!(96950), dec!(0))
//!     .unwrap();
//!
//! assert_eq!(result.total_tax, dec!(11157.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::{max, min, round_half_up};
use crate::error::{CalculationError, require_non_negative};
use crate::models::{BracketBand, BracketTable};

/// Tax owed inside one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketContribution {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    /// Portion of taxable income falling in this bracket.
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

/// Full bracket walk for one income amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTaxResult {
    pub income: Decimal,
    pub deduction: Decimal,
    pub taxable_income: Decimal,
    pub contributions: Vec<BracketContribution>,
    pub total_tax: Decimal,
}

/// Applies one [`BracketTable`].
#[derive(Debug, Clone, Copy)]
pub struct BracketCalculator<'a> {
    table: &'a BracketTable,
}

impl<'a> BracketCalculator<'a> {
    pub fn new(table: &'a BracketTable) -> Self {
        Self { table }
    }

    /// Total tax on `income` after `deduction`.
    pub fn tax(
        &self,
        income: Decimal,
        deduction: Decimal,
    ) -> Result<Decimal, CalculationError> {
        Ok(self.calculate(income, deduction)?.total_tax)
    }

    /// Tax with the per-bracket breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] if `income` or `deduction`
    /// is negative.
    pub fn calculate(
        &self,
        income: Decimal,
        deduction: Decimal,
    ) -> Result<BracketTaxResult, CalculationError> {
        require_non_negative("income", income)?;
        require_non_negative("deduction", deduction)?;

        let taxable_income = Self::taxable_income(income, deduction);
        let contributions: Vec<BracketContribution> = self
            .table
            .bands()
            .map(|band| Self::contribution(band, taxable_income))
            .collect();
        let total_tax = contributions.iter().map(|c| c.tax).sum();

        Ok(BracketTaxResult {
            income,
            deduction,
            taxable_income,
            contributions,
            total_tax,
        })
    }

    /// Rate applied to the next dollar of `taxable_income`.
    ///
    /// At exactly a threshold the next dollar belongs to the bracket above,
    /// so `marginal_rate(23850)` on the 2025 federal MFJ table is 12%.
    pub fn marginal_rate(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.table
            .bands()
            .find(|band| band.contains_next_dollar(taxable_income))
            .map(|band| band.rate)
            .unwrap_or_else(|| self.table.top_rate())
    }

    fn taxable_income(
        income: Decimal,
        deduction: Decimal,
    ) -> Decimal {
        if deduction > income && !income.is_zero() {
            warn!(
                income = %income,
                deduction = %deduction,
                "Deduction exceeds income; taxable income floored at zero"
            );
        }
        max(Decimal::ZERO, income - deduction)
    }

    fn contribution(
        band: BracketBand,
        taxable_income: Decimal,
    ) -> BracketContribution {
        let top = band
            .upper_bound
            .map_or(taxable_income, |upper| min(upper, taxable_income));
        let taxed_amount = max(Decimal::ZERO, top - band.lower_bound);

        BracketContribution {
            lower_bound: band.lower_bound,
            upper_bound: band.upper_bound,
            rate: band.rate,
            taxed_amount,
            tax: round_half_up(taxed_amount * band.rate),
        }
    }
}

/// Progressive tax on `income` under `table`, after `deduction`.
pub fn tax(
    income: Decimal,
    table: &BracketTable,
    deduction: Decimal,
) -> Result<Decimal, CalculationError> {
    BracketCalculator::new(table).tax(income, deduction)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::fixtures::{federal_brackets, state_b_brackets};
    use crate::models::Bracket;

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_tax_first_bracket() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).tax(dec!(10000), dec!(0)).unwrap();

        assert_eq!(result, dec!(1000.00));
    }

    #[test]
    fn calculate_tax_zero_income() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).calculate(dec!(0), dec!(0)).unwrap();

        assert_eq!(result.total_tax, dec!(0));
        assert!(result.contributions.iter().all(|c| c.tax.is_zero()));
    }

    #[test]
    fn calculate_tax_at_first_threshold_uses_lower_rate() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).tax(dec!(23850), dec!(0)).unwrap();

        assert_eq!(result, dec!(2385.00));
    }

    #[test]
    fn calculate_tax_at_second_threshold() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).calculate(dec!(96950), dec!(0)).unwrap();

        assert_eq!(result.contributions[0].tax, dec!(2385.00));
        assert_eq!(result.contributions[1].tax, dec!(8772.00));
        assert_eq!(result.total_tax, dec!(11157.00));
    }

    #[test]
    fn calculate_tax_at_third_threshold() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).tax(dec!(206700), dec!(0)).unwrap();

        assert_eq!(result, dec!(35302.00));
    }

    #[test]
    fn calculate_tax_one_cent_over_threshold() {
        let table = federal_brackets();
        let calculator = BracketCalculator::new(&table);

        let below = calculator.tax(dec!(96950), dec!(0)).unwrap();
        let above = calculator.tax(dec!(96950.01), dec!(0)).unwrap();

        // 0.01 × 22% rounds to zero cents.
        assert_eq!(above - below, dec!(0.00));
        let hundred_over = calculator.tax(dec!(97050), dec!(0)).unwrap();
        assert_eq!(hundred_over - below, dec!(22.00));
    }

    #[test]
    fn calculate_tax_top_bracket() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).calculate(dec!(1000000), dec!(0)).unwrap();

        let top = result.contributions.last().unwrap();
        assert_eq!(top.upper_bound, None);
        assert_eq!(top.taxed_amount, dec!(248400));
        assert_eq!(top.tax, dec!(91908.00));
        assert_eq!(result.total_tax, dec!(294062.50));
    }

    #[test]
    fn calculate_tax_reports_every_bracket() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table).calculate(dec!(50000), dec!(0)).unwrap();

        assert_eq!(result.contributions.len(), table.len());
        assert_eq!(result.contributions[2].taxed_amount, dec!(0));
        assert_eq!(result.contributions[6].tax, dec!(0));
    }

    #[test]
    fn calculate_tax_applies_deduction() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table)
            .calculate(dec!(126950), dec!(30000))
            .unwrap();

        assert_eq!(result.taxable_income, dec!(96950));
        assert_eq!(result.total_tax, dec!(11157.00));
    }

    #[test]
    fn calculate_tax_deduction_exceeding_income_is_zero() {
        let table = federal_brackets();

        let result = BracketCalculator::new(&table)
            .calculate(dec!(12000), dec!(30000))
            .unwrap();

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn calculate_tax_rounds_each_bracket() {
        let table = state_b_brackets();

        let result = BracketCalculator::new(&table).calculate(dec!(2001), dec!(0)).unwrap();

        // 2000 × 0.25% = 5.00, 1 × 0.75% = 0.0075 → 0.01
        assert_eq!(result.contributions[0].tax, dec!(5.00));
        assert_eq!(result.contributions[1].tax, dec!(0.01));
        assert_eq!(result.total_tax, dec!(5.01));
    }

    #[test]
    fn calculate_tax_with_non_monotonic_rates() {
        let table = BracketTable::new(vec![
            Bracket::bounded(dec!(1000), dec!(0.20)),
            Bracket::top(dec!(0.05)),
        ])
        .unwrap();

        let result = BracketCalculator::new(&table).tax(dec!(3000), dec!(0)).unwrap();

        assert_eq!(result, dec!(300.00));
    }

    #[test]
    fn calculate_tax_rejects_negative_income() {
        let table = federal_brackets();

        let err = BracketCalculator::new(&table).tax(dec!(-1), dec!(0)).unwrap_err();

        assert!(matches!(err, CalculationError::InvalidInput { field: "income", .. }));
    }

    #[test]
    fn calculate_tax_rejects_negative_deduction() {
        let table = federal_brackets();

        let err = BracketCalculator::new(&table).tax(dec!(100), dec!(-5)).unwrap_err();

        assert!(matches!(err, CalculationError::InvalidInput { field: "deduction", .. }));
    }

    #[test]
    fn free_function_matches_calculator() {
        let table = federal_brackets();

        assert_eq!(
            tax(dec!(150000), &table, dec!(30000)).unwrap(),
            BracketCalculator::new(&table).tax(dec!(150000), dec!(30000)).unwrap()
        );
    }

    // =========================================================================
    // marginal_rate tests
    // =========================================================================

    #[test]
    fn marginal_rate_at_zero_is_first_bracket() {
        let table = federal_brackets();

        assert_eq!(BracketCalculator::new(&table).marginal_rate(dec!(0)), dec!(0.10));
    }

    #[test]
    fn marginal_rate_at_threshold_is_next_bracket() {
        let table = federal_brackets();
        let calculator = BracketCalculator::new(&table);

        assert_eq!(calculator.marginal_rate(dec!(23849.99)), dec!(0.10));
        assert_eq!(calculator.marginal_rate(dec!(23850)), dec!(0.12));
    }

    #[test]
    fn marginal_rate_in_top_bracket() {
        let table = federal_brackets();

        assert_eq!(BracketCalculator::new(&table).marginal_rate(dec!(2000000)), dec!(0.37));
    }

    // =========================================================================
    // properties
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_tax_is_non_negative_and_monotonic(
            cents in 0i64..200_000_000,
            delta in 0i64..5_000_000,
        ) {
            let table = federal_brackets();
            let calculator = BracketCalculator::new(&table);
            let low = Decimal::new(cents, 2);
            let high = Decimal::new(cents + delta, 2);

            let low_tax = calculator.tax(low, Decimal::ZERO).unwrap();
            let high_tax = calculator.tax(high, Decimal::ZERO).unwrap();

            prop_assert!(low_tax >= Decimal::ZERO);
            prop_assert!(high_tax >= low_tax);
        }

        #[test]
        fn prop_total_is_sum_of_contributions(cents in 0i64..200_000_000) {
            let table = federal_brackets();
            let result = BracketCalculator::new(&table)
                .calculate(Decimal::new(cents, 2), Decimal::ZERO)
                .unwrap();

            let taxed: Decimal = result.contributions.iter().map(|c| c.taxed_amount).sum();
            let tax: Decimal = result.contributions.iter().map(|c| c.tax).sum();

            prop_assert_eq!(taxed, result.taxable_income);
            prop_assert_eq!(tax, result.total_tax);
        }
    }
}
