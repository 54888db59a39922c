//! Estimated-tax installments and safe harbor.
//!
//! Each jurisdiction's projected annual tax is split into four equal
//! installments rounded half-up to the cent; Q4 takes whatever remains so the
//! quarters add back to the annual amount exactly. Safe harbor is reported
//! alongside:
//!
//! ```text
//! required = min(current factor × current-year liability,
//!                prior factor × prior-year liability)
//! ```
//!
//! where the prior factor is 100% for a prior-year AGI at or under the
//! high-income threshold and 110% otherwise (including when AGI is unknown).
//! Paid state belongs to the caller and is echoed back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{max, min, round_down, round_half_up};
use crate::calculations::projection::ProjectionResult;
use crate::error::{CalculationError, Component, require_non_negative};
use crate::models::{Quarter, QuarterlyConfig, QuarterlyPayment, TaxYearConfig};

/// Line used for FICA when it is part of the installment base.
pub const FICA_LINE: &str = "fica";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorYear {
    pub liability: Decimal,
    /// Prior-year AGI. Unknown AGI is treated as high income.
    pub agi: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentAmount {
    pub jurisdiction: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyEstimate {
    pub quarter: Quarter,
    pub due_date: NaiveDate,
    pub amounts: Vec<InstallmentAmount>,
    pub total_amount: Decimal,
    pub paid: bool,
    pub paid_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarbor {
    pub current_year_liability: Decimal,
    pub current_year_factor: Decimal,
    pub current_year_amount: Decimal,
    pub prior_year_liability: Option<Decimal>,
    pub prior_year_factor: Option<Decimal>,
    pub prior_year_amount: Option<Decimal>,
    /// Minimum annual payment that avoids the underpayment penalty.
    pub required_annual_payment: Decimal,
    pub required_quarterly_payment: Decimal,
    pub total_paid: Decimal,
    pub remaining_required: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlySchedule {
    pub tax_year: i32,
    pub annual_liability: Decimal,
    pub estimates: [QuarterlyEstimate; 4],
    pub safe_harbor: SafeHarbor,
}

impl QuarterlySchedule {
    pub fn estimate(
        &self,
        quarter: Quarter,
    ) -> &QuarterlyEstimate {
        &self.estimates[quarter.index()]
    }

    /// The estimate for `quarter` marked as paid with `amount`.
    ///
    /// # Errors
    ///
    /// [`CalculationError::InvalidInput`] if `quarter` is outside 1–4 or
    /// `amount` is negative.
    pub fn mark_paid(
        &self,
        quarter: u8,
        amount: Decimal,
    ) -> Result<QuarterlyEstimate, CalculationError> {
        let quarter = Quarter::try_from(quarter)?;
        require_non_negative("amount", amount)
            .map_err(|e| e.within(Component::Quarterly, quarter.to_string()))?;

        let mut estimate = self.estimate(quarter).clone();
        estimate.paid = true;
        estimate.paid_amount = Some(amount);
        Ok(estimate)
    }

    /// The estimate for `quarter` with its paid flag cleared.
    pub fn unmark_paid(
        &self,
        quarter: u8,
    ) -> Result<QuarterlyEstimate, CalculationError> {
        let quarter = Quarter::try_from(quarter)?;

        let mut estimate = self.estimate(quarter).clone();
        estimate.paid = false;
        estimate.paid_amount = None;
        Ok(estimate)
    }
}

pub struct QuarterlyEstimator<'a> {
    tax_year: i32,
    config: &'a QuarterlyConfig,
}

impl<'a> QuarterlyEstimator<'a> {
    pub fn new(
        tax_year: i32,
        config: &'a QuarterlyConfig,
    ) -> Self {
        Self { tax_year, config }
    }

    pub fn from_config(config: &'a TaxYearConfig) -> Self {
        Self::new(config.tax_year, &config.quarterly)
    }

    /// Builds the four installments for `projection`.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::Configuration`] if the due dates or factors are invalid.
    /// * [`CalculationError::InvalidInput`] for negative prior-year figures or
    ///   payments, a payment for another tax year, or two payments for the
    ///   same quarter.
    pub fn estimate(
        &self,
        projection: &ProjectionResult,
        prior_year: Option<&PriorYear>,
        payments: &[QuarterlyPayment],
    ) -> Result<QuarterlySchedule, CalculationError> {
        self.config.validate()?;
        if let Some(prior) = prior_year {
            require_non_negative("prior_year_liability", prior.liability)?;
            if let Some(agi) = prior.agi {
                require_non_negative("prior_year_agi", agi)?;
            }
        }
        let paid = self.paid_by_quarter(payments)?;

        let lines = self.installment_base(projection);
        let annual_liability: Decimal = lines.iter().map(|(_, amount)| *amount).sum();
        let splits: Vec<(String, [Decimal; 4])> = lines
            .into_iter()
            .map(|(jurisdiction, annual)| (jurisdiction, split_annual(annual)))
            .collect();

        let estimates = Quarter::ALL.map(|quarter| {
            let amounts: Vec<InstallmentAmount> = splits
                .iter()
                .map(|(jurisdiction, split)| InstallmentAmount {
                    jurisdiction: jurisdiction.clone(),
                    amount: split[quarter.index()],
                })
                .collect();
            let paid_amount = paid[quarter.index()];
            QuarterlyEstimate {
                quarter,
                due_date: self.config.due_date(quarter),
                total_amount: amounts.iter().map(|a| a.amount).sum(),
                amounts,
                paid: paid_amount.is_some(),
                paid_amount,
            }
        });

        let total_paid: Decimal = paid.iter().flatten().copied().sum();
        let safe_harbor = self.safe_harbor(annual_liability, prior_year, total_paid);

        debug!(
            tax_year = self.tax_year,
            annual_liability = %annual_liability,
            required = %safe_harbor.required_annual_payment,
            total_paid = %total_paid,
            "Quarterly schedule computed"
        );

        Ok(QuarterlySchedule {
            tax_year: self.tax_year,
            annual_liability,
            estimates,
            safe_harbor,
        })
    }

    fn installment_base(
        &self,
        projection: &ProjectionResult,
    ) -> Vec<(String, Decimal)> {
        let mut lines: Vec<(String, Decimal)> = projection
            .jurisdictions
            .iter()
            .map(|j| (j.jurisdiction.clone(), j.tax))
            .collect();
        if self.config.include_fica {
            lines.push((FICA_LINE.to_string(), projection.fica.total));
        }
        lines
    }

    fn paid_by_quarter(
        &self,
        payments: &[QuarterlyPayment],
    ) -> Result<[Option<Decimal>; 4], CalculationError> {
        let mut paid = [None; 4];
        for payment in payments {
            if payment.tax_year != self.tax_year {
                return Err(CalculationError::invalid(
                    "payment",
                    format!(
                        "{} payment belongs to tax year {}, not {}",
                        payment.quarter, payment.tax_year, self.tax_year
                    ),
                ));
            }
            require_non_negative("amount", payment.amount)
                .map_err(|e| e.within(Component::Quarterly, payment.quarter.to_string()))?;
            let slot = &mut paid[payment.quarter.index()];
            if slot.is_some() {
                return Err(CalculationError::invalid(
                    "payment",
                    format!("{} has more than one recorded payment", payment.quarter),
                ));
            }
            *slot = Some(payment.amount);
        }
        Ok(paid)
    }

    fn prior_year_factor(
        &self,
        agi: Option<Decimal>,
    ) -> Decimal {
        match agi {
            Some(agi) if agi <= self.config.high_income_agi_threshold => {
                self.config.standard_prior_year_factor
            }
            _ => self.config.prior_year_factor,
        }
    }

    fn safe_harbor(
        &self,
        current_year_liability: Decimal,
        prior_year: Option<&PriorYear>,
        total_paid: Decimal,
    ) -> SafeHarbor {
        let current_year_amount = round_half_up(current_year_liability * self.config.current_year_factor);
        let prior_year_factor = prior_year.map(|prior| self.prior_year_factor(prior.agi));
        let prior_year_amount = prior_year
            .zip(prior_year_factor)
            .map(|(prior, factor)| round_half_up(prior.liability * factor));

        let required_annual_payment =
            prior_year_amount.map_or(current_year_amount, |prior| min(current_year_amount, prior));
        if prior_year.is_none() {
            warn!("No prior-year liability supplied; safe harbor uses the current-year test only");
        }

        SafeHarbor {
            current_year_liability,
            current_year_factor: self.config.current_year_factor,
            current_year_amount,
            prior_year_liability: prior_year.map(|prior| prior.liability),
            prior_year_factor,
            prior_year_amount,
            required_annual_payment,
            required_quarterly_payment: round_half_up(required_annual_payment / Decimal::from(4)),
            total_paid,
            remaining_required: max(Decimal::ZERO, required_annual_payment - total_paid),
        }
    }
}

/// Four installments of `annual`, Q4 absorbing the rounding remainder.
///
/// The equal share is rounded half-up; when that would leave Q4 negative
/// (annual amounts of a few cents) the share is truncated instead.
pub fn split_annual(annual: Decimal) -> [Decimal; 4] {
    let quarter_share = annual / Decimal::from(4);
    let mut share = round_half_up(quarter_share);
    if share * Decimal::from(3) > annual {
        share = round_down(quarter_share);
    }
    [share, share, share, annual - share * Decimal::from(3)]
}
