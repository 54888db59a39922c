//! 2025 Married Filing Jointly constants shared by unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    Bracket, BracketTable, FicaConfig, FilingStatusCode, JurisdictionConfig, QuarterlyConfig,
    RetirementPlanConfig, TaxYearConfig,
};

fn table(
    bounded: &[(Decimal, Decimal)],
    top_rate: Decimal,
) -> BracketTable {
    let mut brackets: Vec<Bracket> = bounded
        .iter()
        .map(|&(upper, rate)| Bracket::bounded(upper, rate))
        .collect();
    brackets.push(Bracket::top(top_rate));
    BracketTable::new(brackets).unwrap()
}

pub fn federal_brackets() -> BracketTable {
    table(
        &[
            (dec!(23850), dec!(0.10)),
            (dec!(96950), dec!(0.12)),
            (dec!(206700), dec!(0.22)),
            (dec!(394600), dec!(0.24)),
            (dec!(501050), dec!(0.32)),
            (dec!(751600), dec!(0.35)),
        ],
        dec!(0.37),
    )
}

pub fn state_a_brackets() -> BracketTable {
    table(
        &[
            (dec!(21438), dec!(0.01)),
            (dec!(50852), dec!(0.02)),
            (dec!(80268), dec!(0.04)),
            (dec!(111484), dec!(0.06)),
            (dec!(140902), dec!(0.08)),
            (dec!(721318), dec!(0.093)),
            (dec!(865580), dec!(0.103)),
            (dec!(1000000), dec!(0.113)),
            (dec!(1441160), dec!(0.123)),
        ],
        dec!(0.143),
    )
}

pub fn state_b_brackets() -> BracketTable {
    table(
        &[
            (dec!(2000), dec!(0.0025)),
            (dec!(5000), dec!(0.0075)),
            (dec!(7500), dec!(0.0175)),
            (dec!(9800), dec!(0.0275)),
            (dec!(12200), dec!(0.0375)),
        ],
        dec!(0.0475),
    )
}

pub fn jurisdictions_2025_mfj() -> Vec<JurisdictionConfig> {
    vec![
        JurisdictionConfig::new("federal", "Federal", federal_brackets())
            .with_standard_deduction(dec!(30000)),
        JurisdictionConfig::new("state-a", "California", state_a_brackets())
            .with_standard_deduction(dec!(11080))
            .with_credit_for("state-b"),
        JurisdictionConfig::new("state-b", "Oklahoma", state_b_brackets())
            .with_standard_deduction(dec!(15000))
            .sourced_only(),
    ]
}

pub fn fica_2025_mfj() -> FicaConfig {
    FicaConfig {
        social_security_rate: dec!(0.062),
        social_security_wage_base: dec!(176100),
        medicare_rate: dec!(0.0145),
        additional_medicare_rate: dec!(0.009),
        additional_medicare_threshold: dec!(250000),
    }
}

pub fn plan_2025() -> RetirementPlanConfig {
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

pub fn date(
    year: i32,
    month: u32,
    day: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn quarterly_2025() -> QuarterlyConfig {
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

pub fn config_2025_mfj() -> TaxYearConfig {
    TaxYearConfig {
        tax_year: 2025,
        filing_status: FilingStatusCode::MarriedFilingJointly,
        jurisdictions: jurisdictions_2025_mfj(),
        fica: fica_2025_mfj(),
        retirement_plan: plan_2025(),
        quarterly: quarterly_2025(),
    }
}
