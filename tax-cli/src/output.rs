//! Text and JSON rendering of command reports.

use std::fmt::{self, Write};

use rust_decimal::{Decimal, RoundingStrategy};

use tax_core::calculations::{
    ContributionScenario, MarginalRates, OptimizerResult, ProjectionResult, QuarterlyEstimate,
    QuarterlySchedule, RsuIncome, RsuVestingSummary, SavingsBasis,
};
use tax_core::{RsuVestingEvent, TaxYearConfig};

use crate::app::Report;

const LABEL_WIDTH: usize = 30;
const VALUE_WIDTH: usize = 16;

/// Renders `report` as pretty JSON or aligned text.
pub fn render(
    report: &Report,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let mut out = String::new();
    write_text(&mut out, report)?;
    Ok(out)
}

fn write_text(
    out: &mut String,
    report: &Report,
) -> fmt::Result {
    match report {
        Report::Projection(result) => projection(out, result),
        Report::Marginal(rates) => marginal(out, rates),
        Report::Optimization(result) => optimization(out, result),
        Report::Scenario(scenario) => scenario_table(out, scenario),
        Report::Quarterly(schedule) => quarterly(out, schedule),
        Report::QuarterEstimate(e) => estimate(out, e),
        Report::VestingEvent(event) => events(out, std::slice::from_ref(event)),
        Report::VestingEventDeleted { deleted_id } => {
            writeln!(out, "Deleted vesting event {deleted_id}")
        }
        Report::VestingEvents(list) => events(out, list),
        Report::VestingImport { imported, warnings } => {
            writeln!(out, "Imported {} vesting events", imported.len())?;
            events(out, imported)?;
            for warning in warnings {
                writeln!(out, "warning: {warning}")?;
            }
            Ok(())
        }
        Report::VestingSummary {
            as_of,
            summary,
            income,
        } => vesting_summary(out, *as_of, summary, income),
        Report::Config(config) => config_text(out, config),
    }
}

// ─── formatting helpers ──────────────────────────────────────────────────────

/// `$1,234.56`; negative amounts as `-$1,234.56`.
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// A 0–1 rate as a percentage, e.g. `0.2395` → `23.95%`.
pub fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

fn opt_money(amount: Option<Decimal>) -> String {
    amount.map(money).unwrap_or_else(|| "n/a".to_string())
}

fn row(
    out: &mut String,
    label: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    writeln!(out, "  {label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}")
}

// ─── sections ────────────────────────────────────────────────────────────────

fn projection(
    out: &mut String,
    result: &ProjectionResult,
) -> fmt::Result {
    writeln!(out, "Projection")?;
    row(out, "Gross income", money(result.gross_income))?;
    if !result.pre_tax_contributions.is_zero() {
        row(out, "Pre-tax contributions", money(result.pre_tax_contributions))?;
    }
    for j in &result.jurisdictions {
        row(out, &format!("{} tax", j.name), money(j.tax))?;
        for credit in &j.credits {
            row(
                out,
                &format!("  credit for {}", credit.paid_to),
                money(-credit.amount),
            )?;
        }
    }
    row(out, "Social Security", money(result.fica.social_security))?;
    row(out, "Medicare", money(result.fica.medicare))?;
    if !result.fica.additional_medicare.is_zero() {
        row(out, "Additional Medicare", money(result.fica.additional_medicare))?;
    }
    row(out, "Total tax", money(result.total_tax))?;
    row(out, "Effective rate", percent(result.effective_rate))?;
    row(out, "Withheld to date", money(result.withheld_ytd))?;
    let label = if result.is_refund() {
        "Refund"
    } else {
        "Balance due"
    };
    row(out, label, money(result.refund_or_owed.abs()))
}

fn marginal(
    out: &mut String,
    rates: &MarginalRates,
) -> fmt::Result {
    writeln!(out, "Marginal rates")?;
    for j in &rates.jurisdictions {
        let label = if j.sourced_only {
            format!("{} (sourced only)", j.jurisdiction)
        } else {
            j.jurisdiction.clone()
        };
        row(out, &label, percent(j.rate))?;
    }
    row(out, "FICA", percent(rates.fica))?;
    row(out, "Combined", percent(rates.combined))
}

fn optimization(
    out: &mut String,
    result: &OptimizerResult,
) -> fmt::Result {
    writeln!(out, "401(k) recommendation")?;
    row(out, "Current percent", format!("{}%", result.current_contribution_percent))?;
    row(out, "Recommended percent", format!("{}%", result.recommended_percent))?;
    let limit_label = if result.catch_up_eligible {
        "Annual limit (with catch-up)"
    } else {
        "Annual limit"
    };
    row(out, limit_label, money(result.max_contribution))?;
    row(out, "Remaining room", money(result.remaining_room))?;
    row(out, "Salary per paycheck", money(result.per_period_salary))?;
    row(out, "Projected year-end total", money(result.projected_year_end_contribution))?;
    row(out, "Estimated tax savings", money(result.tax_savings))?;
    match &result.savings_basis {
        SavingsBasis::FlatRate { rate } => row(out, "  at flat rate", percent(*rate)),
        SavingsBasis::Differential {
            tax_without_contribution,
            tax_with_contribution,
        } => {
            row(out, "  tax without contribution", money(*tax_without_contribution))?;
            row(out, "  tax with contribution", money(*tax_with_contribution))
        }
    }
}

fn scenario_table(
    out: &mut String,
    scenario: &ContributionScenario,
) -> fmt::Result {
    writeln!(
        out,
        "401(k) scenario at {}% ({} per paycheck, limit {})",
        scenario.contribution_percent,
        money(scenario.per_period_contribution),
        money(scenario.max_contribution)
    )?;
    writeln!(out, "  {:>6}{:>16}{:>16}{:>16}", "period", "contribution", "cumulative", "room")?;
    for p in &scenario.periods {
        writeln!(
            out,
            "  {:>6}{:>16}{:>16}{:>16}",
            p.period,
            money(p.contribution),
            money(p.cumulative),
            money(p.remaining_room)
        )?;
    }
    row(out, "Final contribution", money(scenario.final_contribution))?;
    match scenario.max_out_period {
        Some(period) => row(out, "Maxes out at period", period),
        None => row(out, "Maxes out", "no"),
    }
}

fn quarterly(
    out: &mut String,
    schedule: &QuarterlySchedule,
) -> fmt::Result {
    writeln!(
        out,
        "Estimated payments for {} (annual {})",
        schedule.tax_year,
        money(schedule.annual_liability)
    )?;
    for e in &schedule.estimates {
        estimate(out, e)?;
    }

    let harbor = &schedule.safe_harbor;
    writeln!(out, "Safe harbor")?;
    row(
        out,
        &format!("Current year × {}", harbor.current_year_factor),
        money(harbor.current_year_amount),
    )?;
    let prior_label = match harbor.prior_year_factor {
        Some(factor) => format!("Prior year × {factor}"),
        None => "Prior year".to_string(),
    };
    row(out, &prior_label, opt_money(harbor.prior_year_amount))?;
    row(out, "Required annual payment", money(harbor.required_annual_payment))?;
    row(out, "Required per quarter", money(harbor.required_quarterly_payment))?;
    row(out, "Paid so far", money(harbor.total_paid))?;
    row(out, "Remaining required", money(harbor.remaining_required))
}

fn estimate(
    out: &mut String,
    estimate: &QuarterlyEstimate,
) -> fmt::Result {
    let status = match estimate.paid_amount {
        Some(amount) => format!("paid {}", money(amount)),
        None => "unpaid".to_string(),
    };
    writeln!(
        out,
        "  {} due {}{:>VALUE_WIDTH$}  {status}",
        estimate.quarter,
        estimate.due_date,
        money(estimate.total_amount)
    )?;
    for line in &estimate.amounts {
        writeln!(out, "      {:<20}{:>VALUE_WIDTH$}", line.jurisdiction, money(line.amount))?;
    }
    Ok(())
}

fn events(
    out: &mut String,
    events: &[RsuVestingEvent],
) -> fmt::Result {
    if events.is_empty() {
        return writeln!(out, "No vesting events");
    }
    writeln!(
        out,
        "  {:>4}  {:<12}{:<8}{:<12}{:>8}{:>14}{:>16}",
        "id", "grant", "symbol", "vests", "shares", "fmv", "value"
    )?;
    for event in events {
        let d = &event.details;
        writeln!(
            out,
            "  {:>4}  {:<12}{:<8}{:<12}{:>8}{:>14}{:>16}",
            event.id,
            d.grant_id,
            d.symbol,
            d.vesting_date,
            d.shares_vesting,
            money(d.fmv_at_vest),
            money(d.total_value)
        )?;
    }
    Ok(())
}

fn vesting_summary(
    out: &mut String,
    as_of: chrono::NaiveDate,
    summary: &RsuVestingSummary,
    income: &RsuIncome,
) -> fmt::Result {
    writeln!(out, "RSU summary as of {as_of}")?;
    row(out, "Grants", summary.total_grants)?;
    row(out, "Shares granted", summary.total_shares_granted)?;
    row(out, "Shares vested", summary.total_shares_vested)?;
    row(out, "Shares pending", summary.total_shares_pending)?;
    row(out, "Value vested", money(summary.value_vested))?;
    row(out, "Value pending", money(summary.value_pending))?;
    row(out, &format!("{} income vested", income.tax_year), money(income.vested))?;
    row(out, &format!("{} income pending", income.tax_year), money(income.pending))?;
    if let Some(next) = summary.upcoming_vests.first() {
        row(
            out,
            "Next vest",
            format!("{} {}", next.vesting_date(), money(next.total_value())),
        )?;
    }
    Ok(())
}

fn config_text(
    out: &mut String,
    config: &TaxYearConfig,
) -> fmt::Result {
    writeln!(out, "Tax year {} ({})", config.tax_year, config.filing_status.label())?;
    for j in &config.jurisdictions {
        let scope = if j.sourced_only { ", sourced only" } else { "" };
        writeln!(
            out,
            "  {} [{}]: {} brackets, top rate {}, deduction {}{scope}",
            j.name,
            j.id,
            j.brackets.len(),
            percent(j.brackets.top_rate()),
            money(j.standard_deduction)
        )?;
    }
    let fica = &config.fica;
    writeln!(
        out,
        "  FICA: Social Security {} to {}, Medicare {}, additional {} over {}",
        percent(fica.social_security_rate),
        money(fica.social_security_wage_base),
        percent(fica.medicare_rate),
        percent(fica.additional_medicare_rate),
        money(fica.additional_medicare_threshold)
    )?;
    let plan = &config.retirement_plan;
    writeln!(
        out,
        "  401(k): limit {}, catch-up {} at {}, {} pay periods",
        money(plan.elective_deferral_limit),
        money(plan.catch_up_limit),
        plan.catch_up_age,
        plan.pay_periods_per_year
    )?;
    let dates: Vec<String> = config
        .quarterly
        .due_dates
        .iter()
        .map(ToString::to_string)
        .collect();
    writeln!(out, "  Quarterly due dates: {}", dates.join(", "))
}
