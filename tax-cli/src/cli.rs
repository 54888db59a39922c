//! Command-line surface of `tax-planner`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Tax projection, 401(k) pacing, quarterly estimates and RSU tracking.
///
/// Reads a tax-year configuration (the bundled 2025 married-filing-jointly
/// tables unless `--config` is given) and keeps paid quarters and vesting
/// events in a local database.
#[derive(Debug, Parser)]
#[command(name = "tax-planner", version)]
pub struct Cli {
    /// Tax-year configuration file (TOML).
    #[arg(long, env = "TAX_PLANNER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, default_value = "sqlite", global = true)]
    pub backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `planner.db`) or `:memory:`.
    #[arg(long, env = "TAX_PLANNER_DB", default_value = "planner.db", global = true)]
    pub db: String,

    /// Run without the database. Commands that read or record payments and
    /// vesting events are unavailable.
    #[arg(long, global = true)]
    pub no_store: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter, e.g. `debug` or `warn,tax_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Suppress log output on stderr.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Date that separates vested from pending RSUs. Defaults to today.
    #[arg(long, value_parser = parse_date_arg, global = true)]
    pub as_of: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Project full-year tax and the refund or balance due.
    Project(ProjectionArgs),

    /// Marginal rate on the next dollar, per jurisdiction and combined.
    Marginal(ProjectionArgs),

    /// Recommend a 401(k) contribution percent that maxes out on the last paycheck.
    Optimize {
        #[command(flatten)]
        plan: ContributionArgs,

        /// Estimate savings as contribution × rate instead of re-projecting.
        /// Without a value the configured assumed marginal rate is used.
        #[arg(long, value_name = "RATE", num_args = 0..=1, value_parser = parse_amount)]
        flat_rate: Option<Option<Decimal>>,

        /// Full-year income for the re-projection. Defaults to the salary.
        #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
        income: Option<Decimal>,
    },

    /// Paycheck-by-paycheck 401(k) projection at the current percent.
    Scenario(ContributionArgs),

    /// Quarterly estimated payments and safe-harbor status.
    Quarterly(ScheduleArgs),

    /// Record a payment against a quarter and print the updated estimate.
    MarkPaid {
        /// Quarter number, 1 through 4.
        quarter: u8,

        #[arg(value_parser = parse_amount, allow_negative_numbers = true)]
        amount: Decimal,

        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Clear the recorded payment for a quarter and print its estimate.
    UnmarkPaid {
        /// Quarter number, 1 through 4.
        quarter: u8,

        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Manage RSU vesting events.
    #[command(subcommand)]
    Rsu(RsuCommand),

    /// Print the loaded tax-year configuration.
    Config,
}

#[derive(Debug, Clone, Subcommand)]
pub enum RsuCommand {
    /// Add one vesting event.
    Add(VestingArgs),

    /// Change fields of an existing event; the total value is recomputed.
    Update {
        id: i64,

        #[command(flatten)]
        changes: VestingChanges,
    },

    /// Delete an event by id.
    Delete { id: i64 },

    /// List all events by vesting date.
    List,

    /// List the events of one grant.
    Grant { grant_id: String },

    /// Import events from a CSV file.
    Import { path: PathBuf },

    /// Vested and pending totals, and recognized income for the tax year.
    Summary,
}

/// Income and withholding for one projection.
#[derive(Debug, Clone, Args)]
pub struct ProjectionArgs {
    /// Estimated full-year wage income.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub income: Decimal,

    /// Gross income received so far this year.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub ytd_income: Decimal,

    /// Income tax withheld so far, as `JURISDICTION=AMOUNT`. Repeatable.
    #[arg(long = "withheld", value_parser = parse_jurisdiction_amount)]
    pub withheld: Vec<(String, Decimal)>,

    /// FICA withheld so far.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub fica_withheld: Decimal,

    /// FICA wages, when they differ from income plus RSU income.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub fica_wages: Option<Decimal>,

    /// RSU income recognized this year.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub rsu_income: Decimal,

    /// Add income from stored vesting events in the tax year.
    #[arg(long, conflicts_with = "rsu_income")]
    pub include_stored_rsu: bool,

    /// Pre-tax retirement contributions for the year.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub pre_tax: Decimal,

    /// Income sourced to a non-resident jurisdiction, as `JURISDICTION=AMOUNT`. Repeatable.
    #[arg(long = "sourced", value_parser = parse_jurisdiction_amount)]
    pub sourced: Vec<(String, Decimal)>,
}

/// Inputs for a quarterly schedule.
#[derive(Debug, Clone, Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub projection: ProjectionArgs,

    /// Prior-year total tax, for the prior-year safe harbor.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub prior_year_liability: Option<Decimal>,

    /// Prior-year AGI; selects the 100% or 110% prior-year factor.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, requires = "prior_year_liability")]
    pub prior_year_agi: Option<Decimal>,
}

#[derive(Debug, Clone, Args)]
pub struct ContributionArgs {
    /// Annual salary.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub salary: Decimal,

    /// Current contribution percent of salary.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub percent: Decimal,

    /// Contributions made so far this year.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true, default_value = "0")]
    pub ytd_contribution: Decimal,

    /// Paychecks left in the year.
    #[arg(long)]
    pub remaining_periods: u32,

    /// Age at the end of the tax year.
    #[arg(long)]
    pub age: u32,
}

#[derive(Debug, Clone, Args)]
pub struct VestingArgs {
    #[arg(long)]
    pub grant_id: String,

    #[arg(long)]
    pub symbol: String,

    #[arg(long, value_parser = parse_date_arg)]
    pub grant_date: NaiveDate,

    #[arg(long, value_parser = parse_date_arg)]
    pub vesting_date: NaiveDate,

    #[arg(long, value_parser = parse_shares)]
    pub shares: u32,

    /// Fair market value per share at vest.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub fmv: Decimal,
}

#[derive(Debug, Clone, Default, Args)]
pub struct VestingChanges {
    #[arg(long)]
    pub grant_id: Option<String>,

    #[arg(long)]
    pub symbol: Option<String>,

    #[arg(long, value_parser = parse_date_arg)]
    pub grant_date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub vesting_date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_shares)]
    pub shares: Option<u32>,

    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub fmv: Option<Decimal>,
}

// ─── value parsers ───────────────────────────────────────────────────────────

/// Money or rate; `$` and thousands separators are accepted.
pub fn parse_amount(s: &str) -> Result<Decimal, String> {
    tax_data::parse_money(s).map_err(|e| e.to_string())
}

pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    tax_data::parse_date(s).map_err(|e| e.to_string())
}

fn parse_shares(s: &str) -> Result<u32, String> {
    tax_data::parse_share_count(s).map_err(|e| e.to_string())
}

/// Parses `JURISDICTION=AMOUNT`, e.g. `state-b=12,000`.
pub fn parse_jurisdiction_amount(s: &str) -> Result<(String, Decimal), String> {
    let (jurisdiction, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected JURISDICTION=AMOUNT, got '{s}'"))?;
    let jurisdiction = jurisdiction.trim();
    if jurisdiction.is_empty() {
        return Err(format!("missing jurisdiction in '{s}'"));
    }
    Ok((jurisdiction.to_string(), parse_amount(amount)?))
}
