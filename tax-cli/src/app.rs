//! Application layer: wires configuration, the planner store and the
//! calculators together for one command.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use tax_core::calculations::{
    ContributionOptimizer, ContributionScenario, MarginalRates, OptimizerInput, OptimizerResult,
    PriorYear, ProjectionInput, ProjectionResult, QuarterlyEstimate, QuarterlyEstimator,
    QuarterlySchedule,
    RsuIncome, RsuVestingSummary, ScheduleWarning, TaxProjector, TaxSavingsMethod, Withholding,
    income_for_year, prepare_event, summarize,
};
use tax_core::db::{DbConfig, PlannerRepository, RepositoryError, RepositoryRegistry};
use tax_core::{
    Quarter, QuarterlyPayment, RsuVestingEvent, RsuVestingEventInput, TaxYearConfig,
};
use tax_data::{RsuCsvLoader, TaxYearConfigLoader};
use tax_db_sqlite::SqliteRepositoryFactory;

use crate::cli::{
    Command, ContributionArgs, ProjectionArgs, RsuCommand, ScheduleArgs, VestingArgs, VestingChanges,
};

/// Optional subsystems available to this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Paid quarters and vesting events can be read and recorded.
    pub persistence: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self { persistence: true }
    }

    pub fn engine_only() -> Self {
        Self { persistence: false }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("{feature} needs the planner store, which is disabled")]
    StoreUnavailable { feature: &'static str },

    #[error("no vesting event with id {0}")]
    VestingEventNotFound(i64),

    #[error("no payment recorded for {quarter} {tax_year}")]
    PaymentNotFound { tax_year: i32, quarter: Quarter },
}

/// Result of one command, printed as text or serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Projection(ProjectionResult),
    Marginal(MarginalRates),
    Optimization(OptimizerResult),
    Scenario(ContributionScenario),
    Quarterly(QuarterlySchedule),
    /// One quarter after its paid status changed.
    QuarterEstimate(QuarterlyEstimate),
    VestingEvent(RsuVestingEvent),
    VestingEventDeleted {
        deleted_id: i64,
    },
    VestingEvents(Vec<RsuVestingEvent>),
    VestingImport {
        imported: Vec<RsuVestingEvent>,
        warnings: Vec<ScheduleWarning>,
    },
    VestingSummary {
        as_of: NaiveDate,
        summary: RsuVestingSummary,
        income: RsuIncome,
    },
    Config(TaxYearConfig),
}

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Loads and validates the tax-year configuration, falling back to the
/// bundled tables when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<TaxYearConfig> {
    let config = match path {
        Some(path) => TaxYearConfigLoader::from_file(path).with_context(|| {
            format!("failed to load tax-year configuration from {}", path.display())
        })?,
        None => TaxYearConfigLoader::bundled().context("bundled tax-year configuration is invalid")?,
    };
    info!(
        tax_year = config.tax_year,
        filing_status = %config.filing_status,
        jurisdictions = config.jurisdictions.len(),
        "Tax-year configuration loaded"
    );
    Ok(config)
}

pub struct App {
    config: TaxYearConfig,
    store: Option<Box<dyn PlannerRepository>>,
    as_of: NaiveDate,
}

impl App {
    /// `as_of` separates vested from pending RSU events.
    pub fn new(
        config: TaxYearConfig,
        store: Option<Box<dyn PlannerRepository>>,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            config,
            store,
            as_of,
        }
    }

    /// Opens the store through `registry` when persistence is enabled.
    pub async fn open(
        config: TaxYearConfig,
        capabilities: Capabilities,
        registry: &RepositoryRegistry,
        db: &DbConfig,
        as_of: NaiveDate,
    ) -> Result<Self> {
        let store = if capabilities.persistence {
            debug!(backend = %db.backend, "Connecting to planner store");
            let repo = registry.create(db).await.with_context(|| {
                format!(
                    "failed to open {} store at '{}'",
                    db.backend, db.connection_string
                )
            })?;
            Some(repo)
        } else {
            debug!("Planner store disabled");
            None
        };
        Ok(Self::new(config, store, as_of))
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            persistence: self.store.is_some(),
        }
    }

    pub fn config(&self) -> &TaxYearConfig {
        &self.config
    }

    fn store(
        &self,
        feature: &'static str,
    ) -> Result<&dyn PlannerRepository, AppError> {
        self.store
            .as_deref()
            .ok_or(AppError::StoreUnavailable { feature })
    }

    pub async fn run(
        &self,
        command: &Command,
    ) -> Result<Report> {
        match command {
            Command::Project(args) => {
                let input = self.projection_input(args).await?;
                let result = TaxProjector::from_config(&self.config).project(&input)?;
                Ok(Report::Projection(result))
            }
            Command::Marginal(args) => {
                let input = self.projection_input(args).await?;
                let rates = TaxProjector::from_config(&self.config).marginal_rates(&input)?;
                Ok(Report::Marginal(rates))
            }
            Command::Optimize {
                plan,
                flat_rate,
                income,
            } => self.optimize(plan, *flat_rate, *income),
            Command::Scenario(plan) => {
                let scenario = ContributionOptimizer::new(&self.config.retirement_plan)
                    .scenario(&optimizer_input(plan))?;
                Ok(Report::Scenario(scenario))
            }
            Command::Quarterly(args) => {
                let projection = self.schedule_projection(args).await?;
                let schedule = self.schedule(&projection, args).await?;
                Ok(Report::Quarterly(schedule))
            }
            Command::MarkPaid {
                quarter,
                amount,
                schedule,
            } => {
                let payment = QuarterlyPayment::new(self.config.tax_year, *quarter, *amount)?;
                let store = self.store("mark-paid")?;
                let projection = self.schedule_projection(schedule).await?;

                store.upsert_quarterly_payment(&payment).await?;
                info!(
                    tax_year = payment.tax_year,
                    quarter = %payment.quarter,
                    amount = %payment.amount,
                    "Quarter marked paid"
                );

                let estimate = self
                    .schedule(&projection, schedule)
                    .await?
                    .mark_paid(*quarter, payment.amount)?;
                Ok(Report::QuarterEstimate(estimate))
            }
            Command::UnmarkPaid { quarter, schedule } => {
                let tax_year = self.config.tax_year;
                let parsed = Quarter::try_from(*quarter)?;
                let store = self.store("unmark-paid")?;
                let projection = self.schedule_projection(schedule).await?;

                match store.delete_quarterly_payment(tax_year, parsed).await {
                    Ok(()) => info!(tax_year, quarter = %parsed, "Quarter marked unpaid"),
                    Err(RepositoryError::NotFound) => {
                        return Err(AppError::PaymentNotFound {
                            tax_year,
                            quarter: parsed,
                        }
                        .into());
                    }
                    Err(e) => return Err(e.into()),
                }

                let estimate = self
                    .schedule(&projection, schedule)
                    .await?
                    .unmark_paid(*quarter)?;
                Ok(Report::QuarterEstimate(estimate))
            }
            Command::Rsu(command) => self.rsu(command).await,
            Command::Config => Ok(Report::Config(self.config.clone())),
        }
    }

    async fn projection_input(
        &self,
        args: &ProjectionArgs,
    ) -> Result<ProjectionInput> {
        let rsu_income = if args.include_stored_rsu {
            let events = self
                .store("--include-stored-rsu")?
                .list_vesting_events()
                .await?;
            let income = income_for_year(&events, self.config.tax_year, self.as_of);
            debug!(
                tax_year = income.tax_year,
                vested = %income.vested,
                pending = %income.pending,
                "Using stored RSU income"
            );
            income.total
        } else {
            args.rsu_income
        };

        Ok(ProjectionInput {
            ytd_gross_income: args.ytd_income,
            ytd_withholding: Withholding {
                by_jurisdiction: sum_by_jurisdiction(&args.withheld),
                fica: args.fica_withheld,
            },
            full_year_income: args.income,
            rsu_income,
            fica_wages: args.fica_wages,
            pre_tax_contributions: args.pre_tax,
            sourced_income: sum_by_jurisdiction(&args.sourced),
        })
    }

    fn optimize(
        &self,
        plan: &ContributionArgs,
        flat_rate: Option<Option<Decimal>>,
        income: Option<Decimal>,
    ) -> Result<Report> {
        let optimizer = ContributionOptimizer::new(&self.config.retirement_plan);
        let input = optimizer_input(plan);

        let result = match flat_rate {
            Some(rate) => {
                let rate = rate.unwrap_or(self.config.retirement_plan.assumed_marginal_rate);
                optimizer.optimize(&input, TaxSavingsMethod::FlatRate(rate))?
            }
            None => {
                let projector = TaxProjector::from_config(&self.config);
                let base = ProjectionInput::new(income.unwrap_or(plan.salary));
                optimizer.optimize(
                    &input,
                    TaxSavingsMethod::Differential {
                        projector: &projector,
                        base: &base,
                    },
                )?
            }
        };
        Ok(Report::Optimization(result))
    }

    async fn schedule_projection(
        &self,
        args: &ScheduleArgs,
    ) -> Result<ProjectionResult> {
        let input = self.projection_input(&args.projection).await?;
        Ok(TaxProjector::from_config(&self.config).project(&input)?)
    }

    /// Quarterly schedule for `projection` with the stored payments applied.
    async fn schedule(
        &self,
        projection: &ProjectionResult,
        args: &ScheduleArgs,
    ) -> Result<QuarterlySchedule> {
        let prior_year = args.prior_year_liability.map(|liability| PriorYear {
            liability,
            agi: args.prior_year_agi,
        });

        let payments = match &self.store {
            Some(store) => store.list_quarterly_payments(self.config.tax_year).await?,
            None => {
                debug!("Planner store disabled; treating every quarter as unpaid");
                Vec::new()
            }
        };

        Ok(QuarterlyEstimator::from_config(&self.config).estimate(
            projection,
            prior_year.as_ref(),
            &payments,
        )?)
    }

    async fn rsu(
        &self,
        command: &RsuCommand,
    ) -> Result<Report> {
        let store = self.store("rsu")?;
        match command {
            RsuCommand::Add(args) => {
                let details = prepare_event(vesting_input(args))?;
                let event = store.create_vesting_event(details).await?;
                info!(id = event.id, grant_id = %event.details.grant_id, "Vesting event added");
                Ok(Report::VestingEvent(event))
            }
            RsuCommand::Update { id, changes } => {
                let existing = match store.get_vesting_event(*id).await {
                    Ok(event) => event,
                    Err(RepositoryError::NotFound) => {
                        return Err(AppError::VestingEventNotFound(*id).into());
                    }
                    Err(e) => return Err(e.into()),
                };
                let details = prepare_event(apply_changes(existing, changes))?;
                let event = RsuVestingEvent::new(*id, details);
                store.update_vesting_event(&event).await?;
                info!(id = event.id, "Vesting event updated");
                Ok(Report::VestingEvent(event))
            }
            RsuCommand::Delete { id } => match store.delete_vesting_event(*id).await {
                Ok(()) => {
                    info!(id, "Vesting event deleted");
                    Ok(Report::VestingEventDeleted { deleted_id: *id })
                }
                Err(RepositoryError::NotFound) => Err(AppError::VestingEventNotFound(*id).into()),
                Err(e) => Err(e.into()),
            },
            RsuCommand::List => Ok(Report::VestingEvents(store.list_vesting_events().await?)),
            RsuCommand::Grant { grant_id } => Ok(Report::VestingEvents(
                store.list_vesting_events_for_grant(grant_id.trim()).await?,
            )),
            RsuCommand::Import { path } => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open vesting schedule {}", path.display()))?;
                let import = RsuCsvLoader::import(file)
                    .with_context(|| format!("failed to import vesting schedule {}", path.display()))?;
                for warning in &import.warnings {
                    warn!(%warning, "Vesting schedule warning");
                }

                let imported = store.create_vesting_events(import.events).await?;
                info!(count = imported.len(), path = %path.display(), "Vesting schedule imported");
                Ok(Report::VestingImport {
                    imported,
                    warnings: import.warnings,
                })
            }
            RsuCommand::Summary => {
                let events = store.list_vesting_events().await?;
                Ok(Report::VestingSummary {
                    as_of: self.as_of,
                    summary: summarize(&events, self.as_of),
                    income: income_for_year(&events, self.config.tax_year, self.as_of),
                })
            }
        }
    }
}

fn sum_by_jurisdiction(pairs: &[(String, Decimal)]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for (jurisdiction, amount) in pairs {
        *totals.entry(jurisdiction.clone()).or_insert(Decimal::ZERO) += *amount;
    }
    totals
}

fn optimizer_input(args: &ContributionArgs) -> OptimizerInput {
    OptimizerInput {
        annual_salary: args.salary,
        current_contribution_percent: args.percent,
        ytd_contribution: args.ytd_contribution,
        remaining_pay_periods: args.remaining_periods,
        age: args.age,
    }
}

fn vesting_input(args: &VestingArgs) -> RsuVestingEventInput {
    RsuVestingEventInput {
        grant_id: args.grant_id.clone(),
        symbol: args.symbol.clone(),
        grant_date: args.grant_date,
        vesting_date: args.vesting_date,
        shares_vesting: args.shares,
        fmv_at_vest: args.fmv,
    }
}

fn apply_changes(
    existing: RsuVestingEvent,
    changes: &VestingChanges,
) -> RsuVestingEventInput {
    let details = existing.details;
    RsuVestingEventInput {
        grant_id: changes.grant_id.clone().unwrap_or(details.grant_id),
        symbol: changes.symbol.clone().unwrap_or(details.symbol),
        grant_date: changes.grant_date.unwrap_or(details.grant_date),
        vesting_date: changes.vesting_date.unwrap_or(details.vesting_date),
        shares_vesting: changes.shares.unwrap_or(details.shares_vesting),
        fmv_at_vest: changes.fmv.unwrap_or(details.fmv_at_vest),
    }
}
