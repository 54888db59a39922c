use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite};
use tax_core::{
    NewRsuVestingEvent, PlannerRepository, Quarter, QuarterlyPayment, RepositoryError,
    RsuVestingEvent,
};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal};

const VESTING_EVENT_COLUMNS: &str = "id, grant_id, symbol, grant_date, vesting_date, \
                                     shares_vesting, fmv_at_vest, total_value";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to a sqlx-style URL (`sqlite:planner.db`, `sqlite::memory:`),
    /// creating the file if missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens a separate database, so the
        // pool is pinned to one connection that is never recycled.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .acquire_timeout(Duration::from_secs(10))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Inserts one event through `executor` and returns its new id.
async fn insert_vesting_event<'e, E>(
    executor: E,
    event: &NewRsuVestingEvent,
) -> Result<i64, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO rsu_vesting_events (
            grant_id, symbol, grant_date, vesting_date,
            shares_vesting, fmv_at_vest, total_value
        ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.grant_id)
    .bind(&event.symbol)
    .bind(event.grant_date)
    .bind(event.vesting_date)
    .bind(i64::from(event.shares_vesting))
    .bind(decimal_to_text(event.fmv_at_vest))
    .bind(decimal_to_text(event.total_value))
    .execute(executor)
    .await
    .map_err(database_error)?;

    Ok(result.last_insert_rowid())
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_column<'r, T>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Corrupt(format!("column '{}': {}", column, e)))
}

fn row_to_quarterly_payment(row: &SqliteRow) -> Result<QuarterlyPayment, RepositoryError> {
    let quarter: i64 = get_column(row, "quarter")?;
    let quarter = u8::try_from(quarter)
        .ok()
        .and_then(|q| Quarter::try_from(q).ok())
        .ok_or_else(|| RepositoryError::Corrupt(format!("quarter {} is outside 1-4", quarter)))?;

    Ok(QuarterlyPayment {
        tax_year: get_column(row, "tax_year")?,
        quarter,
        amount: get_decimal(row, "amount")?,
    })
}

fn row_to_vesting_event(row: &SqliteRow) -> Result<RsuVestingEvent, RepositoryError> {
    let shares: i64 = get_column(row, "shares_vesting")?;
    let shares_vesting = u32::try_from(shares)
        .map_err(|_| RepositoryError::Corrupt(format!("share count {} is out of range", shares)))?;

    Ok(RsuVestingEvent::new(
        get_column(row, "id")?,
        NewRsuVestingEvent {
            grant_id: get_column(row, "grant_id")?,
            symbol: get_column(row, "symbol")?,
            grant_date: get_column::<NaiveDate>(row, "grant_date")?,
            vesting_date: get_column::<NaiveDate>(row, "vesting_date")?,
            shares_vesting,
            fmv_at_vest: get_decimal(row, "fmv_at_vest")?,
            total_value: get_decimal(row, "total_value")?,
        },
    ))
}

#[async_trait]
impl PlannerRepository for SqliteRepository {
    async fn list_quarterly_payments(
        &self,
        tax_year: i32,
    ) -> Result<Vec<QuarterlyPayment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tax_year, quarter, amount FROM quarterly_payments
             WHERE tax_year = ? ORDER BY quarter",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_quarterly_payment).collect()
    }

    async fn upsert_quarterly_payment(
        &self,
        payment: &QuarterlyPayment,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO quarterly_payments (tax_year, quarter, amount) VALUES (?, ?, ?)
             ON CONFLICT (tax_year, quarter) DO UPDATE SET
                amount = excluded.amount,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(payment.tax_year)
        .bind(i64::from(payment.quarter.number()))
        .bind(decimal_to_text(payment.amount))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!(
            tax_year = payment.tax_year,
            quarter = %payment.quarter,
            amount = %payment.amount,
            "Recorded quarterly payment"
        );
        Ok(())
    }

    async fn delete_quarterly_payment(
        &self,
        tax_year: i32,
        quarter: Quarter,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM quarterly_payments WHERE tax_year = ? AND quarter = ?")
            .bind(tax_year)
            .bind(i64::from(quarter.number()))
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create_vesting_event(
        &self,
        event: NewRsuVestingEvent,
    ) -> Result<RsuVestingEvent, RepositoryError> {
        let id = insert_vesting_event(&self.pool, &event).await?;
        Ok(RsuVestingEvent::new(id, event))
    }

    async fn create_vesting_events(
        &self,
        events: Vec<NewRsuVestingEvent>,
    ) -> Result<Vec<RsuVestingEvent>, RepositoryError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(database_error)?;
        let mut created = Vec::with_capacity(events.len());
        for event in events {
            let id = insert_vesting_event(&mut *tx, &event).await?;
            created.push(RsuVestingEvent::new(id, event));
        }
        tx.commit().await.map_err(database_error)?;

        debug!(count = created.len(), "Inserted vesting events");
        Ok(created)
    }

    async fn get_vesting_event(
        &self,
        id: i64,
    ) -> Result<RsuVestingEvent, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {VESTING_EVENT_COLUMNS} FROM rsu_vesting_events WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_vesting_event(&row)
    }

    async fn list_vesting_events(&self) -> Result<Vec<RsuVestingEvent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VESTING_EVENT_COLUMNS} FROM rsu_vesting_events ORDER BY vesting_date, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_vesting_event).collect()
    }

    async fn list_vesting_events_for_grant(
        &self,
        grant_id: &str,
    ) -> Result<Vec<RsuVestingEvent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VESTING_EVENT_COLUMNS} FROM rsu_vesting_events
             WHERE grant_id = ? ORDER BY vesting_date, id"
        ))
        .bind(grant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_vesting_event).collect()
    }

    async fn update_vesting_event(
        &self,
        event: &RsuVestingEvent,
    ) -> Result<(), RepositoryError> {
        let details = &event.details;
        let result = sqlx::query(
            "UPDATE rsu_vesting_events SET
                grant_id = ?, symbol = ?, grant_date = ?, vesting_date = ?,
                shares_vesting = ?, fmv_at_vest = ?, total_value = ?,
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&details.grant_id)
        .bind(&details.symbol)
        .bind(details.grant_date)
        .bind(details.vesting_date)
        .bind(i64::from(details.shares_vesting))
        .bind(decimal_to_text(details.fmv_at_vest))
        .bind(decimal_to_text(details.total_value))
        .bind(event.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_vesting_event(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM rsu_vesting_events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
