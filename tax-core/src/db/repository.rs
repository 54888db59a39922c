use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewRsuVestingEvent, Quarter, QuarterlyPayment, RsuVestingEvent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Caller-owned planner state: quarterly paid flags and RSU vesting events.
///
/// Implementations serialize concurrent writes; the calculators only ever see
/// snapshots.
#[async_trait]
pub trait PlannerRepository: Send + Sync {
    // Quarterly payments
    async fn list_quarterly_payments(
        &self,
        tax_year: i32,
    ) -> Result<Vec<QuarterlyPayment>, RepositoryError>;

    /// Inserts or replaces the payment for `(tax_year, quarter)`.
    async fn upsert_quarterly_payment(
        &self,
        payment: &QuarterlyPayment,
    ) -> Result<(), RepositoryError>;

    /// Returns [`RepositoryError::NotFound`] if nothing was recorded.
    async fn delete_quarterly_payment(
        &self,
        tax_year: i32,
        quarter: Quarter,
    ) -> Result<(), RepositoryError>;

    // RSU vesting events
    async fn create_vesting_event(
        &self,
        event: NewRsuVestingEvent,
    ) -> Result<RsuVestingEvent, RepositoryError>;

    /// Inserts every event or none of them.
    async fn create_vesting_events(
        &self,
        events: Vec<NewRsuVestingEvent>,
    ) -> Result<Vec<RsuVestingEvent>, RepositoryError>;

    async fn get_vesting_event(&self, id: i64) -> Result<RsuVestingEvent, RepositoryError>;

    /// Events ordered by vesting date, then id.
    async fn list_vesting_events(&self) -> Result<Vec<RsuVestingEvent>, RepositoryError>;

    /// Events of one grant, ordered like [`Self::list_vesting_events`].
    async fn list_vesting_events_for_grant(
        &self,
        grant_id: &str,
    ) -> Result<Vec<RsuVestingEvent>, RepositoryError>;

    async fn update_vesting_event(
        &self,
        event: &RsuVestingEvent,
    ) -> Result<(), RepositoryError>;

    async fn delete_vesting_event(&self, id: i64) -> Result<(), RepositoryError>;
}
