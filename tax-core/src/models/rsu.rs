use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vesting event as entered or imported, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsuVestingEventInput {
    pub grant_id: String,
    pub symbol: String,
    pub grant_date: NaiveDate,
    pub vesting_date: NaiveDate,
    pub shares_vesting: u32,
    pub fmv_at_vest: Decimal,
}

/// Validated vesting event without a storage id.
///
/// `total_value` is fixed when the event is prepared and never recomputed
/// from a live quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRsuVestingEvent {
    pub grant_id: String,
    pub symbol: String,
    pub grant_date: NaiveDate,
    pub vesting_date: NaiveDate,
    pub shares_vesting: u32,
    pub fmv_at_vest: Decimal,
    pub total_value: Decimal,
}

/// Stored vesting event; `id` is assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsuVestingEvent {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewRsuVestingEvent,
}

impl RsuVestingEvent {
    pub fn new(
        id: i64,
        details: NewRsuVestingEvent,
    ) -> Self {
        Self { id, details }
    }

    pub fn vesting_date(&self) -> NaiveDate {
        self.details.vesting_date
    }

    pub fn shares_vesting(&self) -> u32 {
        self.details.shares_vesting
    }

    pub fn total_value(&self) -> Decimal {
        self.details.total_value
    }
}
