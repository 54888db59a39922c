//! RSU vesting aggregation.
//!
//! Events are split around a caller-supplied `now`: a vesting date strictly
//! before `now` is past (vested), anything on or after it is upcoming. The
//! recognized income of an event is `shares × FMV at vest`, fixed when the
//! event is prepared.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_up;
use crate::error::{CalculationError, require_non_negative};
use crate::models::{NewRsuVestingEvent, RsuVestingEvent, RsuVestingEventInput};

/// Total shares per grant above which the schedule is flagged.
pub const LARGE_GRANT_SHARES: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsuVestingSummary {
    pub total_grants: usize,
    pub total_shares_granted: u64,
    pub total_shares_vested: u64,
    pub total_shares_pending: u64,
    pub value_vested: Decimal,
    pub value_pending: Decimal,
    /// Ascending by vesting date.
    pub upcoming_vests: Vec<RsuVestingEvent>,
    /// Descending by vesting date.
    pub past_vests: Vec<RsuVestingEvent>,
}

/// Recognized RSU income for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsuIncome {
    pub tax_year: i32,
    pub vested: Decimal,
    pub pending: Decimal,
    pub total: Decimal,
}

/// Suspicious but non-fatal pattern in a vesting schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    MultipleSymbols {
        grant_id: String,
        symbols: Vec<String>,
    },
    MultipleGrantDates {
        grant_id: String,
        grant_dates: Vec<NaiveDate>,
    },
    DuplicateVestingDate {
        grant_id: String,
        vesting_date: NaiveDate,
    },
    LargeGrant {
        grant_id: String,
        total_shares: u64,
    },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::MultipleSymbols { grant_id, symbols } => {
                write!(f, "grant {grant_id} has multiple symbols: {}", symbols.join(", "))
            }
            Self::MultipleGrantDates {
                grant_id,
                grant_dates,
            } => {
                let dates: Vec<String> = grant_dates.iter().map(ToString::to_string).collect();
                write!(f, "grant {grant_id} has multiple grant dates: {}", dates.join(", "))
            }
            Self::DuplicateVestingDate {
                grant_id,
                vesting_date,
            } => write!(f, "grant {grant_id} vests more than once on {vesting_date}"),
            Self::LargeGrant {
                grant_id,
                total_shares,
            } => write!(f, "grant {grant_id} has an unusually large total of {total_shares} shares"),
        }
    }
}

/// Validates an event and fixes its total value.
///
/// The symbol is trimmed and upper-cased; the grant id is trimmed.
///
/// # Errors
///
/// [`CalculationError::InvalidInput`] if the grant id or symbol is blank, the
/// vesting date precedes the grant date, no shares vest, or the FMV is negative.
pub fn prepare_event(input: RsuVestingEventInput) -> Result<NewRsuVestingEvent, CalculationError> {
    let grant_id = input.grant_id.trim().to_string();
    if grant_id.is_empty() {
        return Err(CalculationError::invalid("grant_id", "must not be empty"));
    }
    let symbol = input.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(CalculationError::invalid("symbol", "must not be empty"));
    }
    if input.vesting_date < input.grant_date {
        return Err(CalculationError::invalid(
            "vesting_date",
            format!(
                "{} is before the grant date {}",
                input.vesting_date, input.grant_date
            ),
        ));
    }
    if input.shares_vesting == 0 {
        return Err(CalculationError::invalid("shares_vesting", "must be positive"));
    }
    require_non_negative("fmv_at_vest", input.fmv_at_vest)?;

    Ok(NewRsuVestingEvent {
        total_value: round_half_up(Decimal::from(input.shares_vesting) * input.fmv_at_vest),
        grant_id,
        symbol,
        grant_date: input.grant_date,
        vesting_date: input.vesting_date,
        shares_vesting: input.shares_vesting,
        fmv_at_vest: input.fmv_at_vest,
    })
}

pub fn is_vested(
    vesting_date: NaiveDate,
    now: NaiveDate,
) -> bool {
    vesting_date < now
}

/// Totals and the past/upcoming partition of `events` relative to `now`.
pub fn summarize(
    events: &[RsuVestingEvent],
    now: NaiveDate,
) -> RsuVestingSummary {
    let total_grants = events
        .iter()
        .map(|e| e.details.grant_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let (mut past_vests, mut upcoming_vests): (Vec<_>, Vec<_>) = events
        .iter()
        .cloned()
        .partition(|e| is_vested(e.vesting_date(), now));
    upcoming_vests.sort_by_key(|e| (e.vesting_date(), e.id));
    past_vests.sort_by(|a, b| {
        b.vesting_date()
            .cmp(&a.vesting_date())
            .then(a.id.cmp(&b.id))
    });

    let shares = |list: &[RsuVestingEvent]| -> u64 {
        list.iter().map(|e| u64::from(e.shares_vesting())).sum()
    };
    let value = |list: &[RsuVestingEvent]| -> Decimal { list.iter().map(|e| e.total_value()).sum() };

    let total_shares_granted = shares(events);
    let total_shares_vested = shares(&past_vests);

    RsuVestingSummary {
        total_grants,
        total_shares_granted,
        total_shares_vested,
        total_shares_pending: total_shares_granted - total_shares_vested,
        value_vested: value(&past_vests),
        value_pending: value(&upcoming_vests),
        upcoming_vests,
        past_vests,
    }
}

/// Recognized income from events vesting in `tax_year`.
pub fn income_for_year(
    events: &[RsuVestingEvent],
    tax_year: i32,
    now: NaiveDate,
) -> RsuIncome {
    let (vested, pending) = events
        .iter()
        .filter(|e| e.vesting_date().year() == tax_year)
        .fold((Decimal::ZERO, Decimal::ZERO), |(vested, pending), e| {
            if is_vested(e.vesting_date(), now) {
                (vested + e.total_value(), pending)
            } else {
                (vested, pending + e.total_value())
            }
        });

    RsuIncome {
        tax_year,
        vested,
        pending,
        total: vested + pending,
    }
}

/// Non-fatal consistency checks over a schedule, grouped by grant.
pub fn validate_schedule<'a>(
    events: impl IntoIterator<Item = &'a NewRsuVestingEvent>,
) -> Vec<ScheduleWarning> {
    let mut grants: BTreeMap<&str, Vec<&NewRsuVestingEvent>> = BTreeMap::new();
    for event in events {
        grants.entry(event.grant_id.as_str()).or_default().push(event);
    }

    let mut warnings = Vec::new();
    for (grant_id, grant_events) in grants {
        let symbols: BTreeSet<&str> = grant_events.iter().map(|e| e.symbol.as_str()).collect();
        if symbols.len() > 1 {
            warnings.push(ScheduleWarning::MultipleSymbols {
                grant_id: grant_id.to_string(),
                symbols: symbols.into_iter().map(String::from).collect(),
            });
        }

        let grant_dates: BTreeSet<NaiveDate> = grant_events.iter().map(|e| e.grant_date).collect();
        if grant_dates.len() > 1 {
            warnings.push(ScheduleWarning::MultipleGrantDates {
                grant_id: grant_id.to_string(),
                grant_dates: grant_dates.into_iter().collect(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for event in &grant_events {
            if !seen.insert(event.vesting_date) {
                duplicates.insert(event.vesting_date);
            }
        }
        warnings.extend(duplicates.into_iter().map(|vesting_date| {
            ScheduleWarning::DuplicateVestingDate {
                grant_id: grant_id.to_string(),
                vesting_date,
            }
        }));

        let total_shares: u64 = grant_events.iter().map(|e| u64::from(e.shares_vesting)).sum();
        if total_shares > LARGE_GRANT_SHARES {
            warnings.push(ScheduleWarning::LargeGrant {
                grant_id: grant_id.to_string(),
                total_shares,
            });
        }
    }

    for warning in &warnings {
        warn!(%warning, "Vesting schedule warning");
    }
    warnings
}
