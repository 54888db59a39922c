//! Import of RSU vesting schedules exported from brokerage spreadsheets.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter and extra
//! columns (such as a `total_shares` column) are ignored.
//!
//! | Column           | Type    | Notes                                           |
//! |------------------|---------|-------------------------------------------------|
//! | `grant_id`       | string  | Non-blank                                       |
//! | `symbol`         | string  | Upper-cased on import                           |
//! | `grant_date`     | date    | `YYYY-MM-DD`, `MM/DD/YYYY`, `MM-DD-YYYY`, `YYYY/MM/DD` |
//! | `vesting_date`   | date    | Same layouts; not before `grant_date`           |
//! | `shares_vesting` | integer | Positive; `125.0` is accepted                   |
//! | `fmv_at_vest`    | decimal | `$` and `,` are stripped                        |
//!
//! ```csv
//! grant_id,symbol,grant_date,vesting_date,shares_vesting,fmv_at_vest
//! GRANT-001,GOOG,2024-01-15,2024-03-15,125,140.50
//! GRANT-001,GOOG,2024-01-15,06/15/2024,125,"$1,155.00"
//! ```
use std::collections::HashMap;
use std::io::Read;

use tax_core::calculations::{ScheduleWarning, prepare_event, validate_schedule};
use tax_core::{CalculationError, NewRsuVestingEvent, RsuVestingEventInput};
use thiserror::Error;

use crate::fields::{FieldError, parse_date, parse_money, parse_share_count};

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "grant_id",
    "symbol",
    "grant_date",
    "vesting_date",
    "shares_vesting",
    "fmv_at_vest",
];

#[derive(Debug, Error)]
pub enum RsuCsvError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    /// `row` is the spreadsheet row number; the header is row 1.
    #[error("row {row}: {column}: {source}")]
    Field {
        row: usize,
        column: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("row {row}: {source}")]
    Event {
        row: usize,
        #[source]
        source: CalculationError,
    },

    #[error("no vesting events found in CSV")]
    NoEvents,
}

impl From<csv::Error> for RsuCsvError {
    fn from(err: csv::Error) -> Self {
        RsuCsvError::CsvParse(err.to_string())
    }
}

/// Parsed events plus the schedule warnings they raised.
#[derive(Debug, Clone, PartialEq)]
pub struct RsuImport {
    pub events: Vec<NewRsuVestingEvent>,
    pub warnings: Vec<ScheduleWarning>,
}

pub struct RsuCsvLoader;

impl RsuCsvLoader {
    /// Parses every row into a validated event, in file order.
    ///
    /// # Errors
    ///
    /// Fails on the first bad row; nothing is returned for the rows before it.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<NewRsuVestingEvent>, RsuCsvError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: HashMap<String, usize> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect();
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|column| !columns.contains_key(*column))
            .collect();
        if !missing.is_empty() {
            return Err(RsuCsvError::MissingColumns(missing));
        }

        let mut events = Vec::new();
        for (idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row = idx + 2;
            let cell = |column: &'static str| -> &str {
                columns
                    .get(column)
                    .and_then(|&i| record.get(i))
                    .unwrap_or("")
            };
            let field_error = |column: &'static str| {
                move |source: FieldError| RsuCsvError::Field {
                    row,
                    column,
                    source,
                }
            };

            let input = RsuVestingEventInput {
                grant_id: cell("grant_id").to_string(),
                symbol: cell("symbol").to_string(),
                grant_date: parse_date(cell("grant_date")).map_err(field_error("grant_date"))?,
                vesting_date: parse_date(cell("vesting_date")).map_err(field_error("vesting_date"))?,
                shares_vesting: parse_share_count(cell("shares_vesting"))
                    .map_err(field_error("shares_vesting"))?,
                fmv_at_vest: parse_money(cell("fmv_at_vest")).map_err(field_error("fmv_at_vest"))?,
            };
            let event = prepare_event(input).map_err(|source| RsuCsvError::Event { row, source })?;
            events.push(event);
        }

        if events.is_empty() {
            return Err(RsuCsvError::NoEvents);
        }
        tracing::info!(count = events.len(), "Parsed RSU vesting events");
        Ok(events)
    }

    /// [`parse`](Self::parse) followed by the schedule consistency checks.
    pub fn import<R: Read>(reader: R) -> Result<RsuImport, RsuCsvError> {
        let events = Self::parse(reader)?;
        let warnings = validate_schedule(&events);
        Ok(RsuImport { events, warnings })
    }
}
