use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Bracket, BracketTable, BracketTableError};
use thiserror::Error;

/// Errors that can occur when loading bracket tables from CSV.
#[derive(Debug, Error)]
pub enum BracketCsvError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("brackets for '{jurisdiction}': {source}")]
    Table {
        jurisdiction: String,
        #[source]
        source: BracketTableError,
    },
}

impl From<csv::Error> for BracketCsvError {
    fn from(err: csv::Error) -> Self {
        BracketCsvError::CsvParse(err.to_string())
    }
}

/// A single record from a bracket CSV file.
///
/// - `jurisdiction`: jurisdiction id the row belongs to (e.g. `federal`)
/// - `upper_bound`: upper edge of the bracket; empty for the top bracket
/// - `rate`: marginal rate as a fraction (e.g. `0.10`)
///
/// Rows of one jurisdiction appear in ascending order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub jurisdiction: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .replace(',', "")
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub struct BracketCsvLoader;

impl BracketCsvLoader {
    /// Parse bracket records from a CSV reader, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketCsvError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .deserialize()
            .collect::<Result<Vec<BracketRecord>, _>>()?;
        Ok(records)
    }

    /// Groups records by jurisdiction and validates each group as a table.
    pub fn tables(records: &[BracketRecord]) -> Result<BTreeMap<String, BracketTable>, BracketCsvError> {
        let mut grouped: BTreeMap<String, Vec<Bracket>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.jurisdiction.clone())
                .or_default()
                .push(Bracket {
                    upper_bound: record.upper_bound,
                    rate: record.rate,
                });
        }

        grouped
            .into_iter()
            .map(|(jurisdiction, brackets)| match BracketTable::new(brackets) {
                Ok(table) => Ok((jurisdiction, table)),
                Err(source) => Err(BracketCsvError::Table {
                    jurisdiction,
                    source,
                }),
            })
            .collect()
    }

    pub fn load<R: Read>(reader: R) -> Result<BTreeMap<String, BracketTable>, BracketCsvError> {
        let records = Self::parse(reader)?;
        Self::tables(&records)
    }
}
