//! Parsers for hand-entered spreadsheet cells: money with `$` and thousands
//! separators, dates in the common US and ISO layouts, and share counts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("value is empty")]
    Empty,

    #[error("invalid number '{input}': {reason}")]
    InvalidNumber { input: String, reason: String },

    #[error("invalid date '{0}'; use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid share count '{input}': {reason}")]
    InvalidShares { input: String, reason: &'static str },
}

/// Trims whitespace and strips `$` and `,`.
fn normalize_money(s: &str) -> String {
    s.trim().replace(['$', ','], "")
}

/// Parses a money cell such as `"$1,234.56"`.
pub fn parse_money(s: &str) -> Result<Decimal, FieldError> {
    let normalized = normalize_money(s);
    if normalized.is_empty() {
        return Err(FieldError::Empty);
    }
    normalized.parse().map_err(|e: rust_decimal::Error| {
        tracing::debug!(input = %s, "invalid money value: {}", e);
        FieldError::InvalidNumber {
            input: s.to_string(),
            reason: e.to_string(),
        }
    })
}

pub fn parse_date(s: &str) -> Result<NaiveDate, FieldError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| FieldError::InvalidDate(trimmed.to_string()))
}

/// Parses a whole, positive number of shares. `"125.0"` is accepted;
/// fractional shares are not.
pub fn parse_share_count(s: &str) -> Result<u32, FieldError> {
    let shares = parse_money(s).map_err(|e| match e {
        FieldError::InvalidNumber { input, .. } => FieldError::InvalidShares {
            input,
            reason: "not a number",
        },
        other => other,
    })?;
    let invalid = |reason| FieldError::InvalidShares {
        input: s.trim().to_string(),
        reason,
    };
    if !shares.fract().is_zero() {
        return Err(invalid("fractional shares are not supported"));
    }
    if shares <= Decimal::ZERO {
        return Err(invalid("must be positive"));
    }
    shares.to_u32().ok_or_else(|| invalid("too large"))
}
