use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bracket table is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table has no brackets")]
    Empty,

    #[error("bracket {index} has a negative rate of {rate}")]
    NegativeRate { index: usize, rate: Decimal },

    #[error("bracket {index} has a rate of {rate}, which is above 100%")]
    RateAboveOne { index: usize, rate: Decimal },

    #[error("bracket {index} upper bound {upper_bound} must be positive")]
    NonPositiveBound { index: usize, upper_bound: Decimal },

    #[error("bracket {index} upper bound {upper_bound} does not exceed the previous bound {previous}")]
    NonIncreasingBound {
        index: usize,
        upper_bound: Decimal,
        previous: Decimal,
    },

    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedNotLast { index: usize },

    #[error("the last bracket must be unbounded")]
    MissingTopBracket,
}

/// One row of a progressive schedule: income up to `upper_bound` (inclusive)
/// is taxed at `rate`. `None` marks the unbounded top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl Bracket {
    pub fn bounded(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn top(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// A bracket together with the lower edge it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketBand {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl BracketBand {
    /// True when `amount` lies inside this band, treating the upper bound as
    /// exclusive so a threshold belongs to the band above it for the next dollar.
    pub fn contains_next_dollar(
        &self,
        amount: Decimal,
    ) -> bool {
        self.upper_bound.is_none_or(|upper| amount < upper)
    }
}

/// Validated progressive schedule covering 0 to infinity.
///
/// Upper bounds are strictly increasing and positive; exactly one bracket is
/// unbounded and it comes last. Rates lie in `[0, 1]` but need not be
/// monotonic. Deserialization goes through the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> Result<Self, BracketTableError> {
        if brackets.is_empty() {
            return Err(BracketTableError::Empty);
        }

        let last = brackets.len() - 1;
        let mut previous = Decimal::ZERO;

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Err(BracketTableError::NegativeRate {
                    index,
                    rate: bracket.rate,
                });
            }
            if bracket.rate > Decimal::ONE {
                return Err(BracketTableError::RateAboveOne {
                    index,
                    rate: bracket.rate,
                });
            }

            match bracket.upper_bound {
                None if index != last => {
                    return Err(BracketTableError::UnboundedNotLast { index });
                }
                None => {}
                Some(upper_bound) if upper_bound <= Decimal::ZERO => {
                    return Err(BracketTableError::NonPositiveBound { index, upper_bound });
                }
                Some(upper_bound) if index > 0 && upper_bound <= previous => {
                    return Err(BracketTableError::NonIncreasingBound {
                        index,
                        upper_bound,
                        previous,
                    });
                }
                Some(_) if index == last => {
                    return Err(BracketTableError::MissingTopBracket);
                }
                Some(upper_bound) => previous = upper_bound,
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Brackets paired with their lower edges, lowest first.
    pub fn bands(&self) -> impl Iterator<Item = BracketBand> + '_ {
        self.brackets.iter().scan(Decimal::ZERO, |lower, bracket| {
            let band = BracketBand {
                lower_bound: *lower,
                upper_bound: bracket.upper_bound,
                rate: bracket.rate,
            };
            if let Some(upper) = bracket.upper_bound {
                *lower = upper;
            }
            Some(band)
        })
    }

    pub fn top_rate(&self) -> Decimal {
        self.brackets
            .last()
            .map(|bracket| bracket.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<Bracket>> for BracketTable {
    type Error = BracketTableError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketTable> for Vec<Bracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}
