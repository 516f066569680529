//! Review interval configuration.
//!
//! # Responsibility
//! - Hold the ordered day offsets that define a review cadence.
//! - Parse the user-typed textual form (`"1 3 7 15"`, `"1,3,7,15"`).
//!
//! # Invariants
//! - A sequence is never empty.
//! - Every offset is strictly positive.
//! - One full cycle spans at most `MAX_CYCLE_DAYS` days.
//! - Instances are only constructed through validating constructors, so
//!   downstream scheduling code can rely on both invariants.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Offsets used on first start and by interval resets.
pub const DEFAULT_INTERVALS: [u32; 4] = [1, 3, 7, 15];

/// Longest allowed cycle, offsets summed (about one hundred years).
pub const MAX_CYCLE_DAYS: u64 = 36_525;

/// Validation failures for interval configuration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// No offsets were supplied (or the text contained none).
    Empty,
    /// An offset was zero or negative.
    NonPositive(i64),
    /// A token in the textual form was not an integer.
    NotANumber(String),
    /// The offsets add up to more than `MAX_CYCLE_DAYS`.
    CycleTooLong(u64),
}

impl Display for IntervalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "review intervals cannot be empty"),
            Self::NonPositive(value) => {
                write!(f, "review interval must be a positive day count, got {value}")
            }
            Self::NotANumber(token) => write!(f, "review interval `{token}` is not a number"),
            Self::CycleTooLong(total) => write!(
                f,
                "review intervals span {total} days; at most {MAX_CYCLE_DAYS} are allowed"
            ),
        }
    }
}

impl Error for IntervalError {}

/// Ordered, validated list of day offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u32>")]
pub struct IntervalSequence(Vec<u32>);

impl IntervalSequence {
    /// Builds a sequence from raw values, rejecting empty, non-positive or
    /// overlong input.
    pub fn new(values: impl IntoIterator<Item = i64>) -> Result<Self, IntervalError> {
        let mut offsets = Vec::new();
        let mut total: u64 = 0;
        for value in values {
            if value <= 0 {
                return Err(IntervalError::NonPositive(value));
            }
            total = total.saturating_add(value.unsigned_abs());
            if total > MAX_CYCLE_DAYS {
                return Err(IntervalError::CycleTooLong(total));
            }
            offsets.push(u32::try_from(value).map_err(|_| IntervalError::CycleTooLong(total))?);
        }
        if offsets.is_empty() {
            return Err(IntervalError::Empty);
        }
        Ok(Self(offsets))
    }

    /// Parses whitespace- and/or comma-separated integers.
    ///
    /// Every token must be an integer; a stray word is rejected rather than
    /// silently dropped.
    pub fn parse(text: &str) -> Result<Self, IntervalError> {
        let values = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<i64>()
                    .map_err(|_| IntervalError::NotANumber(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of reviews in one cycle.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for IntervalSequence {
    fn default() -> Self {
        Self(DEFAULT_INTERVALS.to_vec())
    }
}

impl TryFrom<Vec<i64>> for IntervalSequence {
    type Error = IntervalError;

    fn try_from(value: Vec<i64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntervalSequence> for Vec<u32> {
    fn from(value: IntervalSequence) -> Self {
        value.0
    }
}

impl Display for IntervalSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}
