//! Cumulative review date computation.
//!
//! # Responsibility
//! - Turn a start date and an interval sequence into concrete review dates.
//! - Own the canonical `YYYY-MM-DD` text form for dates.
//!
//! # Invariants
//! - Offsets accumulate: review `k` lands on `start + i1 + ... + ik`.
//! - Output length equals interval count and is strictly increasing.
//! - Every produced date fits the four-digit year form; a cycle that would
//!   run past `9999-12-31` is an error, never a clamped date.
//! - All functions here are pure except `today`.

use crate::model::interval::IntervalSequence;
use chrono::{Datelike, Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical date format used in persisted documents and calendar payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MAX_YEAR: i32 = 9999;

static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date shape regex"));

/// Date text that is not a real `YYYY-MM-DD` calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError(pub String);

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid date `{}`; expected YYYY-MM-DD", self.0)
    }
}

impl Error for DateParseError {}

/// A cycle whose reviews would land after `9999-12-31`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeError {
    pub start: NaiveDate,
    pub days: u64,
}

impl Display for DateRangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "review {} days after {} falls past {MAX_YEAR}-12-31",
            self.days,
            format_date(self.start)
        )
    }
}

impl Error for DateRangeError {}

/// Computes every review date of one cycle.
///
/// The first element becomes the chapter's next review; the rest stay
/// queued.
///
/// # Errors
/// - `DateRangeError` when any review would fall after year 9999.
pub fn compute_review_dates(
    start: NaiveDate,
    intervals: &IntervalSequence,
) -> Result<Vec<NaiveDate>, DateRangeError> {
    let mut elapsed: u64 = 0;
    intervals
        .as_slice()
        .iter()
        .map(|offset| {
            elapsed += u64::from(*offset);
            start
                .checked_add_days(Days::new(elapsed))
                .filter(|date| date.year() <= MAX_YEAR)
                .ok_or(DateRangeError {
                    start,
                    days: elapsed,
                })
        })
        .collect()
}

/// Parses strict `YYYY-MM-DD` input.
///
/// Chrono alone accepts unpadded fields (`2024-1-2`); the shape check keeps
/// persisted documents byte-stable.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = value.trim();
    if !DATE_SHAPE_RE.is_match(trimmed) {
        return Err(DateParseError(trimmed.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| DateParseError(trimmed.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
