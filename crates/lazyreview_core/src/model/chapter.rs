//! Chapter review-cycle state.
//!
//! # Responsibility
//! - Hold one chapter's remaining reviews as paired `(date, event id)` records.
//! - Provide the queue primitives lifecycle code builds transitions from.
//! - Map to and from the persisted flat shape
//!   (`next_review_date` / `review_dates` / `event_ids`).
//!
//! # Invariants
//! - Remaining reviews are strictly chronological.
//! - The front record is the next review; an empty queue means the cycle is
//!   completed.
//! - Dates and their external ids move together, so the persisted
//!   `len(event_ids) == 1 + len(review_dates)` rule holds by construction.

use crate::schedule::calculator::{format_date, parse_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One pending review and the calendar entry mirroring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReview {
    pub date: NaiveDate,
    /// `None` when the calendar entry could not be created.
    pub event_id: Option<String>,
}

impl ScheduledReview {
    pub fn new(date: NaiveDate, event_id: Option<String>) -> Self {
        Self { date, event_id }
    }
}

/// Coarse lifecycle state derived from the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    /// At least one review is pending.
    Active,
    /// Every review of the cycle was confirmed.
    Completed,
}

/// Persisted chapter shape that failed consistency checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDataError {
    pub title: String,
    pub message: String,
}

impl Display for ChapterDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "chapter `{}`: {}", self.title, self.message)
    }
}

impl Error for ChapterDataError {}

/// One reviewable unit inside a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChapterRecord", into = "ChapterRecord")]
pub struct Chapter {
    title: String,
    start_date: NaiveDate,
    reviews: VecDeque<ScheduledReview>,
}

impl Chapter {
    /// Creates a chapter whose cycle began on `start_date`.
    ///
    /// `reviews` must already be chronological; lifecycle code produces them
    /// from `compute_review_dates`.
    pub fn new(
        title: impl Into<String>,
        start_date: NaiveDate,
        reviews: impl IntoIterator<Item = ScheduledReview>,
    ) -> Self {
        Self {
            title: title.into(),
            start_date,
            reviews: reviews.into_iter().collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn state(&self) -> ChapterState {
        if self.reviews.is_empty() {
            ChapterState::Completed
        } else {
            ChapterState::Active
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state() == ChapterState::Completed
    }

    pub fn next_review_date(&self) -> Option<NaiveDate> {
        self.reviews.front().map(|review| review.date)
    }

    /// Queued review dates after the next one.
    pub fn review_dates(&self) -> Vec<NaiveDate> {
        self.reviews.iter().skip(1).map(|review| review.date).collect()
    }

    /// External ids for every remaining review, next review first.
    pub fn event_ids(&self) -> Vec<Option<&str>> {
        self.reviews
            .iter()
            .map(|review| review.event_id.as_deref())
            .collect()
    }

    pub fn remaining_reviews(&self) -> impl Iterator<Item = &ScheduledReview> {
        self.reviews.iter()
    }

    pub fn remaining_count(&self) -> usize {
        self.reviews.len()
    }

    /// Consumes the next review.
    ///
    /// The cycle start moves to the consumed review's date. Returns the
    /// consumed record so its calendar entry can be cancelled, or `None`
    /// when the chapter is already completed.
    pub fn pop_next_review(&mut self) -> Option<ScheduledReview> {
        let review = self.reviews.pop_front()?;
        self.start_date = review.date;
        Some(review)
    }

    /// Removes and returns every remaining review, leaving the chapter completed.
    pub fn take_remaining_reviews(&mut self) -> Vec<ScheduledReview> {
        self.reviews.drain(..).collect()
    }

    /// Replaces the whole cycle with a fresh one starting on `start_date`.
    pub fn replace_cycle(
        &mut self,
        start_date: NaiveDate,
        reviews: impl IntoIterator<Item = ScheduledReview>,
    ) {
        self.start_date = start_date;
        self.reviews = reviews.into_iter().collect();
    }
}

/// Flat on-disk representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChapterRecord {
    title: String,
    start_date: String,
    next_review_date: Option<String>,
    #[serde(default)]
    review_dates: Vec<String>,
    #[serde(default)]
    event_ids: Vec<String>,
}

impl From<Chapter> for ChapterRecord {
    fn from(value: Chapter) -> Self {
        let mut dates = value.reviews.iter().map(|review| format_date(review.date));
        let next_review_date = dates.next();
        let review_dates = dates.collect();
        let event_ids = value
            .reviews
            .into_iter()
            .map(|review| review.event_id.unwrap_or_default())
            .collect();
        Self {
            title: value.title,
            start_date: format_date(value.start_date),
            next_review_date,
            review_dates,
            event_ids,
        }
    }
}

impl TryFrom<ChapterRecord> for Chapter {
    type Error = ChapterDataError;

    fn try_from(value: ChapterRecord) -> Result<Self, Self::Error> {
        let title = value.title;
        let invalid = |message: String| ChapterDataError {
            title: title.clone(),
            message,
        };

        if title.trim().is_empty() {
            return Err(invalid("title cannot be empty".to_string()));
        }

        let start_date = parse_date(&value.start_date).map_err(|err| invalid(err.to_string()))?;

        let dates = match value.next_review_date {
            None => {
                if !value.review_dates.is_empty() || !value.event_ids.is_empty() {
                    return Err(invalid(
                        "completed chapter must not keep queued reviews or event ids".to_string(),
                    ));
                }
                Vec::new()
            }
            Some(next) => std::iter::once(next)
                .chain(value.review_dates)
                .map(|text| parse_date(&text).map_err(|err| invalid(err.to_string())))
                .collect::<Result<Vec<_>, _>>()?,
        };

        if dates.len() != value.event_ids.len() {
            return Err(invalid(format!(
                "expected {} event ids for {} remaining reviews, found {}",
                dates.len(),
                dates.len(),
                value.event_ids.len()
            )));
        }
        if dates.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(invalid("review dates are not chronological".to_string()));
        }

        let reviews = dates
            .into_iter()
            .zip(value.event_ids)
            .map(|(date, id)| ScheduledReview::new(date, Some(id).filter(|id| !id.is_empty())))
            .collect();

        Ok(Self {
            title,
            start_date,
            reviews,
        })
    }
}
