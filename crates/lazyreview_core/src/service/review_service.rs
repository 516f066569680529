//! Review use-case service.
//!
//! # Responsibility
//! - Expose the presentation-facing operations (add, list due, confirm,
//!   decline, delete, reset, interval configuration).
//! - Own the in-memory catalog and persist it after every mutation.
//!
//! # Invariants
//! - Validation, duplicate and not-found failures leave catalog and calendar
//!   untouched.
//! - Calendar failures are absorbed by the sync adapter and only show up in
//!   `SyncSummary` counts.
//! - A persistence failure is returned to the caller; the in-memory catalog
//!   keeps the mutation and `persist()` can be retried.

use crate::model::catalog::Catalog;
use crate::model::chapter::Chapter;
use crate::model::interval::{IntervalError, IntervalSequence};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use crate::schedule::calculator::{parse_date, DateParseError, DateRangeError};
use crate::service::lifecycle::{ChapterLifecycle, SyncSummary};
use crate::sync::adapter::CalendarSyncAdapter;
use crate::sync::provider::CalendarProvider;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReviewResult<T> = Result<T, ReviewError>;

/// Caller input that cannot be acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty after trimming.
    MissingField(&'static str),
    Date(DateParseError),
    /// The cycle would run past the last representable date.
    DateRange(DateRangeError),
    Intervals(IntervalError),
    /// The chapter's cycle is already completed.
    NoPendingReview { subject: String, title: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::Date(err) => write!(f, "{err}"),
            Self::DateRange(err) => write!(f, "{err}"),
            Self::Intervals(err) => write!(f, "{err}"),
            Self::NoPendingReview { subject, title } => {
                write!(f, "`{subject} - {title}` has no pending review")
            }
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Date(err) => Some(err),
            Self::DateRange(err) => Some(err),
            Self::Intervals(err) => Some(err),
            Self::MissingField(_) | Self::NoPendingReview { .. } => None,
        }
    }
}

impl From<DateParseError> for ValidationError {
    fn from(value: DateParseError) -> Self {
        Self::Date(value)
    }
}

impl From<DateRangeError> for ValidationError {
    fn from(value: DateRangeError) -> Self {
        Self::DateRange(value)
    }
}

impl From<IntervalError> for ValidationError {
    fn from(value: IntervalError) -> Self {
        Self::Intervals(value)
    }
}

/// Service error surfaced to presentation callers.
#[derive(Debug)]
pub enum ReviewError {
    Validation(ValidationError),
    /// Chapter title already used within the subject.
    Duplicate { subject: String, title: String },
    /// Referenced subject (or chapter, when `title` is set) does not exist.
    NotFound {
        subject: String,
        title: Option<String>,
    },
    /// Catalog could not be saved or loaded.
    Persistence(RepoError),
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { subject, title } => {
                write!(f, "chapter `{title}` already exists in subject `{subject}`")
            }
            Self::NotFound {
                subject,
                title: None,
            } => write!(f, "subject not found: {subject}"),
            Self::NotFound {
                subject,
                title: Some(title),
            } => write!(f, "chapter not found: {subject} - {title}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Duplicate { .. } | Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for ReviewError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DateParseError> for ReviewError {
    fn from(value: DateParseError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<DateRangeError> for ReviewError {
    fn from(value: DateRangeError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<IntervalError> for ReviewError {
    fn from(value: IntervalError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<RepoError> for ReviewError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Chapter state after a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOutcome {
    pub subject: String,
    pub chapter: Chapter,
    pub sync: SyncSummary,
}

/// One chapter due for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReview {
    pub subject: String,
    pub chapter: Chapter,
}

/// Catalog overview row for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOverview {
    pub title: String,
    /// `None` once the cycle is completed.
    pub next_review_date: Option<NaiveDate>,
    pub remaining_reviews: usize,
}

/// Catalog overview for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectOverview {
    pub name: String,
    pub chapters: Vec<ChapterOverview>,
}

/// Use-case facade owning the catalog, its repository and the calendar.
pub struct ReviewService<R: CatalogRepository, C: CalendarProvider> {
    repo: R,
    adapter: CalendarSyncAdapter<C>,
    catalog: Catalog,
}

impl<R: CatalogRepository, C: CalendarProvider> ReviewService<R, C> {
    /// Loads the catalog from `repo` and binds the calendar adapter.
    pub fn open(repo: R, adapter: CalendarSyncAdapter<C>) -> ReviewResult<Self> {
        let catalog = repo.load()?;
        info!(
            "event=service_open module=service status=ok provider={} subjects={}",
            adapter.provider().provider_id(),
            catalog.subjects().len()
        );
        Ok(Self {
            repo,
            adapter,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn intervals(&self) -> &IntervalSequence {
        self.catalog.intervals()
    }

    pub fn adapter(&self) -> &CalendarSyncAdapter<C> {
        &self.adapter
    }

    /// Saves the current catalog; callers retry this after a failed mutation.
    pub fn persist(&self) -> ReviewResult<()> {
        self.repo.save(&self.catalog).map_err(|err| {
            error!(
                "event=catalog_persist module=service status=error error_code=persistence_failed"
            );
            ReviewError::from(err)
        })
    }

    /// Adds a chapter (creating its subject when new) and schedules its cycle.
    pub fn add_subject_and_chapter(
        &mut self,
        subject: &str,
        title: &str,
        start_date: &str,
    ) -> ReviewResult<ChapterOutcome> {
        let subject = required("subject name", subject)?;
        let title = required("chapter title", title)?;
        let start_date = parse_date(required("start date", start_date)?)?;

        if self
            .catalog
            .subject(subject)
            .is_some_and(|existing| existing.has_chapter(title))
        {
            warn!("event=chapter_add module=service status=error error_code=duplicate_chapter");
            return Err(ReviewError::Duplicate {
                subject: subject.to_string(),
                title: title.to_string(),
            });
        }

        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let (chapter, sync) = lifecycle
            .create(subject, title, start_date, self.catalog.intervals())
            .map_err(|err| {
                warn!("event=chapter_add module=service status=error error_code=date_out_of_range");
                err
            })?;
        self.catalog
            .find_or_create_subject(subject)
            .push_chapter(chapter.clone())
            .map_err(|_| ReviewError::Duplicate {
                subject: subject.to_string(),
                title: title.to_string(),
            })?;

        info!(
            "event=chapter_add module=service status=ok reviews={} events_scheduled={} events_failed={}",
            chapter.remaining_count(),
            sync.scheduled,
            sync.failed
        );
        self.persist()?;
        Ok(ChapterOutcome {
            subject: subject.to_string(),
            chapter,
            sync,
        })
    }

    /// Chapters whose next review falls on `today`, subject then chapter order.
    pub fn list_due_today(&self, today: NaiveDate) -> Vec<DueReview> {
        self.catalog
            .due_on(today)
            .into_iter()
            .map(|(subject, chapter)| DueReview {
                subject: subject.to_string(),
                chapter: chapter.clone(),
            })
            .collect()
    }

    /// Every subject with a short status for each chapter.
    pub fn list_subjects(&self) -> Vec<SubjectOverview> {
        self.catalog
            .subjects()
            .iter()
            .map(|subject| SubjectOverview {
                name: subject.name().to_string(),
                chapters: subject
                    .chapters()
                    .iter()
                    .map(|chapter| ChapterOverview {
                        title: chapter.title().to_string(),
                        next_review_date: chapter.next_review_date(),
                        remaining_reviews: chapter.remaining_count(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Records the pending review as done and advances the cycle.
    pub fn confirm_review(&mut self, subject: &str, title: &str) -> ReviewResult<ChapterOutcome> {
        let (subject, title) = chapter_key(subject, title)?;
        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let chapter = find_chapter_mut(&mut self.catalog, subject, title)?;
        let sync = lifecycle
            .advance_on_confirm(chapter)
            .ok_or_else(|| ValidationError::NoPendingReview {
                subject: subject.to_string(),
                title: title.to_string(),
            })?;
        let chapter = chapter.clone();

        info!(
            "event=review_confirm module=service status=ok remaining={} completed={} events_cancelled={} events_failed={}",
            chapter.remaining_count(),
            chapter.is_completed(),
            sync.cancelled,
            sync.failed
        );
        self.persist()?;
        Ok(ChapterOutcome {
            subject: subject.to_string(),
            chapter,
            sync,
        })
    }

    /// Abandons the current cycle and restarts it from `today`.
    pub fn decline_review(
        &mut self,
        subject: &str,
        title: &str,
        today: NaiveDate,
    ) -> ReviewResult<ChapterOutcome> {
        let (subject, title) = chapter_key(subject, title)?;
        let intervals = self.catalog.intervals().clone();
        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let chapter = find_chapter_mut(&mut self.catalog, subject, title)?;
        let sync = lifecycle.reset_cycle(subject, chapter, today, &intervals)?;
        let chapter = chapter.clone();

        info!(
            "event=review_reset module=service status=ok reviews={} events_cancelled={} events_scheduled={} events_failed={}",
            chapter.remaining_count(),
            sync.cancelled,
            sync.scheduled,
            sync.failed
        );
        self.persist()?;
        Ok(ChapterOutcome {
            subject: subject.to_string(),
            chapter,
            sync,
        })
    }

    /// Removes one chapter after cancelling its remaining calendar entries.
    pub fn delete_chapter(&mut self, subject: &str, title: &str) -> ReviewResult<SyncSummary> {
        let (subject, title) = chapter_key(subject, title)?;
        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let chapter = find_chapter_mut(&mut self.catalog, subject, title)?;
        let sync = lifecycle.delete(chapter);
        if let Some(owner) = self.catalog.subject_mut(subject) {
            owner.remove_chapter(title);
        }

        info!(
            "event=chapter_delete module=service status=ok events_cancelled={} events_failed={}",
            sync.cancelled, sync.failed
        );
        self.persist()?;
        Ok(sync)
    }

    /// Removes a subject and all its chapters, cancelling their entries.
    pub fn delete_subject(&mut self, subject: &str) -> ReviewResult<SyncSummary> {
        let subject = required("subject name", subject)?;
        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let owner = self
            .catalog
            .subject_mut(subject)
            .ok_or_else(|| ReviewError::NotFound {
                subject: subject.to_string(),
                title: None,
            })?;
        let mut sync = SyncSummary::default();
        for chapter in owner.chapters_mut() {
            sync.merge(lifecycle.delete(chapter));
        }
        self.catalog.remove_subject(subject);

        info!(
            "event=subject_delete module=service status=ok events_cancelled={} events_failed={}",
            sync.cancelled, sync.failed
        );
        self.persist()?;
        Ok(sync)
    }

    /// Clears every subject and restores default intervals.
    pub fn reset_all_data(&mut self) -> ReviewResult<SyncSummary> {
        let lifecycle = ChapterLifecycle::new(&self.adapter);
        let mut subjects = self.catalog.take_subjects();
        let mut sync = SyncSummary::default();
        for subject in &mut subjects {
            for chapter in subject.chapters_mut() {
                sync.merge(lifecycle.delete(chapter));
            }
        }
        self.catalog.set_intervals(IntervalSequence::default());

        info!(
            "event=catalog_reset module=service status=ok subjects_removed={} events_cancelled={} events_failed={}",
            subjects.len(),
            sync.cancelled,
            sync.failed
        );
        self.persist()?;
        Ok(sync)
    }

    /// Replaces the interval configuration; scheduled chapters keep their dates.
    pub fn set_intervals(
        &mut self,
        values: impl IntoIterator<Item = i64>,
    ) -> ReviewResult<IntervalSequence> {
        let intervals = IntervalSequence::new(values)?;
        self.apply_intervals(intervals)
    }

    /// Same as `set_intervals`, from the typed text form (`"1 3 7 15"`).
    pub fn set_intervals_text(&mut self, text: &str) -> ReviewResult<IntervalSequence> {
        let intervals = IntervalSequence::parse(text)?;
        self.apply_intervals(intervals)
    }

    pub fn reset_intervals_to_default(&mut self) -> ReviewResult<IntervalSequence> {
        self.apply_intervals(IntervalSequence::default())
    }

    fn apply_intervals(&mut self, intervals: IntervalSequence) -> ReviewResult<IntervalSequence> {
        self.catalog.set_intervals(intervals.clone());
        info!(
            "event=intervals_set module=service status=ok count={}",
            intervals.len()
        );
        self.persist()?;
        Ok(intervals)
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

fn chapter_key<'a>(subject: &'a str, title: &'a str) -> Result<(&'a str, &'a str), ValidationError> {
    Ok((
        required("subject name", subject)?,
        required("chapter title", title)?,
    ))
}

fn find_chapter_mut<'c>(
    catalog: &'c mut Catalog,
    subject: &str,
    title: &str,
) -> ReviewResult<&'c mut Chapter> {
    catalog
        .subject_mut(subject)
        .and_then(|owner| owner.chapter_mut(title))
        .ok_or_else(|| ReviewError::NotFound {
            subject: subject.to_string(),
            title: Some(title.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::{required, ValidationError};

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("subject name", "  Math "), Ok("Math"));
        assert_eq!(
            required("chapter title", " \t "),
            Err(ValidationError::MissingField("chapter title"))
        );
    }
}
