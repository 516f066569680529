//! Chapter review-cycle transitions.
//!
//! # Responsibility
//! - Create, advance, reset and retire chapter cycles.
//! - Issue the calendar operations each transition requires through
//!   `CalendarSyncAdapter`.
//!
//! # Invariants
//! - Calendar outcomes are tallied but never change a transition's result.
//! - A cycle's calendar entries are all created up front (create/reset);
//!   advancing only cancels the entry of the review just confirmed.
//! - Reset cancels every remaining entry before creating the new set.
//! - Dates are computed before any calendar call, so a cycle that does not
//!   fit the date range fails without side effects.

use crate::model::chapter::{Chapter, ScheduledReview};
use crate::model::interval::IntervalSequence;
use crate::schedule::calculator::{compute_review_dates, DateRangeError};
use crate::sync::adapter::{CalendarSyncAdapter, SyncOutcome};
use crate::sync::provider::CalendarProvider;
use chrono::NaiveDate;

/// Tally of advisory calendar calls made by one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Entries created.
    pub scheduled: usize,
    /// Entries deleted.
    pub cancelled: usize,
    /// Calls that failed and were absorbed.
    pub failed: usize,
}

impl SyncSummary {
    pub fn merge(&mut self, other: SyncSummary) {
        self.scheduled += other.scheduled;
        self.cancelled += other.cancelled;
        self.failed += other.failed;
    }

    fn record<T>(&mut self, outcome: &SyncOutcome<T>, on_success: fn(&mut Self)) {
        if outcome.is_synced() {
            on_success(self);
        } else {
            self.failed += 1;
        }
    }
}

/// Calendar entry text for one review of a cycle (`index` is 1-based).
pub fn review_label(index: usize, total: usize, subject: &str, chapter: &str) -> String {
    format!("{index}/{total} review: {subject} - {chapter}")
}

/// Applies chapter transitions against one calendar adapter.
pub struct ChapterLifecycle<'a, C: CalendarProvider> {
    adapter: &'a CalendarSyncAdapter<C>,
}

impl<'a, C: CalendarProvider> ChapterLifecycle<'a, C> {
    pub fn new(adapter: &'a CalendarSyncAdapter<C>) -> Self {
        Self { adapter }
    }

    /// Builds a chapter whose cycle starts on `start_date`, with one calendar
    /// entry per computed review.
    pub fn create(
        &self,
        subject: &str,
        title: &str,
        start_date: NaiveDate,
        intervals: &IntervalSequence,
    ) -> Result<(Chapter, SyncSummary), DateRangeError> {
        let dates = compute_review_dates(start_date, intervals)?;
        let (reviews, summary) = self.schedule_cycle(subject, title, dates);
        Ok((Chapter::new(title, start_date, reviews), summary))
    }

    /// Confirms the pending review.
    ///
    /// Moves the cycle start to the confirmed date, promotes the next queued
    /// review and cancels the confirmed review's entry. Returns `None` when
    /// the chapter is already completed.
    pub fn advance_on_confirm(&self, chapter: &mut Chapter) -> Option<SyncSummary> {
        let confirmed = chapter.pop_next_review()?;
        let mut summary = SyncSummary::default();
        if let Some(event_id) = confirmed.event_id.as_deref() {
            let outcome = self.adapter.cancel_one(event_id);
            summary.record(&outcome, |s| s.cancelled += 1);
        }
        Some(summary)
    }

    /// Restarts the cycle from `today`, whatever state the chapter is in.
    pub fn reset_cycle(
        &self,
        subject: &str,
        chapter: &mut Chapter,
        today: NaiveDate,
        intervals: &IntervalSequence,
    ) -> Result<SyncSummary, DateRangeError> {
        let dates = compute_review_dates(today, intervals)?;
        let mut summary = self.cancel_remaining(chapter);
        let (reviews, scheduled) = self.schedule_cycle(subject, chapter.title(), dates);
        summary.merge(scheduled);
        chapter.replace_cycle(today, reviews);
        Ok(summary)
    }

    /// Cancels every remaining entry ahead of removing the chapter.
    pub fn delete(&self, chapter: &mut Chapter) -> SyncSummary {
        self.cancel_remaining(chapter)
    }

    fn cancel_remaining(&self, chapter: &mut Chapter) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for review in chapter.take_remaining_reviews() {
            if let Some(event_id) = review.event_id.as_deref() {
                let outcome = self.adapter.cancel_one(event_id);
                summary.record(&outcome, |s| s.cancelled += 1);
            }
        }
        summary
    }

    fn schedule_cycle(
        &self,
        subject: &str,
        title: &str,
        dates: Vec<NaiveDate>,
    ) -> (Vec<ScheduledReview>, SyncSummary) {
        let total = dates.len();
        let mut summary = SyncSummary::default();
        let reviews = dates
            .into_iter()
            .enumerate()
            .map(|(index, date)| {
                let label = review_label(index + 1, total, subject, title);
                let outcome = self.adapter.schedule_one(date, &label);
                summary.record(&outcome, |s| s.scheduled += 1);
                ScheduledReview::new(date, outcome.synced())
            })
            .collect();
        (reviews, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::{review_label, ChapterLifecycle, SyncSummary};
    use crate::model::chapter::ChapterState;
    use crate::model::interval::IntervalSequence;
    use crate::schedule::calculator::parse_date;
    use crate::sync::adapter::CalendarSyncAdapter;
    use crate::sync::memory::InMemoryCalendar;

    fn intervals() -> IntervalSequence {
        IntervalSequence::new([1, 3, 7, 15]).expect("valid intervals")
    }

    #[test]
    fn label_uses_one_based_index() {
        assert_eq!(review_label(1, 4, "Math", "Ch1"), "1/4 review: Math - Ch1");
    }

    #[test]
    fn create_schedules_one_entry_per_review() {
        let adapter = CalendarSyncAdapter::new(InMemoryCalendar::new(), "UTC");
        let lifecycle = ChapterLifecycle::new(&adapter);
        let (chapter, summary) = lifecycle.create(
            "Math",
            "Ch1",
            parse_date("2024-01-01").expect("date"),
            &intervals(),
        )
        .expect("cycle in range");

        assert_eq!(summary, SyncSummary { scheduled: 4, cancelled: 0, failed: 0 });
        assert_eq!(chapter.event_ids().len(), chapter.review_dates().len() + 1);
        let labels = adapter
            .provider()
            .events_by_date()
            .into_iter()
            .map(|event| event.label)
            .collect::<Vec<_>>();
        assert_eq!(labels[0], "1/4 review: Math - Ch1");
        assert_eq!(labels[3], "4/4 review: Math - Ch1");
    }

    #[test]
    fn advance_runs_exactly_interval_count_times() {
        let adapter = CalendarSyncAdapter::new(InMemoryCalendar::new(), "UTC");
        let lifecycle = ChapterLifecycle::new(&adapter);
        let (mut chapter, _) = lifecycle.create(
            "Math",
            "Ch1",
            parse_date("2024-01-01").expect("date"),
            &intervals(),
        )
        .expect("cycle in range");

        for _ in 0..4 {
            assert_eq!(chapter.state(), ChapterState::Active);
            lifecycle
                .advance_on_confirm(&mut chapter)
                .expect("active chapter advances");
        }
        assert_eq!(chapter.state(), ChapterState::Completed);
        assert_eq!(chapter.start_date(), parse_date("2024-01-27").expect("date"));
        assert!(lifecycle.advance_on_confirm(&mut chapter).is_none());
        assert!(adapter.provider().is_empty());
    }

    #[test]
    fn reset_cancels_everything_and_reschedules_from_today() {
        let adapter = CalendarSyncAdapter::new(InMemoryCalendar::new(), "UTC");
        let lifecycle = ChapterLifecycle::new(&adapter);
        let (mut chapter, _) = lifecycle.create(
            "Math",
            "Ch1",
            parse_date("2024-01-01").expect("date"),
            &intervals(),
        )
        .expect("cycle in range");
        let old_ids = chapter
            .event_ids()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let today = parse_date("2024-01-03").expect("date");
        let summary = lifecycle
            .reset_cycle("Math", &mut chapter, today, &intervals())
            .expect("cycle in range");

        assert_eq!(summary, SyncSummary { scheduled: 4, cancelled: 4, failed: 0 });
        assert_eq!(chapter.start_date(), today);
        assert_eq!(chapter.next_review_date(), Some(parse_date("2024-01-04").expect("date")));
        assert_eq!(adapter.provider().len(), 4);
        assert!(old_ids.iter().all(|id| !adapter.provider().contains(id)));
    }

    #[test]
    fn out_of_range_cycles_make_no_calendar_calls() {
        let adapter = CalendarSyncAdapter::new(InMemoryCalendar::new(), "UTC");
        let lifecycle = ChapterLifecycle::new(&adapter);
        let late = parse_date("9999-12-20").expect("date");
        assert!(lifecycle.create("Math", "Ch1", late, &intervals()).is_err());
        assert_eq!(adapter.provider().create_calls(), 0);

        let (mut chapter, _) = lifecycle
            .create("Math", "Ch1", parse_date("2024-01-01").expect("date"), &intervals())
            .expect("cycle in range");
        let before = chapter.clone();
        assert!(lifecycle
            .reset_cycle("Math", &mut chapter, late, &intervals())
            .is_err());
        assert_eq!(chapter, before);
        assert_eq!(adapter.provider().len(), 4);
        assert_eq!(adapter.provider().create_calls(), 4);
    }

    #[test]
    fn calendar_failures_do_not_block_transitions() {
        let adapter = CalendarSyncAdapter::new(InMemoryCalendar::new(), "UTC");
        adapter.provider().set_fail_creates(true);
        adapter.provider().set_fail_deletes(true);
        let lifecycle = ChapterLifecycle::new(&adapter);

        let (mut chapter, summary) = lifecycle.create(
            "Math",
            "Ch1",
            parse_date("2024-01-01").expect("date"),
            &intervals(),
        )
        .expect("cycle in range");
        assert_eq!(summary.failed, 4);
        assert_eq!(chapter.remaining_count(), 4);
        assert!(chapter.event_ids().iter().all(Option::is_none));

        let advanced = lifecycle
            .advance_on_confirm(&mut chapter)
            .expect("active chapter advances");
        assert_eq!(advanced, SyncSummary::default());
        assert_eq!(chapter.next_review_date(), Some(parse_date("2024-01-05").expect("date")));
    }
}
