use lazyreview_core::{
    parse_date, CalendarSyncAdapter, ChapterState, InMemoryCalendar, InMemoryCatalogRepository,
    IntervalError, IntervalSequence, ReviewError, ReviewService, ValidationError,
    DEFAULT_INTERVALS, MAX_CYCLE_DAYS,
};
use chrono::NaiveDate;

type Service<'a> = ReviewService<&'a InMemoryCatalogRepository, &'a InMemoryCalendar>;

fn date(value: &str) -> NaiveDate {
    parse_date(value).unwrap()
}

fn open<'a>(repo: &'a InMemoryCatalogRepository, calendar: &'a InMemoryCalendar) -> Service<'a> {
    ReviewService::open(repo, CalendarSyncAdapter::new(calendar, "Asia/Taipei")).unwrap()
}

#[test]
fn add_schedules_cumulative_dates_and_one_event_per_review() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);

    let outcome = service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();

    let chapter = &outcome.chapter;
    assert_eq!(chapter.start_date(), date("2024-01-01"));
    assert_eq!(chapter.next_review_date(), Some(date("2024-01-02")));
    assert_eq!(
        chapter.review_dates(),
        vec![date("2024-01-05"), date("2024-01-12"), date("2024-01-27")]
    );
    assert_eq!(chapter.event_ids().len(), chapter.review_dates().len() + 1);
    assert_eq!(outcome.sync.scheduled, 4);

    let events = calendar.events_by_date();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].label, "1/4 review: Math - Ch1");
    assert_eq!(events[3].date, date("2024-01-27"));
    assert!(events.iter().all(|event| event.timezone == "Asia/Taipei"));

    let saved = repo.snapshot().expect("catalog persisted after add");
    assert_eq!(saved.subject("Math").unwrap().chapters().len(), 1);
}

#[test]
fn confirm_advances_and_cancels_only_the_confirmed_event() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    let added = service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    let first_id = added.chapter.event_ids()[0].unwrap().to_string();

    let outcome = service.confirm_review("Math", "Ch1").unwrap();

    assert_eq!(outcome.chapter.start_date(), date("2024-01-02"));
    assert_eq!(outcome.chapter.next_review_date(), Some(date("2024-01-05")));
    assert_eq!(
        outcome.chapter.review_dates(),
        vec![date("2024-01-12"), date("2024-01-27")]
    );
    assert_eq!(outcome.chapter.event_ids().len(), 3);
    assert_eq!(outcome.sync.cancelled, 1);
    assert!(!calendar.contains(&first_id));
    assert_eq!(calendar.len(), 3);
}

#[test]
fn four_confirmations_complete_a_four_step_cycle() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();

    for _ in 0..3 {
        let outcome = service.confirm_review("Math", "Ch1").unwrap();
        assert_eq!(outcome.chapter.state(), ChapterState::Active);
    }
    let last = service.confirm_review("Math", "Ch1").unwrap();

    assert_eq!(last.chapter.state(), ChapterState::Completed);
    assert!(last.chapter.next_review_date().is_none());
    assert!(last.chapter.review_dates().is_empty());
    assert!(last.chapter.event_ids().is_empty());
    assert!(calendar.is_empty());

    let err = service.confirm_review("Math", "Ch1").unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ValidationError::NoPendingReview { .. })
    ));
}

#[test]
fn decline_restarts_cycle_from_today_with_fresh_events() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    let added = service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    service.confirm_review("Math", "Ch1").unwrap();

    let today = date("2024-01-05");
    let outcome = service.decline_review("Math", "Ch1", today).unwrap();

    let fresh = service
        .add_subject_and_chapter("Scratch", "Ch1", "2024-01-05")
        .unwrap();
    assert_eq!(outcome.chapter.start_date(), fresh.chapter.start_date());
    assert_eq!(
        outcome.chapter.next_review_date(),
        fresh.chapter.next_review_date()
    );
    assert_eq!(outcome.chapter.review_dates(), fresh.chapter.review_dates());
    assert_eq!(outcome.sync.cancelled, 3);
    assert_eq!(outcome.sync.scheduled, 4);

    for old_id in added.chapter.event_ids().into_iter().flatten() {
        assert!(!calendar.contains(old_id));
    }
    assert_eq!(calendar.len(), 8);
}

#[test]
fn decline_on_completed_chapter_starts_a_new_cycle() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service.set_intervals([2]).unwrap();
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    let done = service.confirm_review("Math", "Ch1").unwrap();
    assert!(done.chapter.is_completed());

    let restarted = service
        .decline_review("Math", "Ch1", date("2024-02-01"))
        .unwrap();
    assert_eq!(restarted.chapter.state(), ChapterState::Active);
    assert_eq!(restarted.chapter.next_review_date(), Some(date("2024-02-03")));
    assert_eq!(restarted.chapter.event_ids().len(), 1);
}

#[test]
fn duplicate_title_is_rejected_without_calendar_calls() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    let calls_before = calendar.create_calls();

    let err = service
        .add_subject_and_chapter("Math", "Ch1", "2024-03-01")
        .unwrap_err();

    assert!(matches!(err, ReviewError::Duplicate { .. }));
    assert_eq!(calendar.create_calls(), calls_before);
    assert_eq!(service.catalog().subject("Math").unwrap().chapters().len(), 1);
}

#[test]
fn invalid_input_leaves_catalog_untouched() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);

    let bad_date = service
        .add_subject_and_chapter("Math", "Ch1", "2024-13-01")
        .unwrap_err();
    assert!(matches!(
        bad_date,
        ReviewError::Validation(ValidationError::Date(_))
    ));
    let blank = service
        .add_subject_and_chapter("Math", "   ", "2024-01-01")
        .unwrap_err();
    assert!(matches!(
        blank,
        ReviewError::Validation(ValidationError::MissingField("chapter title"))
    ));

    assert!(service.catalog().subjects().is_empty());
    assert_eq!(calendar.create_calls(), 0);
    assert!(repo.snapshot().is_none());
}

#[test]
fn set_intervals_rejects_empty_and_negative_values() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);

    let empty = service.set_intervals(Vec::new()).unwrap_err();
    assert!(matches!(
        empty,
        ReviewError::Validation(ValidationError::Intervals(IntervalError::Empty))
    ));
    let negative = service.set_intervals([-1]).unwrap_err();
    assert!(matches!(
        negative,
        ReviewError::Validation(ValidationError::Intervals(IntervalError::NonPositive(-1)))
    ));
    assert_eq!(service.intervals().as_slice(), &DEFAULT_INTERVALS);
}

#[test]
fn new_intervals_apply_only_to_future_cycles() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math", "Old", "2024-01-01")
        .unwrap();

    let applied = service.set_intervals_text("2, 4").unwrap();
    assert_eq!(applied, IntervalSequence::new([2, 4]).unwrap());
    let added = service
        .add_subject_and_chapter("Math", "New", "2024-01-01")
        .unwrap();

    assert_eq!(added.chapter.next_review_date(), Some(date("2024-01-03")));
    assert_eq!(added.chapter.review_dates(), vec![date("2024-01-07")]);
    let old = service.catalog().subject("Math").unwrap().chapter("Old").unwrap();
    assert_eq!(old.remaining_count(), 4);

    let restored = service.reset_intervals_to_default().unwrap();
    assert_eq!(restored.as_slice(), &DEFAULT_INTERVALS);
}

#[test]
fn due_today_lists_matches_in_subject_then_chapter_order() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Physics", "Waves", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Math", "Sets", "2024-01-02")
        .unwrap();
    service
        .add_subject_and_chapter("Math", "Logic", "2024-01-01")
        .unwrap();

    let due = service.list_due_today(date("2024-01-02"));
    let pairs = due
        .iter()
        .map(|item| (item.subject.as_str(), item.chapter.title()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![("Physics", "Waves"), ("Math", "Logic")]);
    assert_eq!(service.list_due_today(date("2024-01-02")), due);
    assert!(service.list_due_today(date("2024-01-04")).is_empty());
}

#[test]
fn set_intervals_rejects_cycles_past_the_ceiling() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);

    let err = service.set_intervals([3_000_000]).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ValidationError::Intervals(IntervalError::CycleTooLong(3_000_000)))
    ));
    let err = service.set_intervals_text("36000 600").unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ValidationError::Intervals(IntervalError::CycleTooLong(_)))
    ));
    assert_eq!(service.intervals().as_slice(), &DEFAULT_INTERVALS);
    assert!(repo.snapshot().is_none());

    let longest = i64::try_from(MAX_CYCLE_DAYS).unwrap();
    service.set_intervals([longest]).unwrap();
    let added = service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    assert_eq!(added.chapter.next_review_date(), Some(date("2124-01-02")));
}

#[test]
fn cycles_running_past_year_9999_are_rejected_before_any_calendar_call() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);

    let err = service
        .add_subject_and_chapter("Math", "Late", "9999-12-20")
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ValidationError::DateRange(_))
    ));
    assert!(service.catalog().subjects().is_empty());
    assert_eq!(calendar.create_calls(), 0);
    assert!(repo.snapshot().is_none());

    let added = service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    let err = service
        .decline_review("Math", "Ch1", date("9999-12-20"))
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ValidationError::DateRange(_))
    ));
    let kept = service.catalog().subject("Math").unwrap().chapter("Ch1").unwrap();
    assert_eq!(*kept, added.chapter);
    assert_eq!(calendar.len(), 4);
    assert_eq!(calendar.create_calls(), 4);
}

#[test]
fn confirm_and_decline_report_missing_subjects_and_chapters() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    let before = service.catalog().clone();

    let err = service.confirm_review("History", "Ch1").unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { title: Some(_), .. }));
    let err = service.confirm_review("Math", "Ch9").unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { title: Some(_), .. }));
    let err = service
        .decline_review("History", "Ch1", date("2024-02-01"))
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { .. }));
    let err = service
        .decline_review("Math", "Ch9", date("2024-02-01"))
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { .. }));

    assert_eq!(*service.catalog(), before);
    assert_eq!(calendar.len(), 4);
    assert_eq!(calendar.create_calls(), 4);
}

#[test]
fn lookups_trim_names_like_add_does() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math ", " Ch1", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Math", "Ch2", "2024-01-01")
        .unwrap();

    let confirmed = service.confirm_review(" Math", "Ch1 ").unwrap();
    assert_eq!(confirmed.subject, "Math");
    assert_eq!(confirmed.chapter.next_review_date(), Some(date("2024-01-05")));
    service
        .decline_review("Math  ", "\tCh1", date("2024-02-01"))
        .unwrap();
    service.delete_chapter(" Math ", " Ch2 ").unwrap();
    service.delete_subject("  Math").unwrap();
    assert!(service.catalog().subjects().is_empty());
    assert!(calendar.is_empty());
}

#[test]
fn delete_chapter_and_subject_cancel_remaining_events() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Math", "Ch2", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Physics", "Waves", "2024-01-01")
        .unwrap();
    service.confirm_review("Math", "Ch2").unwrap();

    let removed = service.delete_chapter("Math", "Ch2").unwrap();
    assert_eq!(removed.cancelled, 3);
    assert!(service.catalog().subject("Math").unwrap().chapter("Ch2").is_none());

    let removed = service.delete_subject("Math").unwrap();
    assert_eq!(removed.cancelled, 4);
    assert!(service.catalog().subject("Math").is_none());
    assert_eq!(calendar.len(), 4);

    let missing = service.delete_chapter("Math", "Ch1").unwrap_err();
    assert!(matches!(missing, ReviewError::NotFound { .. }));
    let missing = service.delete_subject("Math").unwrap_err();
    assert!(matches!(missing, ReviewError::NotFound { title: None, .. }));
}

#[test]
fn reset_all_clears_subjects_events_and_intervals() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service.set_intervals([5, 10]).unwrap();
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Physics", "Waves", "2024-01-01")
        .unwrap();

    let summary = service.reset_all_data().unwrap();

    assert_eq!(summary.cancelled, 4);
    assert!(calendar.is_empty());
    assert!(service.catalog().subjects().is_empty());
    assert_eq!(service.intervals().as_slice(), &DEFAULT_INTERVALS);
    assert_eq!(repo.snapshot().unwrap(), *service.catalog());
}

#[test]
fn list_subjects_reports_progress_per_chapter() {
    let repo = InMemoryCatalogRepository::new();
    let calendar = InMemoryCalendar::new();
    let mut service = open(&repo, &calendar);
    service.set_intervals([1]).unwrap();
    service
        .add_subject_and_chapter("Math", "Ch1", "2024-01-01")
        .unwrap();
    service
        .add_subject_and_chapter("Math", "Ch2", "2024-01-01")
        .unwrap();
    service.confirm_review("Math", "Ch1").unwrap();

    let overview = service.list_subjects();
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].chapters[0].next_review_date, None);
    assert_eq!(overview[0].chapters[1].next_review_date, Some(date("2024-01-02")));
    assert_eq!(overview[0].chapters[1].remaining_reviews, 1);
}
