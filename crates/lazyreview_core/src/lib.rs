//! Core domain logic for LazyReview.
//! This crate is the single source of truth for review-cycle invariants and
//! for keeping the external calendar in step with them.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;
pub mod sync;

pub use config::{AppConfig, CalendarConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{Catalog, CatalogIntegrityError, Subject};
pub use model::chapter::{Chapter, ChapterState, ScheduledReview};
pub use model::interval::{IntervalError, IntervalSequence, DEFAULT_INTERVALS, MAX_CYCLE_DAYS};
pub use repo::catalog_repo::{
    CatalogRepository, InMemoryCatalogRepository, JsonFileCatalogRepository, RepoError,
    RepoResult,
};
pub use schedule::calculator::{
    compute_review_dates, format_date, parse_date, today, DateParseError, DateRangeError,
};
pub use service::lifecycle::{review_label, ChapterLifecycle, SyncSummary};
pub use service::review_service::{
    ChapterOutcome, ChapterOverview, DueReview, ReviewError, ReviewResult, ReviewService,
    SubjectOverview, ValidationError,
};
pub use sync::adapter::{CalendarSyncAdapter, SyncOutcome};
pub use sync::disabled::DisabledCalendar;
pub use sync::google::GoogleCalendar;
pub use sync::memory::InMemoryCalendar;
pub use sync::provider::{CalendarError, CalendarEventRequest, CalendarProvider, CalendarResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
