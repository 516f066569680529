//! Advisory bridge between review lifecycle events and a calendar provider.
//!
//! # Responsibility
//! - Turn "schedule this review" / "cancel this entry" into provider calls.
//! - Convert every provider failure into a `SyncOutcome::Failed` value.
//!
//! # Invariants
//! - Nothing here returns `Err` or panics into lifecycle code; local state
//!   is authoritative and the calendar is a disposable projection.
//! - Every failure is logged once, at `warn`, with a stable error code.
//!   Offline mode is expected and logs at `debug` instead.
//! - Labels are never logged; only dates, ids and error codes are.

use crate::sync::provider::{CalendarError, CalendarEventRequest, CalendarProvider};
use chrono::NaiveDate;
use log::{debug, warn};

/// Result of one advisory calendar call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SyncOutcome<T> {
    Synced(T),
    Failed(CalendarError),
}

impl<T> SyncOutcome<T> {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    /// Drops the failure detail; it was already logged.
    pub fn synced(self) -> Option<T> {
        match self {
            Self::Synced(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

/// Calendar sync adapter bound to one provider and zone.
pub struct CalendarSyncAdapter<C: CalendarProvider> {
    provider: C,
    timezone: String,
}

impl<C: CalendarProvider> CalendarSyncAdapter<C> {
    pub fn new(provider: C, timezone: impl Into<String>) -> Self {
        Self {
            provider,
            timezone: timezone.into(),
        }
    }

    pub fn provider(&self) -> &C {
        &self.provider
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Creates one all-day entry for `date`.
    pub fn schedule_one(&self, date: NaiveDate, label: &str) -> SyncOutcome<String> {
        let request = CalendarEventRequest {
            label: label.to_string(),
            date,
            timezone: self.timezone.clone(),
        };
        match self.provider.create_event(&request) {
            Ok(event_id) => {
                debug!(
                    "event=calendar_create module=sync status=ok provider={} date={} event_id={}",
                    self.provider.provider_id(),
                    date,
                    event_id
                );
                SyncOutcome::Synced(event_id)
            }
            Err(CalendarError::Disabled) => {
                debug!("event=calendar_create module=sync status=skipped provider=disabled date={date}");
                SyncOutcome::Failed(CalendarError::Disabled)
            }
            Err(err) => {
                warn!(
                    "event=calendar_create module=sync status=error provider={} date={} error_code={} error={}",
                    self.provider.provider_id(),
                    date,
                    err.code(),
                    err
                );
                SyncOutcome::Failed(err)
            }
        }
    }

    /// Best-effort removal of one entry.
    pub fn cancel_one(&self, event_id: &str) -> SyncOutcome<()> {
        match self.provider.delete_event(event_id) {
            Ok(()) => {
                debug!(
                    "event=calendar_delete module=sync status=ok provider={} event_id={}",
                    self.provider.provider_id(),
                    event_id
                );
                SyncOutcome::Synced(())
            }
            Err(CalendarError::Disabled) => {
                debug!("event=calendar_delete module=sync status=skipped provider=disabled event_id={event_id}");
                SyncOutcome::Failed(CalendarError::Disabled)
            }
            Err(err) => {
                warn!(
                    "event=calendar_delete module=sync status=error provider={} event_id={} error_code={} error={}",
                    self.provider.provider_id(),
                    event_id,
                    err.code(),
                    err
                );
                SyncOutcome::Failed(err)
            }
        }
    }
}
