//! In-process calendar provider.
//!
//! Keeps created markers in memory. Useful for embedding the engine without
//! an external calendar and for exercising sync failure paths: creates and
//! deletes can each be switched to fail.

use crate::sync::provider::{
    CalendarError, CalendarEventRequest, CalendarProvider, CalendarResult,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// One marker held by [`InMemoryCalendar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: String,
    pub label: String,
    pub date: NaiveDate,
    pub timezone: String,
}

#[derive(Default)]
pub struct InMemoryCalendar {
    events: Mutex<BTreeMap<String, StoredEvent>>,
    create_calls: Mutex<usize>,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent creates fail with a timeout.
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent deletes fail with a transport error.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.events().contains_key(event_id)
    }

    /// Every create attempt, successful or not.
    pub fn create_calls(&self) -> usize {
        *self
            .create_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored markers ordered by date, then id.
    pub fn events_by_date(&self) -> Vec<StoredEvent> {
        let mut events = self.events().values().cloned().collect::<Vec<_>>();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        events
    }

    fn events(&self) -> MutexGuard<'_, BTreeMap<String, StoredEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CalendarProvider for InMemoryCalendar {
    fn provider_id(&self) -> &str {
        "memory"
    }

    fn create_event(&self, request: &CalendarEventRequest) -> CalendarResult<String> {
        *self
            .create_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(CalendarError::Timeout);
        }

        let id = Uuid::new_v4().simple().to_string();
        self.events().insert(
            id.clone(),
            StoredEvent {
                id: id.clone(),
                label: request.label.clone(),
                date: request.date,
                timezone: request.timezone.clone(),
            },
        );
        Ok(id)
    }

    fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CalendarError::Transport(
                "simulated delete failure".to_string(),
            ));
        }
        self.events().remove(event_id);
        Ok(())
    }
}
