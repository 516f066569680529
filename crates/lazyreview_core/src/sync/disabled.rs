//! Provider used when calendar sync is switched off.

use crate::sync::provider::{
    CalendarError, CalendarEventRequest, CalendarProvider, CalendarResult,
};

/// Rejects every call with `CalendarError::Disabled`.
///
/// Reviews scheduled in offline mode carry no event id; later cancels are
/// skipped for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCalendar;

impl CalendarProvider for DisabledCalendar {
    fn provider_id(&self) -> &str {
        "disabled"
    }

    fn create_event(&self, _request: &CalendarEventRequest) -> CalendarResult<String> {
        Err(CalendarError::Disabled)
    }

    fn delete_event(&self, _event_id: &str) -> CalendarResult<()> {
        Err(CalendarError::Disabled)
    }
}
