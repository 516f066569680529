//! External calendar capability contract.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Failures reported by calendar providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Calendar sync is switched off in configuration.
    Disabled,
    /// Credentials are missing, unreadable or rejected.
    Auth(String),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Transport-level failure before a response arrived.
    Transport(String),
    /// The provider answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The provider answered with a body we could not interpret.
    InvalidResponse(String),
}

impl CalendarError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Disabled => "calendar_disabled",
            Self::Auth(_) => "calendar_auth_failed",
            Self::Timeout => "calendar_timeout",
            Self::Transport(_) => "calendar_transport_failed",
            Self::Rejected { .. } => "calendar_rejected",
            Self::InvalidResponse(_) => "calendar_invalid_response",
        }
    }
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "calendar sync is disabled"),
            Self::Auth(message) => write!(f, "calendar authentication failed: {message}"),
            Self::Timeout => write!(f, "calendar request timed out"),
            Self::Transport(message) => write!(f, "calendar request failed: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "calendar rejected request with HTTP {status}: {message}")
            }
            Self::InvalidResponse(message) => {
                write!(f, "calendar returned an unreadable response: {message}")
            }
        }
    }
}

impl Error for CalendarError {}

/// One all-day, zero-duration marker to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventRequest {
    /// Opaque display text.
    pub label: String,
    pub date: NaiveDate,
    /// Zone identifier passed through unchanged.
    pub timezone: String,
}

/// Calendar backend able to create and delete dated markers.
///
/// Implementations are blocking and must bound every call in time.
/// `delete_event` must treat an already-missing entry as success.
pub trait CalendarProvider {
    /// Short lowercase id used in log events (`google_calendar`, `memory`).
    fn provider_id(&self) -> &str;

    /// Creates one marker and returns its opaque identifier.
    fn create_event(&self, request: &CalendarEventRequest) -> CalendarResult<String>;

    fn delete_event(&self, event_id: &str) -> CalendarResult<()>;
}

impl<P: CalendarProvider + ?Sized> CalendarProvider for Box<P> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn create_event(&self, request: &CalendarEventRequest) -> CalendarResult<String> {
        (**self).create_event(request)
    }

    fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        (**self).delete_event(event_id)
    }
}

impl<P: CalendarProvider + ?Sized> CalendarProvider for &P {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn create_event(&self, request: &CalendarEventRequest) -> CalendarResult<String> {
        (**self).create_event(request)
    }

    fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        (**self).delete_event(event_id)
    }
}
