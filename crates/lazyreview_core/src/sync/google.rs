//! Google Calendar v3 provider.
//!
//! # Responsibility
//! - Create all-day review markers and delete them by id over REST.
//! - Read the authorized-user token document and refresh the access token
//!   once when the API answers 401.
//!
//! # Invariants
//! - Every request is bounded by the configured timeout.
//! - Deleting an already-removed event (404/410) is a success.
//! - Tokens are never logged.

use crate::schedule::calculator::format_date;
use crate::sync::provider::{
    CalendarError, CalendarEventRequest, CalendarProvider, CalendarResult,
};
use log::info;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Authorized-user token document (`token.json`).
#[derive(Debug, Clone, Deserialize)]
struct AuthorizedUser {
    token: String,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_uri: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct EventDate {
    date: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct EventInsertRequest {
    summary: String,
    start: EventDate,
    end: EventDate,
}

#[derive(Deserialize)]
struct EventInsertResponse {
    id: String,
}

/// Google Calendar provider using a blocking HTTP client.
pub struct GoogleCalendar {
    client: Client,
    calendar_id: String,
    credentials: Mutex<AuthorizedUser>,
}

impl GoogleCalendar {
    /// Builds a provider from an authorized-user token file.
    pub fn from_token_file(
        token_file: &Path,
        calendar_id: impl Into<String>,
        timeout: Duration,
    ) -> CalendarResult<Self> {
        let content = std::fs::read_to_string(token_file).map_err(|err| {
            CalendarError::Auth(format!(
                "cannot read token file `{}`: {err}",
                token_file.display()
            ))
        })?;
        let credentials: AuthorizedUser = serde_json::from_str(&content).map_err(|err| {
            CalendarError::Auth(format!(
                "token file `{}` is not an authorized-user document: {err}",
                token_file.display()
            ))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| CalendarError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            calendar_id: calendar_id.into(),
            credentials: Mutex::new(credentials),
        })
    }

    fn access_token(&self) -> String {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when the token document carries no refresh grant.
    fn refresh_access_token(&self) -> CalendarResult<Option<String>> {
        let credentials = self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            credentials.refresh_token.as_deref(),
            credentials.client_id.as_deref(),
            credentials.client_secret.as_deref(),
        ) else {
            return Ok(None);
        };
        let token_uri = credentials.token_uri.as_deref().unwrap_or(OAUTH_TOKEN_URL);

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(CalendarError::Auth(format!(
                "token refresh failed: HTTP {}",
                response.status().as_u16()
            )));
        }
        let refreshed: TokenResponse = response
            .json()
            .map_err(|err| CalendarError::InvalidResponse(err.to_string()))?;

        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .token = refreshed.access_token.clone();
        info!("event=calendar_token_refresh module=sync status=ok provider=google_calendar");
        Ok(Some(refreshed.access_token))
    }

    fn send_authorized(
        &self,
        build: impl Fn(&str) -> RequestBuilder,
    ) -> CalendarResult<Response> {
        let response = build(&self.access_token())
            .send()
            .map_err(map_transport_error)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        match self.refresh_access_token()? {
            Some(token) => build(&token).send().map_err(map_transport_error),
            None => Err(CalendarError::Auth(
                "access token rejected and no refresh token available".to_string(),
            )),
        }
    }

    fn events_url(&self, event_id: Option<&str>) -> CalendarResult<Url> {
        let mut url = Url::parse(CALENDAR_API)
            .map_err(|err| CalendarError::Transport(err.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CalendarError::Transport("calendar api url cannot be a base".to_string()))?;
            segments.push("calendars").push(&self.calendar_id).push("events");
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }
}

impl CalendarProvider for GoogleCalendar {
    fn provider_id(&self) -> &str {
        "google_calendar"
    }

    fn create_event(&self, request: &CalendarEventRequest) -> CalendarResult<String> {
        let url = self.events_url(None)?;
        let body = insert_request(request);
        let response =
            self.send_authorized(|token| self.client.post(url.clone()).bearer_auth(token).json(&body))?;
        let response = ensure_success(response)?;
        let created: EventInsertResponse = response
            .json()
            .map_err(|err| CalendarError::InvalidResponse(err.to_string()))?;
        Ok(created.id)
    }

    fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        let url = self.events_url(Some(event_id))?;
        let response =
            self.send_authorized(|token| self.client.delete(url.clone()).bearer_auth(token))?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(()),
            _ => ensure_success(response).map(|_| ()),
        }
    }
}

fn insert_request(request: &CalendarEventRequest) -> EventInsertRequest {
    let day = format_date(request.date);
    EventInsertRequest {
        summary: request.label.clone(),
        start: EventDate {
            date: day.clone(),
            time_zone: request.timezone.clone(),
        },
        end: EventDate {
            date: day,
            time_zone: request.timezone.clone(),
        },
    }
}

fn ensure_success(response: Response) -> CalendarResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(CalendarError::Rejected {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

fn map_transport_error(err: reqwest::Error) -> CalendarError {
    if err.is_timeout() {
        CalendarError::Timeout
    } else {
        CalendarError::Transport(err.to_string())
    }
}
