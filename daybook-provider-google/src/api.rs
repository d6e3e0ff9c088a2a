//! Calendar API v3 over plain REST.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use daybook_core::error::DaybookError;
use reqwest::Response;
use url::Url;

use crate::token_store::StoredToken;
use crate::types::{CalendarListEntry, CalendarListResponse, ErrorResponse, EventsResponse, GoogleEvent};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Upper bound on events returned for one window.
const MAX_RESULTS: &str = "50";

#[derive(Debug, Clone)]
pub struct GoogleApi {
    http: reqwest::Client,
    base_url: Url,
}

impl GoogleApi {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let base = base_url.unwrap_or(DEFAULT_API_BASE_URL);
        let base_url =
            Url::parse(base).with_context(|| format!("Invalid Google API base URL: {}", base))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("daybook/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GoogleApi { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Google API base URL cannot have a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Events of the primary calendar in `[start, end]`, recurring events
    /// expanded into instances and ordered by start time.
    pub async fn list_events(
        &self,
        token: &StoredToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GoogleEvent>> {
        let url = self.endpoint(&["calendars", "primary", "events"])?;
        let time_min = start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let time_max = end.to_rfc3339_opts(SecondsFormat::Millis, true);

        tracing::debug!(%time_min, %time_max, "fetching calendar events");

        let response = self
            .http
            .get(url)
            .bearer_auth(&token.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("showDeleted", "false"),
                ("singleEvents", "true"),
                ("maxResults", MAX_RESULTS),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .context("Failed to reach Google Calendar")?;

        let body: EventsResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse events response")?;

        tracing::debug!(count = body.items.len(), "calendar events fetched");
        Ok(body.items)
    }

    pub async fn list_calendars(&self, token: &StoredToken) -> Result<Vec<CalendarListEntry>> {
        let url = self.endpoint(&["users", "me", "calendarList"])?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("Failed to reach Google Calendar")?;

        let body: CalendarListResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse calendar list response")?;

        Ok(body.items)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(text);

    Err(classify_status(status.as_u16(), &message).into())
}

/// Map a failed API status to the error taxonomy.
pub fn classify_status(status: u16, message: &str) -> DaybookError {
    let lower = message.to_lowercase();
    match status {
        401 => DaybookError::Unauthenticated(format!("Authentication failed: {}", message)),
        403 if lower.contains("insufficient") || lower.contains("scope") => {
            DaybookError::InsufficientScope(message.to_string())
        }
        _ => DaybookError::Transient(format!("Google Calendar returned {}: {}", status, message)),
    }
}

/// Recover the classified error at the source boundary. Anything that was
/// never classified (transport, parsing) is transient.
pub fn into_daybook_error(err: anyhow::Error) -> DaybookError {
    match err.downcast::<DaybookError>() {
        Ok(err) => err,
        Err(err) => DaybookError::Transient(format!("{:#}", err)),
    }
}
