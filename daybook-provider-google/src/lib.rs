//! Google Calendar source for daybook.
//!
//! Reads the primary calendar with a previously imported OAuth access
//! token. Used on web and Android.

pub mod api;
pub mod convert;
pub mod session;
pub mod token_store;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybook_core::clock::Clock;
use daybook_core::error::DaybookResult;
use daybook_core::source::{CalendarSource, Platform, keep_readable};
use daybook_core::{Calendar, Event};

use crate::api::{GoogleApi, into_daybook_error};
use crate::convert::{from_calendar_entry, from_google_event};
use crate::session::ensure_authenticated;
use crate::token_store::TokenStore;

pub struct GoogleCalendarSource {
    store: TokenStore,
    api: GoogleApi,
    platform: Platform,
    clock: Arc<dyn Clock>,
}

impl GoogleCalendarSource {
    pub fn new(
        store: TokenStore,
        api_base_url: Option<&str>,
        platform: Platform,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(GoogleCalendarSource {
            store,
            api: GoogleApi::new(api_base_url)?,
            platform,
            clock,
        })
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarSource {
    fn name(&self) -> &str {
        "google"
    }

    fn is_available(&self) -> bool {
        matches!(self.platform, Platform::Web | Platform::Android)
    }

    /// Nothing to set up beyond the token; a missing token only fails once
    /// events are requested.
    async fn initialize(&self) -> DaybookResult<()> {
        match self.store.load() {
            Some(token) if token.is_valid(self.clock.now()) => {
                tracing::info!(expires_at = ?token.expires_at(), "signed in to Google Calendar");
            }
            Some(_) => tracing::info!("Google token expired, sign in again"),
            None => tracing::info!("not signed in to Google Calendar"),
        }
        Ok(())
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaybookResult<Vec<Event>> {
        let token = ensure_authenticated(&self.store, self.clock.now())?;

        let items = self
            .api
            .list_events(&token, start, end)
            .await
            .map_err(into_daybook_error)?;

        Ok(keep_readable(
            self.name(),
            items.into_iter().map(from_google_event),
        ))
    }

    async fn get_calendars(&self) -> DaybookResult<Vec<Calendar>> {
        let token = ensure_authenticated(&self.store, self.clock.now())?;

        let entries = self
            .api
            .list_calendars(&token)
            .await
            .map_err(into_daybook_error)?;

        Ok(entries.into_iter().map(from_calendar_entry).collect())
    }
}
