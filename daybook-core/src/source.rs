//! Calendar source contract and platform identity.
//!
//! Exactly one [`CalendarSource`] is picked when the process starts, based
//! on the [`Platform`] it runs as. Business logic only ever sees the trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DaybookResult;
use crate::event::{Calendar, Event};

/// A backend that can list calendar events.
///
/// `fetch_events` is a pure read. It returns an empty list when there is
/// nothing in the window and an error only for auth/permission or transport
/// failures; the caller decides how each failure is shown. A single record
/// with unreadable dates is dropped through [`keep_readable`] and never fails
/// the fetch.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    async fn initialize(&self) -> DaybookResult<()>;

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaybookResult<Vec<Event>>;

    async fn get_calendars(&self) -> DaybookResult<Vec<Calendar>> {
        Ok(Vec::new())
    }
}

/// Collect converted records, dropping the ones that failed conversion with a
/// warning naming the source and the offending field.
pub fn keep_readable<I>(source: &str, records: I) -> Vec<Event>
where
    I: IntoIterator<Item = DaybookResult<Event>>,
{
    records
        .into_iter()
        .filter_map(|record| match record {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(source, "skipping event: {}", err);
                None
            }
        })
        .collect()
}

/// Where the process believes it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Web,
    Android,
    Ios,
}

impl Platform {
    /// Best guess from the build target. Desktop builds count as web.
    pub fn detect() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else {
            Platform::Web
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Platforms that suspend or throttle timers while in the background.
    pub fn throttles_background_timers(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!(
                "Unknown platform '{}'. Expected one of: web, android, ios",
                other
            )),
        }
    }
}

/// Feature flags resolved once from the platform at composition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub platform: Platform,
    /// Reminders come from the native store rather than demo data.
    pub native_reminders: bool,
    /// Interval timers need catch-up ticks when the app comes back.
    pub background_catch_up: bool,
}

impl Capabilities {
    pub fn for_platform(platform: Platform) -> Self {
        Capabilities {
            platform,
            native_reminders: platform == Platform::Ios,
            background_catch_up: platform.throttles_background_timers(),
        }
    }
}
