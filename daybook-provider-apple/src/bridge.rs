//! Contract of the native EventKit bridge.
//!
//! The iOS shell implements [`NativeBridge`] on top of EventKit. Records
//! cross the bridge as plain camelCase JSON objects with ISO-8601 date
//! strings; they are parsed and validated by the sources, not here.

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppleCalendarEvent {
    pub id: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub is_all_day: bool,
    /// Empty when unset.
    pub location: String,
    /// Empty when unset.
    pub notes: String,
    pub calendar_id: String,
    pub calendar_title: String,
    pub calendar_color: Option<String>,
    pub url: Option<String>,
    pub has_reminder: bool,
    pub reminder_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppleCalendarInfo {
    pub id: String,
    pub title: String,
    pub color: Option<String>,
    pub is_subscribed: bool,
    pub allows_content_modifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppleReminder {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<String>,
    pub completion_date: Option<String>,
    pub completed: bool,
    /// 0 = none, 1-4 = high, 5 = medium, 6-9 = low
    pub priority: i64,
    pub list_id: Option<String>,
    pub list_title: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppleReminderList {
    pub id: String,
    pub title: String,
}

#[async_trait]
pub trait NativeBridge: Send + Sync {
    async fn check_calendar_permissions(&self) -> Result<bool>;

    async fn request_calendar_permissions(&self) -> Result<bool>;

    /// Events overlapping `[start, end]`, both ISO-8601 strings.
    async fn get_events(&self, start: &str, end: &str) -> Result<Vec<AppleCalendarEvent>>;

    async fn get_calendars(&self) -> Result<Vec<AppleCalendarInfo>>;

    async fn check_reminders_permissions(&self) -> Result<bool>;

    async fn request_reminders_permissions(&self) -> Result<bool>;

    async fn get_reminders(&self, include_completed: bool) -> Result<Vec<AppleReminder>>;

    async fn get_reminder_lists(&self) -> Result<Vec<AppleReminderList>>;
}

/// Stand-in used where EventKit does not exist: never grants access and
/// has nothing to list.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBridge;

#[async_trait]
impl NativeBridge for UnavailableBridge {
    async fn check_calendar_permissions(&self) -> Result<bool> {
        Ok(false)
    }

    async fn request_calendar_permissions(&self) -> Result<bool> {
        Ok(false)
    }

    async fn get_events(&self, _start: &str, _end: &str) -> Result<Vec<AppleCalendarEvent>> {
        Ok(Vec::new())
    }

    async fn get_calendars(&self) -> Result<Vec<AppleCalendarInfo>> {
        Ok(Vec::new())
    }

    async fn check_reminders_permissions(&self) -> Result<bool> {
        Ok(false)
    }

    async fn request_reminders_permissions(&self) -> Result<bool> {
        Ok(false)
    }

    async fn get_reminders(&self, _include_completed: bool) -> Result<Vec<AppleReminder>> {
        Ok(Vec::new())
    }

    async fn get_reminder_lists(&self) -> Result<Vec<AppleReminderList>> {
        Ok(Vec::new())
    }
}

/// Check permission and, if missing, ask for it. Bridge failures count as
/// "not granted".
pub(crate) async fn check_then_request<C, R>(what: &str, check: C, request: R) -> bool
where
    C: Future<Output = Result<bool>>,
    R: Future<Output = Result<bool>>,
{
    match check.await {
        Ok(true) => return true,
        Ok(false) => {}
        Err(e) => tracing::warn!("error checking {} permissions: {:#}", what, e),
    }

    match request.await {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!("error requesting {} permissions: {:#}", what, e);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scriptable bridge for adapter tests.
    #[derive(Default)]
    pub struct FakeBridge {
        pub calendar_granted: AtomicBool,
        pub grant_calendar_on_request: AtomicBool,
        pub reminders_granted: AtomicBool,
        pub grant_reminders_on_request: AtomicBool,
        pub events: Mutex<Vec<AppleCalendarEvent>>,
        pub calendars: Vec<AppleCalendarInfo>,
        pub reminders: Vec<AppleReminder>,
        pub lists: Vec<AppleReminderList>,
        pub fail_lists: bool,
        pub requested_windows: Mutex<Vec<(String, String)>>,
        pub permission_requests: AtomicUsize,
    }

    #[async_trait]
    impl NativeBridge for FakeBridge {
        async fn check_calendar_permissions(&self) -> Result<bool> {
            Ok(self.calendar_granted.load(Ordering::SeqCst))
        }

        async fn request_calendar_permissions(&self) -> Result<bool> {
            self.permission_requests.fetch_add(1, Ordering::SeqCst);
            let granted = self.grant_calendar_on_request.load(Ordering::SeqCst);
            self.calendar_granted.store(granted, Ordering::SeqCst);
            Ok(granted)
        }

        async fn get_events(&self, start: &str, end: &str) -> Result<Vec<AppleCalendarEvent>> {
            self.requested_windows
                .lock()
                .unwrap()
                .push((start.to_string(), end.to_string()));
            Ok(self.events.lock().unwrap().clone())
        }

        async fn get_calendars(&self) -> Result<Vec<AppleCalendarInfo>> {
            Ok(self.calendars.clone())
        }

        async fn check_reminders_permissions(&self) -> Result<bool> {
            Ok(self.reminders_granted.load(Ordering::SeqCst))
        }

        async fn request_reminders_permissions(&self) -> Result<bool> {
            self.permission_requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.grant_reminders_on_request.load(Ordering::SeqCst))
        }

        async fn get_reminders(&self, include_completed: bool) -> Result<Vec<AppleReminder>> {
            Ok(self
                .reminders
                .iter()
                .filter(|r| include_completed || !r.completed)
                .cloned()
                .collect())
        }

        async fn get_reminder_lists(&self) -> Result<Vec<AppleReminderList>> {
            if self.fail_lists {
                anyhow::bail!("EventKit store unavailable");
            }
            Ok(self.lists.clone())
        }
    }
}
