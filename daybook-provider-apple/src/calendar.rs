//! EventKit calendar source.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use daybook_core::clock::local_date;
use daybook_core::error::{DaybookError, DaybookResult};
use daybook_core::source::{CalendarSource, Platform, keep_readable};
use daybook_core::{Calendar, Event, EventTime};

use crate::bridge::{AppleCalendarEvent, AppleCalendarInfo, NativeBridge, check_then_request};
use crate::iso::{format_bridge_datetime, parse_bridge_datetime};
use crate::bridge_error;

pub struct AppleCalendarSource {
    bridge: Arc<dyn NativeBridge>,
    platform: Platform,
    /// Zone all-day events are pinned to.
    tz: Tz,
    initialized: AtomicBool,
}

impl AppleCalendarSource {
    pub fn new(bridge: Arc<dyn NativeBridge>, platform: Platform, tz: Tz) -> Self {
        AppleCalendarSource {
            bridge,
            platform,
            tz,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn ensure_permission(&self) -> bool {
        let granted = check_then_request(
            "calendar",
            self.bridge.check_calendar_permissions(),
            self.bridge.request_calendar_permissions(),
        )
        .await;
        self.initialized.store(granted, Ordering::SeqCst);
        granted
    }

    fn to_event(&self, record: AppleCalendarEvent) -> DaybookResult<Event> {
        let start = parse_bridge_datetime("startDate", &record.start_date)?;
        let end = parse_bridge_datetime("endDate", &record.end_date)?;

        // EventKit reports all-day events as local midnight to 23:59:59 of
        // the last day.
        let (start, end) = if record.is_all_day {
            (
                EventTime::Date(local_date(start, &self.tz)),
                EventTime::Date(local_date(end, &self.tz)),
            )
        } else {
            (EventTime::DateTime(start), EventTime::DateTime(end))
        };

        Ok(Event {
            id: record.id,
            title: record.title,
            calendar_title: record.calendar_title,
            location: Some(record.location).filter(|s| !s.is_empty()),
            notes: Some(record.notes).filter(|s| !s.is_empty()),
            start,
            end: Some(end),
        })
    }
}

fn to_calendar(info: AppleCalendarInfo) -> Calendar {
    Calendar {
        id: info.id,
        title: info.title,
        color: info.color,
    }
}

#[async_trait]
impl CalendarSource for AppleCalendarSource {
    fn name(&self) -> &str {
        "apple-calendar"
    }

    fn is_available(&self) -> bool {
        self.platform == Platform::Ios
    }

    /// Ask for calendar access. Denial leaves the source uninitialised
    /// rather than failing.
    async fn initialize(&self) -> DaybookResult<()> {
        if self.ensure_permission().await {
            tracing::info!("calendar access granted");
        } else {
            tracing::warn!("calendar access denied");
        }
        Ok(())
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaybookResult<Vec<Event>> {
        // Access may have been granted in Settings since the last attempt.
        if !self.is_initialized() && !self.ensure_permission().await {
            return Err(DaybookError::PermissionDenied(
                "Permission denied to access calendar".into(),
            ));
        }

        let records = self
            .bridge
            .get_events(&format_bridge_datetime(start), &format_bridge_datetime(end))
            .await
            .map_err(bridge_error)?;

        Ok(keep_readable(
            self.name(),
            records.into_iter().map(|r| self.to_event(r)),
        ))
    }

    async fn get_calendars(&self) -> DaybookResult<Vec<Calendar>> {
        if !self.is_initialized() {
            return Err(DaybookError::PermissionDenied(
                "Permission denied to access calendar".into(),
            ));
        }

        let calendars = self.bridge.get_calendars().await.map_err(bridge_error)?;
        Ok(calendars.into_iter().map(to_calendar).collect())
    }
}
