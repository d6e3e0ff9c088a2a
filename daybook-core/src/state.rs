//! Calendar state container.
//!
//! Holds the event list, the loading/error flags and the three temporal
//! reference points the day panel is derived from. One instance is owned
//! per screen/session and shared through [`SharedState`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;

use crate::classify::{classify_day, ClassifiedEvent};
use crate::clock::local_date;
use crate::date_range::{shift_month, DateRange};
use crate::event::{same_events, Event};

pub struct CalendarState {
    events: Vec<Event>,
    /// Bumped whenever `events` is replaced.
    events_revision: u64,
    loading: bool,
    /// Empty string means "no error".
    error: String,
    /// Anchor of the visible month/view.
    current_date: NaiveDate,
    /// Day whose events the side panel shows.
    selected_date: NaiveDate,
    /// Live clock, advanced by the tick timer.
    current_time: DateTime<Utc>,
    tz: Tz,
}

impl CalendarState {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        let today = local_date(now, &tz);
        CalendarState {
            events: Vec::new(),
            events_revision: 0,
            loading: false,
            error: String::new(),
            current_date: today,
            selected_date: today,
            current_time: now,
            tz,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_revision(&self) -> u64 {
        self.events_revision
    }

    /// Replace the event list.
    ///
    /// Unless `force_update` is set, a list with the same events (compared
    /// by id and content, in any order) leaves the stored list untouched.
    /// Returns whether the list was replaced.
    pub fn set_events(&mut self, events: Vec<Event>, force_update: bool) -> bool {
        if !force_update && same_events(&self.events, &events) {
            return false;
        }

        self.events = events;
        self.events_revision += 1;
        true
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// `set_error("")` clears the error.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = error.into();
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    pub fn set_current_time(&mut self, now: DateTime<Utc>) {
        self.current_time = now;
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    /// Calendar day of `current_time`.
    pub fn current_day(&self) -> NaiveDate {
        local_date(self.current_time, &self.tz)
    }

    /// Whether the event has entirely ended before `current_time`.
    ///
    /// All-day events are compared by day: one is past only once its whole
    /// last day has elapsed.
    pub fn is_event_in_past(&self, event: &Event) -> bool {
        if event.is_all_day() {
            return event.effective_end().date(&self.tz) < self.current_day();
        }
        event.effective_end().instant(&self.tz) < self.current_time
    }

    pub fn previous_month(&mut self) {
        self.current_date = shift_month(self.current_date, -1);
    }

    pub fn next_month(&mut self) {
        self.current_date = shift_month(self.current_date, 1);
    }

    /// Fetch window for the visible month.
    pub fn visible_range(&self) -> DateRange {
        DateRange::month_of(self.current_date, &self.tz)
    }

    /// Events starting on the selected day, unsorted.
    pub fn selected_day_events(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.starts_on(self.selected_date, &self.tz))
            .cloned()
            .collect()
    }

    /// The selected day's events in display order with their classification.
    pub fn day_panel(&self) -> Vec<ClassifiedEvent> {
        classify_day(&self.events, self.selected_date, self.current_time, &self.tz)
    }

    /// First event of the selected day that has not ended yet.
    pub fn next_upcoming_event(&self) -> Option<Event> {
        self.day_panel()
            .into_iter()
            .map(|c| c.event)
            .find(|e| e.effective_end().instant(&self.tz) >= self.current_time)
    }
}

/// Handle to a [`CalendarState`] shared by the controller, the scheduler
/// and whatever renders it.
///
/// All mutation goes through [`SharedState::update`], which holds the lock
/// only for the duration of the closure and bumps a version number that
/// [`StateChanges`] subscribers observe afterwards.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<CalendarState>>,
    version: Arc<watch::Sender<u64>>,
}

/// Change feed for a [`SharedState`]. Updates made while the holder is busy
/// are remembered and coalesced into one wakeup.
pub struct StateChanges(watch::Receiver<u64>);

impl StateChanges {
    /// Resolves once the state was updated since the last call (or since
    /// subscribing). Pends forever if every state handle is gone.
    pub async fn next(&mut self) {
        if self.0.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl SharedState {
    pub fn new(state: CalendarState) -> Self {
        SharedState {
            inner: Arc::new(Mutex::new(state)),
            version: Arc::new(watch::Sender::new(0)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&CalendarState) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut CalendarState) -> R) -> R {
        let result = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.version.send_modify(|v| *v = v.wrapping_add(1));
        result
    }

    pub fn subscribe(&self) -> StateChanges {
        StateChanges(self.version.subscribe())
    }
}
