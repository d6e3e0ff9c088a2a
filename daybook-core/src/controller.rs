//! Calendar controller.
//!
//! Ties one [`CalendarSource`] to one [`SharedState`] and a
//! [`RefreshScheduler`]. The load routine is the only place source errors
//! are caught; it classifies them and turns each into state changes.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use tokio::time::timeout;

use crate::classify::ClassifiedEvent;
use crate::clock::{local_date, Clock};
use crate::error::{DaybookError, DaybookResult};
use crate::event::{Calendar, Event};
use crate::scheduler::{Hook, RefreshScheduler, SchedulerConfig};
use crate::source::CalendarSource;
use crate::state::{CalendarState, SharedState};
use crate::timer::PlatformTimers;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// User-initiated: drives `loading` and reports failures in `error`.
    Foreground,
    /// Background polling: never touches `loading` or `error`.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// New events were stored.
    Applied,
    /// The source returned the events already stored.
    Unchanged,
    /// Permission denied; stored an empty list without an error.
    Degraded,
    Failed,
    /// A silent load found another load in flight and did nothing.
    Skipped,
    /// A newer load started meanwhile; the result was discarded.
    Stale,
}

/// Counts loads in flight for as long as it lives.
pub(crate) struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }

    /// Only succeeds when nothing else is in flight.
    pub(crate) fn enter_alone(counter: &'a AtomicUsize) -> Option<Self> {
        counter
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(counter))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct CalendarController {
    state: SharedState,
    source: Arc<dyn CalendarSource>,
    scheduler: RefreshScheduler,
    clock: Arc<dyn Clock>,
    in_flight: AtomicUsize,
    generation: AtomicU64,
    fetch_timeout: Duration,
}

impl CalendarController {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        clock: Arc<dyn Clock>,
        tz: Tz,
        timers: PlatformTimers,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        let state = SharedState::new(CalendarState::new(clock.now(), tz));
        let scheduler = RefreshScheduler::new(state.clone(), clock.clone(), timers, config);

        Arc::new(CalendarController {
            state,
            source,
            scheduler,
            clock,
            in_flight: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            fetch_timeout: FETCH_TIMEOUT,
        })
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Set up the source, load the visible month and arm the timers.
    ///
    /// A day change reloads in the foreground; the optional auto-reload
    /// polls silently.
    pub async fn start(self: &Arc<Self>, auto_reload: bool) -> LoadOutcome {
        let outcome = match self.source.initialize().await {
            Ok(()) => self.load_events(LoadMode::Foreground).await,
            Err(err) => {
                let outcome = self.apply(Err(err), LoadMode::Foreground);
                self.state.update(|s| s.set_loading(false));
                outcome
            }
        };

        let poll = auto_reload.then(|| self.reload_hook(LoadMode::Silent));
        self.scheduler
            .initialize(Some(self.reload_hook(LoadMode::Foreground)), poll);

        outcome
    }

    /// Disarm all timers. A load already in flight still completes.
    pub fn stop(&self) {
        self.scheduler.cleanup();
    }

    fn reload_hook(self: &Arc<Self>, mode: LoadMode) -> Hook {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(controller) = weak.upgrade() {
                tokio::spawn(async move {
                    controller.load_events(mode).await;
                });
            }
        })
    }

    /// Fetch the visible month and store the result.
    ///
    /// Overlapping loads: a silent load is skipped while any other load is
    /// in flight, and only the most recently started load may write its
    /// result.
    pub async fn load_events(&self, mode: LoadMode) -> LoadOutcome {
        let _in_flight = match mode {
            LoadMode::Foreground => InFlight::enter(&self.in_flight),
            LoadMode::Silent => match InFlight::enter_alone(&self.in_flight) {
                Some(guard) => guard,
                None => {
                    tracing::debug!("silent reload skipped, another load is in flight");
                    return LoadOutcome::Skipped;
                }
            },
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let range = self.state.read(|s| s.visible_range());

        if mode == LoadMode::Foreground {
            self.state.update(|s| {
                s.set_loading(true);
                s.set_error("");
            });
        }

        let result = match timeout(
            self.fetch_timeout,
            self.source.fetch_events(range.start, range.end),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DaybookError::Transient(format!(
                "{} did not respond within {}s",
                self.source.name(),
                self.fetch_timeout.as_secs()
            ))),
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding result of superseded load");
            return LoadOutcome::Stale;
        }

        let outcome = self.apply(result, mode);
        if mode == LoadMode::Foreground {
            self.state.update(|s| s.set_loading(false));
        }
        outcome
    }

    fn apply(&self, result: DaybookResult<Vec<Event>>, mode: LoadMode) -> LoadOutcome {
        match result {
            Ok(events) => {
                let count = events.len();
                if self.state.update(|s| s.set_events(events, false)) {
                    tracing::info!(source = self.source.name(), count, "events loaded");
                    LoadOutcome::Applied
                } else {
                    tracing::debug!(source = self.source.name(), "events unchanged");
                    LoadOutcome::Unchanged
                }
            }
            Err(err) if err.is_permission_denied() => {
                tracing::warn!(source = self.source.name(), "{}", err);
                self.state.update(|s| s.set_events(Vec::new(), false));
                LoadOutcome::Degraded
            }
            Err(err) => {
                if err.needs_reauthentication() {
                    tracing::warn!(source = self.source.name(), "{}", err);
                } else {
                    tracing::error!(source = self.source.name(), "failed to load events: {}", err);
                }
                if mode == LoadMode::Foreground {
                    self.state.update(|s| s.set_error(err.user_message()));
                }
                LoadOutcome::Failed
            }
        }
    }

    pub async fn calendars(&self) -> DaybookResult<Vec<Calendar>> {
        self.source.get_calendars().await
    }

    /// Select a day, following it into another month if needed.
    ///
    /// Returns the outcome of the reload when the visible month changed.
    pub async fn select_day(&self, date: NaiveDate) -> Option<LoadOutcome> {
        let month_changed = self.state.update(|s| {
            s.set_selected_date(date);
            let current = s.current_date();
            if (current.year(), current.month()) != (date.year(), date.month()) {
                s.set_current_date(date);
                true
            } else {
                false
            }
        });
        self.scheduler.schedule_reset_to_today();

        if month_changed {
            Some(self.load_events(LoadMode::Foreground).await)
        } else {
            None
        }
    }

    pub async fn go_to_today(&self) -> Option<LoadOutcome> {
        let today = self.state.read(|s| local_date(self.clock.now(), s.tz()));
        self.select_day(today).await
    }

    pub async fn previous_month(&self) -> LoadOutcome {
        self.state.update(|s| s.previous_month());
        self.load_events(LoadMode::Foreground).await
    }

    pub async fn next_month(&self) -> LoadOutcome {
        self.state.update(|s| s.next_month());
        self.load_events(LoadMode::Foreground).await
    }

    pub fn selected_day_events(&self) -> Vec<Event> {
        self.state.read(|s| s.selected_day_events())
    }

    pub fn day_panel(&self) -> Vec<ClassifiedEvent> {
        self.state.read(|s| s.day_panel())
    }

    pub fn next_upcoming_event(&self) -> Option<Event> {
        self.state.read(|s| s.next_upcoming_event())
    }
}
