//! Refresh scheduler.
//!
//! Four independent timer roles keep the state in step with the wall clock:
//!
//! - clock tick: periodically sets `current_time` to now;
//! - midnight rollover: fires at the next local midnight, moves every date
//!   anchor to the new day and re-arms itself;
//! - reset-to-today: after an idle window on a day other than today,
//!   selects today again;
//! - auto-reload: periodically asks the owner for a silent reload.
//!
//! Starting a role always cancels the previous instance of that role.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use tokio::task::JoinHandle;

use crate::clock::{is_last_day_of_month, local_date, until_next_midnight, Clock};
use crate::state::{CalendarState, SharedState};
use crate::timer::{PlatformTimers, TimerHandle};

/// Called by the scheduler; must not block.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub reset_to_today_after: Duration,
    pub auto_reload_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick_interval: Duration::from_secs(60),
            reset_to_today_after: Duration::from_secs(60),
            auto_reload_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Default)]
struct Roles {
    clock_tick: Option<TimerHandle>,
    midnight: Option<JoinHandle<()>>,
    reset_to_today: Option<JoinHandle<()>>,
    auto_reload: Option<TimerHandle>,
}

pub struct RefreshScheduler {
    state: SharedState,
    clock: Arc<dyn Clock>,
    timers: PlatformTimers,
    config: SchedulerConfig,
    roles: Mutex<Roles>,
}

impl RefreshScheduler {
    pub fn new(
        state: SharedState,
        clock: Arc<dyn Clock>,
        timers: PlatformTimers,
        config: SchedulerConfig,
    ) -> Self {
        RefreshScheduler {
            state,
            clock,
            timers,
            config,
            roles: Mutex::new(Roles::default()),
        }
    }

    fn roles(&self) -> MutexGuard<'_, Roles> {
        self.roles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the clock tick and midnight rollover, plus auto-reload when a
    /// reload hook is given.
    pub fn initialize(&self, on_day_change: Option<Hook>, auto_reload: Option<Hook>) {
        self.start_clock_tick();
        self.start_midnight_rollover(on_day_change);
        if let Some(reload) = auto_reload {
            self.start_auto_reload(reload);
        }
    }

    pub fn start_clock_tick(&self) {
        let state = self.state.clone();
        let clock = self.clock.clone();
        let handle = self.timers.set_interval(
            move || {
                let now = clock.now();
                state.update(|s| s.set_current_time(now));
            },
            self.config.tick_interval,
        );

        if let Some(previous) = self.roles().clock_tick.replace(handle) {
            self.timers.clear_interval(previous);
        }
    }

    /// Self-perpetuating: after each rollover the next midnight is computed
    /// from the calendar again rather than assuming a 24h period.
    pub fn start_midnight_rollover(&self, on_day_change: Option<Hook>) {
        let state = self.state.clone();
        let clock = self.clock.clone();
        let tz = self.state.read(|s| *s.tz());

        let task = tokio::spawn(async move {
            loop {
                let armed_at = clock.now();
                let armed_day = local_date(armed_at, &tz);
                let delay = until_next_midnight(armed_at, &tz);
                tracing::debug!(?delay, "midnight rollover armed");

                tokio::time::sleep(delay).await;

                let now = clock.now();
                if local_date(now, &tz) <= armed_day {
                    // Woke up before the wall clock crossed midnight.
                    continue;
                }

                state.update(|s| roll_over(s, now));
                tracing::info!(day = %local_date(now, &tz), "day changed");

                if let Some(hook) = &on_day_change {
                    hook();
                }
            }
        });

        if let Some(previous) = self.roles().midnight.replace(task) {
            previous.abort();
        }
    }

    /// Re-evaluate the reset-to-today timer for the current `selected_date`.
    ///
    /// Call after every change of the selected day. When today is selected
    /// any pending reset is cancelled.
    pub fn schedule_reset_to_today(&self) {
        let selected = self.state.read(|s| s.selected_date());
        let tz = self.state.read(|s| *s.tz());
        let today = local_date(self.clock.now(), &tz);

        let mut roles = self.roles();
        if let Some(pending) = roles.reset_to_today.take() {
            pending.abort();
        }

        if selected == today {
            return;
        }

        let state = self.state.clone();
        let clock = self.clock.clone();
        let after = self.config.reset_to_today_after;
        tracing::debug!(%selected, ?after, "reset to today armed");

        roles.reset_to_today = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let today = local_date(clock.now(), &tz);
            state.update(|s| s.set_selected_date(today));
            tracing::debug!(%today, "selected day reset to today");
        }));
    }

    pub fn has_pending_reset(&self) -> bool {
        self.roles()
            .reset_to_today
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn start_auto_reload(&self, reload: Hook) {
        let handle = self
            .timers
            .set_interval(move || reload(), self.config.auto_reload_interval);

        if let Some(previous) = self.roles().auto_reload.replace(handle) {
            self.timers.clear_interval(previous);
        }
    }

    pub fn stop_auto_reload(&self) {
        if let Some(handle) = self.roles().auto_reload.take() {
            self.timers.clear_interval(handle);
        }
    }

    /// Disarm every role. Safe to call repeatedly or before anything was armed.
    pub fn cleanup(&self) {
        let mut roles = self.roles();

        if let Some(handle) = roles.clock_tick.take() {
            self.timers.clear_interval(handle);
        }
        if let Some(task) = roles.midnight.take() {
            task.abort();
        }
        if let Some(task) = roles.reset_to_today.take() {
            task.abort();
        }
        if let Some(handle) = roles.auto_reload.take() {
            self.timers.clear_interval(handle);
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Move every date anchor to the day of `now`.
///
/// When the day being left was the last of its month the view jumps to the
/// first of the new month.
pub fn roll_over(state: &mut CalendarState, now: DateTime<Utc>) {
    let previous_day = state.current_day();
    let today = local_date(now, state.tz());

    state.set_selected_date(today);
    state.set_current_date(today);
    state.set_current_time(now);

    if is_last_day_of_month(previous_day) {
        state.set_current_date(today.with_day(1).unwrap_or(today));
    }
}
