//! Platform-aware interval timers.
//!
//! On platforms that throttle timers in the background (iOS), every interval
//! also listens for app-foreground and visibility transitions. Either one
//! runs the callback immediately as a catch-up tick and restarts the
//! interval if it stopped. Intervals are never paused while backgrounded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::lifecycle::{Lifecycle, ListenerKind};

pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct TimerEntry {
    callback: TimerCallback,
    period: Duration,
    interval: Option<JoinHandle<()>>,
    app_state_listener: Option<JoinHandle<()>>,
    visibility_listener: Option<JoinHandle<()>>,
}

impl TimerEntry {
    fn is_running(&self) -> bool {
        self.interval.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn stop(&mut self) {
        for handle in [
            self.interval.take(),
            self.app_state_listener.take(),
            self.visibility_listener.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

struct Inner {
    timers: Mutex<HashMap<TimerHandle, TimerEntry>>,
    next_id: AtomicU64,
    lifecycle: Lifecycle,
    catch_up_on_resume: bool,
}

impl Inner {
    fn timers(&self) -> std::sync::MutexGuard<'_, HashMap<TimerHandle, TimerEntry>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn catch_up(&self, handle: TimerHandle) {
        let callback = {
            let mut timers = self.timers();
            let Some(entry) = timers.get_mut(&handle) else {
                return;
            };
            if !entry.is_running() {
                tracing::debug!(?handle, "restarting stopped interval on resume");
                entry.interval = Some(spawn_interval(entry.callback.clone(), entry.period));
            }
            entry.callback.clone()
        };

        tracing::debug!(?handle, "catch-up tick");
        callback();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in timers.values_mut() {
            entry.stop();
        }
    }
}

/// Owner of every interval started through it.
///
/// Must be used from inside a tokio runtime.
#[derive(Clone)]
pub struct PlatformTimers {
    inner: Arc<Inner>,
}

impl PlatformTimers {
    pub fn new(lifecycle: Lifecycle, catch_up_on_resume: bool) -> Self {
        PlatformTimers {
            inner: Arc::new(Inner {
                timers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                lifecycle,
                catch_up_on_resume,
            }),
        }
    }

    /// Run `callback` every `period`, first after one full period.
    pub fn set_interval<F>(&self, callback: F, period: Duration) -> TimerHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = TimerHandle(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: TimerCallback = Arc::new(callback);

        let mut entry = TimerEntry {
            callback: callback.clone(),
            period,
            interval: Some(spawn_interval(callback, period)),
            app_state_listener: None,
            visibility_listener: None,
        };

        if self.inner.catch_up_on_resume {
            let weak = Arc::downgrade(&self.inner);
            entry.app_state_listener = Some(spawn_listener(
                weak.clone(),
                &self.inner.lifecycle,
                handle,
                ListenerKind::AppState,
            ));
            entry.visibility_listener = Some(spawn_listener(
                weak,
                &self.inner.lifecycle,
                handle,
                ListenerKind::Visibility,
            ));
        }

        self.inner.timers().insert(handle, entry);
        tracing::debug!(?handle, ?period, "interval started");
        handle
    }

    /// Stop the interval and drop its listeners. Unknown handles are ignored.
    pub fn clear_interval(&self, handle: TimerHandle) {
        if let Some(mut entry) = self.inner.timers().remove(&handle) {
            entry.stop();
            tracing::debug!(?handle, "interval cleared");
        }
    }

    pub fn clear_all(&self) {
        let mut timers = self.inner.timers();
        for entry in timers.values_mut() {
            entry.stop();
        }
        timers.clear();
    }

    pub fn active_timers_count(&self) -> usize {
        self.inner.timers().len()
    }

    pub fn is_running(&self, handle: TimerHandle) -> bool {
        self.inner
            .timers()
            .get(&handle)
            .is_some_and(TimerEntry::is_running)
    }

    /// Number of live catch-up listeners owned by `handle` (0 or 2).
    pub fn listener_count(&self, handle: TimerHandle) -> usize {
        self.inner.timers().get(&handle).map_or(0, |entry| {
            [&entry.app_state_listener, &entry.visibility_listener]
                .into_iter()
                .filter(|l| l.as_ref().is_some_and(|h| !h.is_finished()))
                .count()
        })
    }
}

fn spawn_interval(callback: TimerCallback, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            callback();
        }
    })
}

fn spawn_listener(
    inner: Weak<Inner>,
    lifecycle: &Lifecycle,
    handle: TimerHandle,
    kind: ListenerKind,
) -> JoinHandle<()> {
    let mut rx = lifecycle.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.is_resume_for(kind) => {
                    let Some(inner) = inner.upgrade() else {
                        break;
                    };
                    inner.catch_up(handle);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(?handle, skipped, "lifecycle listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
