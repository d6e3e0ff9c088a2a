//! App foreground and page visibility transitions.
//!
//! The host (mobile shell, webview bridge, or a signal handler in the CLI)
//! publishes transitions here; the timer shim listens for them to run
//! catch-up ticks after the process was suspended.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The application moved to or from the foreground.
    AppStateChange { is_active: bool },
    /// The page/screen was hidden (lock, tab switch) or shown again.
    VisibilityChange { hidden: bool },
}

/// Which transitions a listener cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    AppState,
    Visibility,
}

impl LifecycleEvent {
    /// Whether this event means "became active again" for a listener of `kind`.
    pub fn is_resume_for(&self, kind: ListenerKind) -> bool {
        match (self, kind) {
            (LifecycleEvent::AppStateChange { is_active }, ListenerKind::AppState) => *is_active,
            (LifecycleEvent::VisibilityChange { hidden }, ListenerKind::Visibility) => !*hidden,
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct Lifecycle {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Lifecycle { tx }
    }

    /// Publish a transition. Returns how many listeners received it.
    pub fn emit(&self, event: LifecycleEvent) -> usize {
        tracing::debug!(?event, "lifecycle transition");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
