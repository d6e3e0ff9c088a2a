//! Tasks controller.
//!
//! Loads reminders from the native store when the platform has one and
//! falls back to demo tasks otherwise. Completed tasks are never listed.

use std::cmp::Ordering as CmpOrdering;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::controller::{InFlight, LoadMode};
use crate::reminder::{demo_tasks, ReminderSource, Task, TaskPriority, TaskStatus};
use crate::timer::{PlatformTimers, TimerHandle};

const LOAD_ERROR: &str = "Could not access your reminders. Showing sample tasks instead.";

/// Where the current task list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    Native,
    Demo,
}

#[derive(Debug, Default)]
pub struct TasksState {
    pub tasks: Vec<Task>,
    pub loading: bool,
    /// Empty string means "no error".
    pub error: String,
}

/// Narrows the task list. Empty criteria match everything; a task must
/// satisfy every non-empty criterion, and any one of the listed tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub statuses: Vec<TaskStatus>,
    pub priorities: Vec<TaskPriority>,
    pub tags: Vec<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&task.status))
            && (self.priorities.is_empty() || self.priorities.contains(&task.priority))
            && (self.tags.is_empty() || task.tags.iter().any(|t| self.tags.contains(t)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

impl TaskSortKey {
    /// Direction used when none is given: soonest due and A-Z first,
    /// newest and most important first.
    pub fn default_order(&self) -> SortOrder {
        match self {
            TaskSortKey::DueDate | TaskSortKey::Title => SortOrder::Asc,
            TaskSortKey::CreatedAt | TaskSortKey::Priority => SortOrder::Desc,
        }
    }
}

impl FromStr for TaskSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "created-at" => Ok(TaskSortKey::CreatedAt),
            "due" | "due-date" => Ok(TaskSortKey::DueDate),
            "priority" => Ok(TaskSortKey::Priority),
            "title" => Ok(TaskSortKey::Title),
            _ => Err(format!(
                "Unknown sort key '{}'. Expected created, due, priority or title",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order '{}'. Expected asc or desc", s)),
        }
    }
}

/// Stable ordering of the task list. Tasks without a due date always go
/// last when sorting by due date, whatever the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub key: TaskSortKey,
    pub order: SortOrder,
}

impl Default for TaskSort {
    fn default() -> Self {
        TaskSort {
            key: TaskSortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl TaskSort {
    pub fn by(key: TaskSortKey) -> Self {
        TaskSort {
            key,
            order: key.default_order(),
        }
    }

    pub fn apply(&self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Task, b: &Task) -> CmpOrdering {
        let ordering = match self.key {
            TaskSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            TaskSortKey::Priority => a.priority.cmp(&b.priority),
            TaskSortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            TaskSortKey::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return CmpOrdering::Less,
                (None, Some(_)) => return CmpOrdering::Greater,
                (None, None) => CmpOrdering::Equal,
            },
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

pub struct TasksController {
    /// `None` when the platform has no reminders store.
    native: Option<Arc<dyn ReminderSource>>,
    clock: Arc<dyn Clock>,
    timers: PlatformTimers,
    reload_interval: Duration,
    state: Mutex<TasksState>,
    auto_reload: Mutex<Option<TimerHandle>>,
    in_flight: AtomicUsize,
    generation: AtomicU64,
}

impl TasksController {
    pub fn new(
        native: Option<Arc<dyn ReminderSource>>,
        clock: Arc<dyn Clock>,
        timers: PlatformTimers,
        reload_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(TasksController {
            native,
            clock,
            timers,
            reload_interval,
            state: Mutex::new(TasksState::default()),
            auto_reload: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        })
    }

    fn state(&self) -> MutexGuard<'_, TasksState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> String {
        self.state().error.clone()
    }

    /// Load open tasks. Returns `None` when nothing was stored: a silent
    /// load found another load in flight, or a newer load started meanwhile.
    pub async fn load_tasks(&self, mode: LoadMode) -> Option<TaskOrigin> {
        let _in_flight = match mode {
            LoadMode::Foreground => InFlight::enter(&self.in_flight),
            LoadMode::Silent => match InFlight::enter_alone(&self.in_flight) {
                Some(guard) => guard,
                None => {
                    tracing::debug!("silent task reload skipped, another load is in flight");
                    return None;
                }
            },
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if mode == LoadMode::Foreground {
            let mut state = self.state();
            state.loading = true;
            state.error.clear();
        }

        let mut origin = TaskOrigin::Demo;
        let mut tasks = None;
        let mut failed = false;

        if let Some(native) = &self.native {
            match native.get_tasks(false).await {
                Ok(loaded) => {
                    origin = TaskOrigin::Native;
                    tasks = Some(loaded);
                }
                Err(err) => {
                    tracing::error!(
                        source = native.name(),
                        "failed to load reminders, falling back to demo tasks: {}",
                        err
                    );
                    failed = true;
                }
            }
        }

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding result of superseded task load");
            return None;
        }

        let tasks: Vec<Task> = tasks
            .unwrap_or_else(|| demo_tasks(self.clock.now()))
            .into_iter()
            .filter(|t| !t.is_done())
            .collect();
        tracing::debug!(?origin, count = tasks.len(), "tasks loaded");

        let mut state = self.state();
        state.tasks = tasks;
        if mode == LoadMode::Foreground {
            if failed {
                state.error = LOAD_ERROR.to_string();
            }
            state.loading = false;
        }
        Some(origin)
    }

    /// Tasks matching `filter`, in `sort` order.
    pub fn view(&self, filter: &TaskFilter, sort: TaskSort) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .state()
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort.apply(&mut tasks);
        tasks
    }

    /// Poll the native store silently. Does nothing without one.
    pub fn start_auto_reload(self: &Arc<Self>) {
        self.stop_auto_reload();
        if self.native.is_none() {
            return;
        }

        let weak = Arc::downgrade(self);
        let handle = self.timers.set_interval(
            move || {
                if let Some(controller) = weak.upgrade() {
                    tokio::spawn(async move {
                        controller.load_tasks(LoadMode::Silent).await;
                    });
                }
            },
            self.reload_interval,
        );

        *self.auto_reload.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    pub fn stop_auto_reload(&self) {
        let handle = self
            .auto_reload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.timers.clear_interval(handle);
        }
    }

    pub fn is_auto_reloading(&self) -> bool {
        self.auto_reload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Open tasks whose due date has passed.
    pub fn overdue_tasks(&self, now: DateTime<Utc>) -> Vec<Task> {
        self.state()
            .tasks
            .iter()
            .filter(|t| t.is_overdue(now))
            .cloned()
            .collect()
    }

    /// Distinct tags in first-seen order.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.state().tasks.iter().flat_map(|t| &t.tags) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Flip a task between done and todo. Returns false for unknown ids.
    pub fn toggle_task(&self, id: &str) -> bool {
        let now = self.clock.now();
        match self.state().tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.toggle(now);
                true
            }
            None => false,
        }
    }
}

impl Drop for TasksController {
    fn drop(&mut self) {
        self.stop_auto_reload();
    }
}
