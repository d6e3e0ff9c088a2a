//! Reminders and tasks.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DaybookResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!(
                "Unknown task status '{}'. Expected todo, in-progress or done",
                s
            )),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(format!("Unknown priority '{}'. Expected low, medium or high", s)),
        }
    }
}

impl TaskPriority {
    /// Map an EventKit priority (0 = none, 1 highest .. 9 lowest).
    pub fn from_apple(priority: i64) -> Self {
        match priority {
            1..=4 => TaskPriority::High,
            5 => TaskPriority::Medium,
            _ => TaskPriority::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub notes: Option<String>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.completed || self.status == TaskStatus::Done
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < now)
    }

    /// Flip between done and todo, stamping the modification times.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.status == TaskStatus::Done {
            self.status = TaskStatus::Todo;
        } else {
            self.status = TaskStatus::Done;
            self.completed_at = Some(now);
        }
        self.completed = self.status == TaskStatus::Done;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderList {
    pub id: String,
    pub title: String,
}

/// A backend that can list reminders as tasks.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_tasks(&self, include_completed: bool) -> DaybookResult<Vec<Task>>;

    async fn get_reminder_lists(&self) -> DaybookResult<Vec<ReminderList>> {
        Ok(Vec::new())
    }
}

/// Placeholder tasks shown when no reminders store is reachable.
pub fn demo_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let demo = |id: &str, title: &str, due_in_days: i64, priority, notes: Option<&str>| Task {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::Todo,
        priority,
        due_date: Some(now + TimeDelta::days(due_in_days)),
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
        completed_at: None,
        completed: false,
        notes: notes.map(str::to_string),
    };

    vec![
        demo(
            "1",
            "Review quarterly plan",
            2,
            TaskPriority::High,
            Some("Go through the open items before the planning meeting"),
        ),
        demo("2", "Reply to pending emails", 0, TaskPriority::Medium, None),
        demo("4", "Book dentist appointment", 7, TaskPriority::High, None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_apple_priority_mapping() {
        assert_eq!(TaskPriority::from_apple(0), TaskPriority::Low);
        for p in 1..=4 {
            assert_eq!(TaskPriority::from_apple(p), TaskPriority::High);
        }
        assert_eq!(TaskPriority::from_apple(5), TaskPriority::Medium);
        for p in 6..=9 {
            assert_eq!(TaskPriority::from_apple(p), TaskPriority::Low);
        }
    }

    #[test]
    fn test_toggle_round_trip_updates_completion() {
        let mut task = demo_tasks(now()).remove(0);
        let later = now() + TimeDelta::minutes(5);

        task.toggle(later);
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(later));
        assert_eq!(task.updated_at, later);

        task.toggle(later);
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.completed);
    }

    #[test]
    fn test_overdue_ignores_done_and_undated() {
        let mut task = demo_tasks(now()).remove(1);
        assert!(!task.is_overdue(now()));
        assert!(task.is_overdue(now() + TimeDelta::seconds(1)));

        task.toggle(now());
        assert!(!task.is_overdue(now() + TimeDelta::days(1)));

        task.due_date = None;
        task.status = TaskStatus::Todo;
        assert!(!task.is_overdue(now() + TimeDelta::days(1)));
    }

    #[test]
    fn test_demo_tasks_are_open() {
        let tasks = demo_tasks(now());
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| !t.is_done()));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_status_and_priority_parse() {
        assert_eq!("In-Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("later".parse::<TaskStatus>().is_err());
        assert_eq!("HIGH".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert!("urgent".parse::<TaskPriority>().unwrap_err().contains("urgent"));
    }
}
