//! Apple Reminders source.

use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::error::{DaybookError, DaybookResult};
use daybook_core::reminder::{ReminderList, ReminderSource, Task, TaskPriority, TaskStatus};
use daybook_core::source::Platform;

use crate::bridge::{AppleReminder, NativeBridge, check_then_request};
use crate::bridge_error;
use crate::iso::{parse_bridge_datetime, parse_optional_datetime};

pub struct AppleRemindersSource {
    bridge: Arc<dyn NativeBridge>,
    platform: Platform,
}

impl AppleRemindersSource {
    pub fn new(bridge: Arc<dyn NativeBridge>, platform: Platform) -> Self {
        AppleRemindersSource { bridge, platform }
    }
}

pub fn to_task(reminder: AppleReminder) -> DaybookResult<Task> {
    let status = if reminder.completed {
        TaskStatus::Done
    } else {
        TaskStatus::Todo
    };

    Ok(Task {
        status,
        priority: TaskPriority::from_apple(reminder.priority),
        due_date: parse_optional_datetime("dueDate", reminder.due_date.as_deref())?,
        tags: reminder.list_title.into_iter().filter(|t| !t.is_empty()).collect(),
        created_at: parse_bridge_datetime("createdAt", &reminder.created_at)?,
        updated_at: parse_bridge_datetime("modifiedAt", &reminder.modified_at)?,
        completed_at: parse_optional_datetime(
            "completionDate",
            reminder.completion_date.as_deref(),
        )?,
        completed: reminder.completed,
        notes: reminder.notes.filter(|n| !n.is_empty()),
        description: String::new(),
        id: reminder.id,
        title: reminder.title,
    })
}

#[async_trait]
impl ReminderSource for AppleRemindersSource {
    fn name(&self) -> &str {
        "apple-reminders"
    }

    async fn get_tasks(&self, include_completed: bool) -> DaybookResult<Vec<Task>> {
        if self.platform != Platform::Ios {
            return Ok(Vec::new());
        }

        let granted = check_then_request(
            "reminders",
            self.bridge.check_reminders_permissions(),
            self.bridge.request_reminders_permissions(),
        )
        .await;
        if !granted {
            return Err(DaybookError::PermissionDenied(
                "Permission denied to access reminders".into(),
            ));
        }

        let reminders = self
            .bridge
            .get_reminders(include_completed)
            .await
            .map_err(bridge_error)?;

        let tasks = reminders
            .into_iter()
            .map(to_task)
            .collect::<DaybookResult<Vec<_>>>()?;

        // The bridge filter is not trusted to exclude completed items.
        if include_completed {
            Ok(tasks)
        } else {
            Ok(tasks.into_iter().filter(|t| !t.is_done()).collect())
        }
    }

    /// Lists are decoration only, so failures yield an empty list.
    async fn get_reminder_lists(&self) -> DaybookResult<Vec<ReminderList>> {
        if self.platform != Platform::Ios {
            return Ok(Vec::new());
        }

        match self.bridge.get_reminder_lists().await {
            Ok(lists) => Ok(lists
                .into_iter()
                .map(|l| ReminderList {
                    id: l.id,
                    title: l.title,
                })
                .collect()),
            Err(e) => {
                tracing::error!("error fetching reminder lists: {:#}", e);
                Ok(Vec::new())
            }
        }
    }
}
