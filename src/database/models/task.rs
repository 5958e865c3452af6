use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::database::patch::{nullable, Changes, Patch, PgEnum, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl PgEnum for TaskPriority {
    const TYPE_NAME: &'static str = "task_priority";

    fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Urgent => "URGENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl PgEnum for TaskStatus {
    const TYPE_NAME: &'static str = "task_status";

    fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Complete => "COMPLETE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_rule: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to the caller.
    pub assignee_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub status: TaskStatus,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_recurring: bool,

    #[validate(length(max = 255, message = "Recurrence rule too long"))]
    pub recurrence_rule: Option<String>,
}

/// Sparse task update. There is no `completed_at` field: the column
/// follows `status` and cannot be written directly.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub assignee_id: Option<Uuid>,

    #[serde(default, deserialize_with = "nullable")]
    pub customer_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "nullable")]
    pub deal_id: Option<Option<Uuid>>,

    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub is_recurring: Option<bool>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 255, message = "Recurrence rule too long"))]
    pub recurrence_rule: Option<Option<String>>,
}

impl Patch for TaskPatch {
    type Target = Task;

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        changes
            .set_some("title", &self.title, |v| SqlValue::text(v.clone()))
            .set_some("description", &self.description, |v| SqlValue::Text(v.clone()))
            .set_some("assignee_id", &self.assignee_id, |v| SqlValue::Uuid(Some(*v)))
            .set_some("customer_id", &self.customer_id, |v| SqlValue::Uuid(*v))
            .set_some("deal_id", &self.deal_id, |v| SqlValue::Uuid(*v))
            .set_some("priority", &self.priority, |v| v.sql_value())
            .set_some("status", &self.status, |v| v.sql_value())
            .set_some("due_date", &self.due_date, |v| SqlValue::Timestamp(*v))
            .set_some("is_recurring", &self.is_recurring, |v| SqlValue::Bool(Some(*v)))
            .set_some("recurrence_rule", &self.recurrence_rule, |v| SqlValue::Text(v.clone()));

        if let Some(status) = self.status {
            let completed_at = match status {
                TaskStatus::Complete => SqlValue::Now,
                _ => SqlValue::Timestamp(None),
            };
            changes.set("completed_at", completed_at);
        }
        changes
    }

    fn apply(&self, task: &mut Task) {
        if let Some(v) = &self.title {
            task.title = v.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
        if let Some(v) = self.assignee_id {
            task.assignee_id = v;
        }
        if let Some(v) = self.customer_id {
            task.customer_id = v;
        }
        if let Some(v) = self.deal_id {
            task.deal_id = v;
        }
        if let Some(v) = self.priority {
            task.priority = v;
        }
        if let Some(v) = self.due_date {
            task.due_date = v;
        }
        if let Some(v) = self.is_recurring {
            task.is_recurring = v;
        }
        if let Some(v) = &self.recurrence_rule {
            task.recurrence_rule = v.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
            task.completed_at = match status {
                TaskStatus::Complete => Some(Utc::now()),
                _ => None,
            };
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub due_date_from: Option<DateTime<Utc>>,
    pub due_date_to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, completed_at: Option<DateTime<Utc>>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Follow up".into(),
            description: None,
            assignee_id: Uuid::new_v4(),
            customer_id: None,
            deal_id: None,
            priority: TaskPriority::Medium,
            status,
            due_date: None,
            is_recurring: false,
            recurrence_rule: None,
            completed_at,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn complete_status_stamps_completed_at() {
        let patch: TaskPatch = serde_json::from_str(r#"{"status": "COMPLETE"}"#).unwrap();
        assert_eq!(patch.changes().get("completed_at"), Some(&SqlValue::Now));

        let mut target = task(TaskStatus::Pending, None);
        patch.apply(&mut target);
        assert!(target.completed_at.is_some());
    }

    #[test]
    fn other_status_clears_completed_at_even_if_supplied() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"status": "IN_PROGRESS", "completedAt": "2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(patch.changes().get("completed_at"), Some(&SqlValue::Timestamp(None)));

        let mut target = task(TaskStatus::Complete, Some(Utc::now()));
        patch.apply(&mut target);
        assert_eq!(target.status, TaskStatus::InProgress);
        assert!(target.completed_at.is_none());
    }

    #[test]
    fn completed_at_alone_is_an_empty_patch() {
        let patch: TaskPatch = serde_json::from_str(r#"{"completedAt": "2024-01-01T00:00:00Z"}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn untouched_status_leaves_completed_at() {
        let patch = TaskPatch { title: Some("Renamed".into()), ..Default::default() };
        assert!(patch.changes().get("completed_at").is_none());
    }
}
