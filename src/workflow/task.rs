//! Tasks and their status values
//!
//! A task is owned by exactly one user for its whole life. Status changes are
//! driven by [`TaskAction`]s and gated by [`super::policy`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Open work, the initial status
    Pending,
    /// Marked done by the owner, not yet sent for review
    Completed,
    /// Sent for review, waiting on an admin
    Submitted,
    /// Accepted by an admin; terminal
    Approved,
    /// Sent back by an admin
    Rejected,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Completed,
        TaskStatus::Submitted,
        TaskStatus::Approved,
        TaskStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Submitted => "SUBMITTED",
            TaskStatus::Approved => "APPROVED",
            TaskStatus::Rejected => "REJECTED",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Approved)
    }

    /// Statuses in which the owner may no longer touch the task
    pub fn is_locked_for_owner(&self) -> bool {
        matches!(self, TaskStatus::Submitted | TaskStatus::Approved)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "SUBMITTED" => Ok(TaskStatus::Submitted),
            "APPROVED" => Ok(TaskStatus::Approved),
            "REJECTED" => Ok(TaskStatus::Rejected),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// A requested status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    Complete,
    Reopen,
    Submit,
    Approve,
    Reject,
}

impl TaskAction {
    /// Status the task ends up in when the action is applied
    pub fn target(&self) -> TaskStatus {
        match self {
            TaskAction::Complete => TaskStatus::Completed,
            TaskAction::Reopen => TaskStatus::Pending,
            TaskAction::Submit => TaskStatus::Submitted,
            TaskAction::Approve => TaskStatus::Approved,
            TaskAction::Reject => TaskStatus::Rejected,
        }
    }

    /// The action whose target is `status`
    pub fn toward(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => TaskAction::Reopen,
            TaskStatus::Completed => TaskAction::Complete,
            TaskStatus::Submitted => TaskAction::Submit,
            TaskStatus::Approved => TaskAction::Approve,
            TaskStatus::Rejected => TaskAction::Reject,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Complete => "COMPLETE",
            TaskAction::Reopen => "REOPEN",
            TaskAction::Submit => "SUBMIT",
            TaskAction::Approve => "APPROVE",
            TaskAction::Reject => "REJECT",
        }
    }
}

/// A unit of trackable work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    /// Owner; never changes after creation
    pub assignee_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task owned by `assignee_id`
    pub fn new(assignee_id: Uuid, fields: TaskFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            status: TaskStatus::Pending,
            assignee_id,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.assignee_id == user_id
    }

    /// Produce the record after moving to `to`.
    ///
    /// Approval metadata is filled in only when entering `APPROVED`; the
    /// caller is responsible for checking the transition is allowed.
    pub fn transitioned(&self, to: TaskStatus, actor_id: Uuid, now: DateTime<Utc>) -> Task {
        let mut next = self.clone();
        next.status = to;
        if to == TaskStatus::Approved {
            next.approved_by = Some(actor_id);
            next.approved_at = Some(now);
        }
        next.updated_at = now;
        next
    }

    /// Produce the record with its editable fields replaced
    pub fn with_fields(&self, fields: TaskFields, now: DateTime<Utc>) -> Task {
        let mut next = self.clone();
        next.title = fields.title;
        next.description = fields.description;
        next.due_date = fields.due_date;
        next.updated_at = now;
        next
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
        }
    }
}

/// The user-editable attributes of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TaskFields {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Trim text fields and reject blank ones
    pub fn validated(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if description.is_empty() {
            return Err(AppError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        Ok(Self {
            title,
            description,
            due_date: self.due_date,
        })
    }
}
