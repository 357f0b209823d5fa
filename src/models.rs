//! Data models for users and announcements, plus request payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::workflow::{Task, TaskAction, TaskFields, TaskStatus};

/// Role of a user; fixed at account creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Severity of an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementKind {
    Info,
    Warning,
    Success,
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::Info => "INFO",
            AnnouncementKind::Warning => "WARNING",
            AnnouncementKind::Success => "SUCCESS",
        }
    }
}

impl std::str::FromStr for AnnouncementKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(AnnouncementKind::Info),
            "WARNING" => Ok(AnnouncementKind::Warning),
            "SUCCESS" => Ok(AnnouncementKind::Success),
            _ => Err(format!("Invalid announcement type: {}", s)),
        }
    }
}

/// An operator message broadcast to every user. Never edited after posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub created_at: DateTime<Utc>,
}

/// A task joined with its owner's display name, for the admin overview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    #[serde(flatten)]
    pub task: Task,
    pub assignee_name: String,
}

/// Request to register a new account
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
}

impl RegisterUserRequest {
    /// Returns the trimmed name and lower-cased email
    pub fn validated(self) -> Result<(String, String)> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        let email = normalize_email(&self.email)?;
        Ok((name, email))
    }
}

/// Lower-case an email address after a basic shape check
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("invalid email: {}", email)));
    }
    Ok(email)
}

/// Full task payload sent by the owner; `status` is the desired status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
}

impl UpdateTaskRequest {
    pub fn into_parts(self) -> (TaskFields, TaskStatus) {
        (
            TaskFields {
                title: self.title,
                description: self.description,
                due_date: self.due_date,
            },
            self.status,
        )
    }
}

/// Request to move a task along its lifecycle
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: TaskAction,
}

/// Request to create a task for another user
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: TaskFields,
}

/// Optional approver identity sent with an approval
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTaskRequest {
    pub approver_email: Option<String>,
}

/// Request to post an announcement
#[derive(Debug, Deserialize)]
pub struct PostAnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: AnnouncementKind,
}

fn default_kind() -> AnnouncementKind {
    AnnouncementKind::Info
}

impl PostAnnouncementRequest {
    pub fn validated(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if content.is_empty() {
            return Err(AppError::Validation("content must not be empty".to_string()));
        }
        Ok(Self {
            title,
            content,
            kind: self.kind,
        })
    }
}
