//! Database store for users, tasks and announcements

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Announcement, AnnouncementKind, AssignedTask, Role, User};
use crate::workflow::{AnalyticsSnapshot, Task, TaskStatus};

/// Database store
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // User operations

    /// Create a user. Emails are unique; a duplicate yields `Conflict`.
    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> Result<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(email)
        .bind(role.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("email {} is already registered", email))
            }
            other => AppError::Database(other),
        })?;

        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: now,
        })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        row.try_into()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Return the user with `email`, creating it with `role` if absent
    pub async fn ensure_user(&self, name: &str, email: &str, role: Role) -> Result<User> {
        if let Some(user) = self.find_user_by_email(email).await? {
            return Ok(user);
        }
        self.create_user(name, email, role).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            ORDER BY name ASC, email ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    // Task operations

    pub async fn insert_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, due_date, status, assignee_id, approved_by, approved_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.assignee_id.to_string())
        .bind(task.approved_by.map(|u| u.to_string()))
        .bind(task.approved_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_task(&self, id: Uuid) -> Result<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, due_date, status, assignee_id, approved_by, approved_at, created_at, updated_at
            FROM tasks
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;

        row.try_into()
    }

    pub async fn list_tasks_for(&self, assignee_id: Uuid) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, due_date, status, assignee_id, approved_by, approved_at, created_at, updated_at
            FROM tasks
            WHERE assignee_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(assignee_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Every task, with the owner's name denormalized in
    pub async fn list_tasks_with_assignee(&self) -> Result<Vec<AssignedTask>> {
        let rows = sqlx::query_as::<_, AssignedTaskRow>(
            r#"
            SELECT t.id, t.title, t.description, t.due_date, t.status, t.assignee_id,
                   t.approved_by, t.approved_at, t.created_at, t.updated_at,
                   u.name AS assignee_name
            FROM tasks t
            JOIN users u ON u.id = t.assignee_id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(AssignedTask {
                    task: r.task.try_into()?,
                    assignee_name: r.assignee_name,
                })
            })
            .collect()
    }

    /// Overwrite the mutable columns with `task` only if the stored row is
    /// still the version `read`: same status and same `updated_at`.
    ///
    /// Returns `false` when no row matched, i.e. the task is gone or another
    /// write landed since it was read.
    pub async fn compare_and_set_task(&self, task: &Task, read: &Task) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, due_date = ?, status = ?,
                approved_by = ?, approved_at = ?, updated_at = ?
            WHERE id = ? AND status = ? AND updated_at = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.approved_by.map(|u| u.to_string()))
        .bind(task.approved_at)
        .bind(task.updated_at)
        .bind(task.id.to_string())
        .bind(read.status.as_str())
        .bind(read.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns whether a row was deleted
    pub async fn delete_task(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete approved tasks created strictly before `cutoff`
    pub async fn delete_approved_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE status = ? AND created_at < ?
            "#,
        )
        .bind(TaskStatus::Approved.as_str())
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts taken in one statement so they describe a single snapshot
    pub async fn analytics(&self) -> Result<AnalyticsSnapshot> {
        let (total_users, total_tasks, completed_tasks, pending_tasks) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM tasks),
                    (SELECT COUNT(*) FROM tasks WHERE status = ?),
                    (SELECT COUNT(*) FROM tasks WHERE status = ?)
                "#,
            )
            .bind(TaskStatus::Approved.as_str())
            .bind(TaskStatus::Submitted.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(AnalyticsSnapshot {
            total_users,
            total_tasks,
            completed_tasks,
            pending_tasks,
        })
    }

    // Announcement operations

    pub async fn create_announcement(
        &self,
        title: &str,
        content: &str,
        kind: AnnouncementKind,
    ) -> Result<Announcement> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO announcements (id, title, content, kind, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(title)
        .bind(content)
        .bind(kind.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Announcement {
            id,
            title: title.to_string(),
            content: content.to_string(),
            kind,
            created_at: now,
        })
    }

    /// All announcements, newest first
    pub async fn list_announcements(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, content, kind, created_at
            FROM announcements
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

// Internal row types for sqlx

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::Internal(format!("Invalid {} UUID: {}", column, e)))
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_uuid(&row.id, "user id")?,
            name: row.name,
            email: row.email,
            role: row.role.parse().map_err(AppError::Internal)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    due_date: Option<NaiveDate>,
    status: String,
    assignee_id: String,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self> {
        let approved_by = row
            .approved_by
            .as_deref()
            .map(|s| parse_uuid(s, "approved_by"))
            .transpose()?;

        Ok(Task {
            id: parse_uuid(&row.id, "task id")?,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status: row.status.parse().map_err(AppError::Internal)?,
            assignee_id: parse_uuid(&row.assignee_id, "assignee_id")?,
            approved_by,
            approved_at: row.approved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignedTaskRow {
    #[sqlx(flatten)]
    task: TaskRow,
    assignee_name: String,
}

#[derive(sqlx::FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    content: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnnouncementRow> for Announcement {
    type Error = AppError;

    fn try_from(row: AnnouncementRow) -> Result<Self> {
        Ok(Announcement {
            id: parse_uuid(&row.id, "announcement id")?,
            title: row.title,
            content: row.content,
            kind: row.kind.parse().map_err(AppError::Internal)?,
            created_at: row.created_at,
        })
    }
}
