//! Admin-only moderation: assignment, review, deletion and retention purge

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::lifecycle::TaskLifecycle;
use super::policy;
use super::task::{Task, TaskAction, TaskFields};
use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::models::normalize_email;
use crate::store::Store;

/// Approved tasks older than this many days are removed by the purge
pub const RETENTION_DAYS: i64 = 30;

/// Outcome of a retention purge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeSummary {
    pub purged: u64,
    /// Approved tasks created before this instant were removed
    pub cutoff: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Moderation {
    store: Store,
    lifecycle: TaskLifecycle,
}

impl Moderation {
    pub fn new(store: Store) -> Self {
        Self {
            lifecycle: TaskLifecycle::new(store.clone()),
            store,
        }
    }

    /// Create a pending task owned by `user_id`
    pub async fn assign(&self, actor: &Actor, user_id: Uuid, fields: TaskFields) -> Result<Task> {
        policy::require_admin(actor)?;
        let fields = fields.validated()?;

        match self.store.get_user(user_id).await {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => return Err(AppError::UnknownUser(user_id)),
            Err(e) => return Err(e),
        }

        let task = Task::new(user_id, fields);
        self.store.insert_task(&task).await?;

        tracing::info!("Task {} assigned to {} by {}", task.id, user_id, actor.id);
        Ok(task)
    }

    /// Approve a submitted task.
    ///
    /// The approver recorded on the task is always the calling admin. A
    /// claimed approver email that names someone else is refused.
    pub async fn approve(
        &self,
        actor: &Actor,
        task_id: Uuid,
        claimed_approver: Option<&str>,
    ) -> Result<Task> {
        policy::require_admin(actor)?;
        if let Some(claimed) = claimed_approver {
            if normalize_email(claimed)? != actor.email {
                return Err(AppError::Forbidden(
                    "approver must be the authenticated admin".to_string(),
                ));
            }
        }
        self.lifecycle
            .request_transition(task_id, actor, TaskAction::Approve)
            .await
    }

    pub async fn reject(&self, actor: &Actor, task_id: Uuid) -> Result<Task> {
        policy::require_admin(actor)?;
        self.lifecycle
            .request_transition(task_id, actor, TaskAction::Reject)
            .await
    }

    /// Replace title, description and due date of any task not yet approved
    pub async fn edit(&self, actor: &Actor, task_id: Uuid, fields: TaskFields) -> Result<Task> {
        policy::require_admin(actor)?;
        let fields = fields.validated()?;
        let current = self.store.get_task(task_id).await?;
        policy::authorize_edit(actor, &current)?;

        let next = current.with_fields(fields, Utc::now());
        self.lifecycle.commit(&current, next).await
    }

    /// Remove a task regardless of its status
    pub async fn delete(&self, actor: &Actor, task_id: Uuid) -> Result<()> {
        policy::require_admin(actor)?;
        if !self.store.delete_task(task_id).await? {
            return Err(AppError::NotFound(format!("Task {} not found", task_id)));
        }
        tracing::info!("Task {} deleted by {}", task_id, actor.id);
        Ok(())
    }

    pub async fn purge_expired(&self, actor: &Actor) -> Result<PurgeSummary> {
        self.purge_expired_as_of(actor, Utc::now()).await
    }

    /// Delete approved tasks whose age at `now` exceeds the retention window
    pub async fn purge_expired_as_of(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<PurgeSummary> {
        policy::require_admin(actor)?;
        let cutoff = now - Duration::days(RETENTION_DAYS);
        let purged = self.store.delete_approved_before(cutoff).await?;

        tracing::info!("Purged {} approved tasks created before {}", purged, cutoff);
        Ok(PurgeSummary { purged, cutoff })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::tests::setup_test_db;
    use crate::workflow::TaskStatus;

    struct Fixture {
        moderation: Moderation,
        lifecycle: TaskLifecycle,
        store: Store,
        user: Actor,
        admin: Actor,
    }

    async fn setup() -> Fixture {
        let store = setup_test_db().await;
        let user = store
            .create_user("Ursula", "u1@example.com", Role::User)
            .await
            .unwrap();
        let admin = store
            .create_user("Alan", "a1@example.com", Role::Admin)
            .await
            .unwrap();
        Fixture {
            moderation: Moderation::new(store.clone()),
            lifecycle: TaskLifecycle::new(store.clone()),
            store,
            user: user.into(),
            admin: admin.into(),
        }
    }

    async fn submitted_task(f: &Fixture) -> Task {
        let task = f
            .lifecycle
            .create(&f.user, TaskFields::new("Write report", "Q3"))
            .await
            .unwrap();
        f.lifecycle
            .request_transition(task.id, &f.user, TaskAction::Complete)
            .await
            .unwrap();
        f.lifecycle
            .request_transition(task.id, &f.user, TaskAction::Submit)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_assign_creates_pending_task_for_target() {
        let f = setup().await;
        let task = f
            .moderation
            .assign(&f.admin, f.user.id, TaskFields::new("Review", "budget"))
            .await
            .unwrap();
        assert_eq!(task.assignee_id, f.user.id);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_assign_unknown_user() {
        let f = setup().await;
        let missing = Uuid::new_v4();
        let result = f
            .moderation
            .assign(&f.admin, missing, TaskFields::new("Review", "budget"))
            .await;
        assert!(matches!(result, Err(AppError::UnknownUser(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_assign_requires_admin() {
        let f = setup().await;
        let result = f
            .moderation
            .assign(&f.user, f.user.id, TaskFields::new("Review", "budget"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_records_verified_admin() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        let approved = f.moderation.approve(&f.admin, task.id, None).await.unwrap();
        assert_eq!(approved.status, TaskStatus::Approved);
        assert_eq!(approved.approved_by, Some(f.admin.id));
        assert!(approved.approved_at.is_some());

        let stored = f.store.get_task(task.id).await.unwrap();
        assert_eq!(stored.approved_by, Some(f.admin.id));
    }

    #[tokio::test]
    async fn test_approve_with_matching_claimed_email() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        let approved = f
            .moderation
            .approve(&f.admin, task.id, Some("A1@Example.com"))
            .await
            .unwrap();
        assert_eq!(approved.approved_by, Some(f.admin.id));
    }

    #[tokio::test]
    async fn test_approve_with_foreign_claimed_email_is_refused() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        let result = f
            .moderation
            .approve(&f.admin, task.id, Some("someone-else@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(
            f.store.get_task(task.id).await.unwrap().status,
            TaskStatus::Submitted
        );
    }

    #[tokio::test]
    async fn test_reject_never_sets_approval() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        let rejected = f.moderation.reject(&f.admin, task.id).await.unwrap();
        assert_eq!(rejected.status, TaskStatus::Rejected);
        assert!(rejected.approved_by.is_none());
        assert!(rejected.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_approve_twice_fails() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        f.moderation.approve(&f.admin, task.id, None).await.unwrap();
        let result = f.moderation.approve(&f.admin, task.id, None).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidTransition {
                from: TaskStatus::Approved,
                to: TaskStatus::Approved
            })
        ));
    }

    #[tokio::test]
    async fn test_reject_pending_task_is_invalid() {
        let f = setup().await;
        let task = f
            .lifecycle
            .create(&f.user, TaskFields::new("t", "d"))
            .await
            .unwrap();
        let result = f.moderation.reject(&f.admin, task.id).await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_rejected_task_reopens_to_pending_only() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        f.moderation.reject(&f.admin, task.id).await.unwrap();

        let result = f
            .lifecycle
            .request_transition(task.id, &f.user, TaskAction::Complete)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));

        let reopened = f
            .lifecycle
            .request_transition(task.id, &f.user, TaskAction::Reopen)
            .await
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_edit_submitted_task_as_admin() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        let edited = f
            .moderation
            .edit(&f.admin, task.id, TaskFields::new("Write final report", "Q3"))
            .await
            .unwrap();
        assert_eq!(edited.title, "Write final report");
        assert_eq!(edited.status, TaskStatus::Submitted);
    }

    #[tokio::test]
    async fn test_edit_approved_task_is_conflict() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        f.moderation.approve(&f.admin, task.id, None).await.unwrap();
        let result = f
            .moderation
            .edit(&f.admin, task.id, TaskFields::new("late", "edit"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_review_after_concurrent_edit_keeps_the_edit() {
        let f = setup().await;
        let task = submitted_task(&f).await;

        // Review decision computed from a read taken before the edit
        let stale = f.store.get_task(task.id).await.unwrap();
        f.moderation
            .edit(&f.admin, task.id, TaskFields::new("Edited by admin", "Q3"))
            .await
            .unwrap();

        let next = stale.transitioned(TaskStatus::Approved, f.admin.id, Utc::now());
        let result = f.lifecycle.commit(&stale, next).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = f.store.get_task(task.id).await.unwrap();
        assert_eq!(stored.title, "Edited by admin");
        assert_eq!(stored.status, TaskStatus::Submitted);
        assert!(stored.approved_by.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_edits_report_conflict() {
        let f = setup().await;
        let task = submitted_task(&f).await;

        let stale = f.store.get_task(task.id).await.unwrap();
        f.moderation
            .edit(&f.admin, task.id, TaskFields::new("First", "Q3"))
            .await
            .unwrap();

        let next = stale.with_fields(TaskFields::new("Second", "Q3"), Utc::now());
        let result = f.lifecycle.commit(&stale, next).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(f.store.get_task(task.id).await.unwrap().title, "First");
    }

    #[tokio::test]
    async fn test_delete_any_status() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        f.moderation.approve(&f.admin, task.id, None).await.unwrap();
        f.moderation.delete(&f.admin, task.id).await.unwrap();
        assert!(matches!(
            f.store.get_task(task.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.moderation.delete(&f.admin, task.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_admin() {
        let f = setup().await;
        let task = submitted_task(&f).await;
        assert!(matches!(
            f.moderation.delete(&f.user, task.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_requires_admin() {
        let f = setup().await;
        assert!(matches!(
            f.moderation.purge_expired(&f.user).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_cutoff_is_thirty_days_back() {
        let f = setup().await;
        let now = Utc::now();
        let summary = f
            .moderation
            .purge_expired_as_of(&f.admin, now)
            .await
            .unwrap();
        assert_eq!(summary.purged, 0);
        assert_eq!(summary.cutoff, now - Duration::days(30));
    }
}
