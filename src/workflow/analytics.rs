//! Read-only counts over the current store contents

use serde::Serialize;

use super::policy;
use crate::error::Result;
use crate::identity::Actor;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_users: i64,
    pub total_tasks: i64,
    /// Tasks in `APPROVED`
    pub completed_tasks: i64,
    /// Tasks in `SUBMITTED`, waiting on review
    pub pending_tasks: i64,
}

#[derive(Clone)]
pub struct Analytics {
    store: Store,
}

impl Analytics {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Recomputed from the store on every call
    pub async fn snapshot(&self, actor: &Actor) -> Result<AnalyticsSnapshot> {
        policy::require_admin(actor)?;
        self.store.analytics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Role;
    use crate::store::tests::setup_test_db;
    use crate::workflow::{Task, TaskFields, TaskStatus};

    #[tokio::test]
    async fn test_snapshot_reflects_latest_writes() {
        let store = setup_test_db().await;
        let admin: Actor = store
            .create_user("Alan", "a1@example.com", Role::Admin)
            .await
            .unwrap()
            .into();
        let analytics = Analytics::new(store.clone());

        let before = analytics.snapshot(&admin).await.unwrap();
        assert_eq!(before.total_users, 1);
        assert_eq!(before.total_tasks, 0);

        let mut task = Task::new(admin.id, TaskFields::new("t", "d"));
        task.status = TaskStatus::Submitted;
        store.insert_task(&task).await.unwrap();

        let after = analytics.snapshot(&admin).await.unwrap();
        assert_eq!(after.total_tasks, 1);
        assert_eq!(after.pending_tasks, 1);
        assert_eq!(after.completed_tasks, 0);
    }

    #[tokio::test]
    async fn test_snapshot_requires_admin() {
        let store = setup_test_db().await;
        let user: Actor = store
            .create_user("Ursula", "u1@example.com", Role::User)
            .await
            .unwrap()
            .into();
        let result = Analytics::new(store).snapshot(&user).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(AnalyticsSnapshot {
            total_users: 2,
            total_tasks: 5,
            completed_tasks: 1,
            pending_tasks: 3,
        })
        .unwrap();
        assert_eq!(json["totalUsers"], 2);
        assert_eq!(json["pendingTasks"], 3);
    }
}
