//! Task lifecycle engine
//!
//! Validates a requested change against the policy, computes the next record
//! in memory and commits it with a compare-and-set on the source status. A
//! request either lands as a whole or leaves the stored task untouched.

use chrono::Utc;
use uuid::Uuid;

use super::policy;
use super::task::{Task, TaskAction, TaskFields, TaskStatus};
use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::store::Store;

/// Owner-facing task operations
#[derive(Clone)]
pub struct TaskLifecycle {
    store: Store,
}

impl TaskLifecycle {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a task owned by the caller
    pub async fn create(&self, actor: &Actor, fields: TaskFields) -> Result<Task> {
        let fields = fields.validated()?;
        let task = Task::new(actor.id, fields);
        self.store.insert_task(&task).await?;

        tracing::info!("Task {} created by {}", task.id, actor.id);
        Ok(task)
    }

    /// Tasks owned by the caller, newest first
    pub async fn list_own(&self, actor: &Actor) -> Result<Vec<Task>> {
        self.store.list_tasks_for(actor.id).await
    }

    pub async fn get(&self, actor: &Actor, task_id: Uuid) -> Result<Task> {
        let task = self.store.get_task(task_id).await?;
        policy::authorize_read(actor, &task)?;
        Ok(task)
    }

    /// Move a task along the transition table.
    ///
    /// Fails with `InvalidTransition` when the current status has no edge to
    /// the action's target, including when a concurrent request moved the
    /// task first, and with `Conflict` when a concurrent edit landed first.
    pub async fn request_transition(
        &self,
        task_id: Uuid,
        actor: &Actor,
        action: TaskAction,
    ) -> Result<Task> {
        let current = self.store.get_task(task_id).await?;
        let to = action.target();
        tracing::debug!(
            "{} requested {} on task {}",
            actor.id,
            action.as_str(),
            task_id
        );
        policy::authorize_transition(actor, &current, to)?;

        let next = current.transitioned(to, actor.id, Utc::now());
        self.commit(&current, next).await
    }

    /// Apply a full task payload: field edits plus an optional status change,
    /// written in one statement.
    pub async fn update(
        &self,
        task_id: Uuid,
        actor: &Actor,
        fields: TaskFields,
        desired: TaskStatus,
    ) -> Result<Task> {
        let fields = fields.validated()?;
        let current = self.store.get_task(task_id).await?;
        policy::authorize_read(actor, &current)?;
        let now = Utc::now();

        let mut next = current.clone();
        if fields != current.fields() {
            policy::authorize_edit(actor, &current)?;
            next = next.with_fields(fields, now);
        }
        if desired != current.status {
            tracing::debug!(
                "{} requested {} on task {} via update",
                actor.id,
                TaskAction::toward(desired).as_str(),
                task_id
            );
            policy::authorize_transition(actor, &current, desired)?;
            next = next.transitioned(desired, actor.id, now);
        }

        if next == current {
            return Ok(current);
        }
        self.commit(&current, next).await
    }

    /// Write `next` if the stored row is still the version `current` was
    /// read from.
    pub(crate) async fn commit(&self, current: &Task, next: Task) -> Result<Task> {
        if self.store.compare_and_set_task(&next, current).await? {
            if next.status != current.status {
                tracing::info!(
                    "Task {} moved {} -> {}",
                    next.id,
                    current.status,
                    next.status
                );
            }
            return Ok(next);
        }

        // Lost the race: report against what is stored now
        let latest = self.store.get_task(current.id).await?;
        tracing::warn!(
            "Task {} changed concurrently (expected {}, found {})",
            current.id,
            current.status,
            latest.status
        );
        if latest.status != current.status && next.status != current.status {
            return Err(AppError::InvalidTransition {
                from: latest.status,
                to: next.status,
            });
        }
        Err(AppError::Conflict(format!(
            "task {} was modified concurrently",
            current.id
        )))
    }
}
