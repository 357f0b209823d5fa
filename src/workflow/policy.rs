//! Authorization policy for task transitions and edits
//!
//! Pure functions over (role, status, ownership). Nothing here is cached; the
//! lifecycle engine evaluates them on every request.

use super::task::{Task, TaskStatus};
use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::models::Role;

/// Who may perform a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The task's owner, whatever their role
    Owner,
    /// Any administrator
    Admin,
}

/// The transition table. `None` means the move does not exist.
pub fn gate(from: TaskStatus, to: TaskStatus) -> Option<Gate> {
    use crate::workflow::task::TaskStatus::*;

    match (from, to) {
        (Pending, Completed) => Some(Gate::Owner),
        (Completed, Pending) => Some(Gate::Owner),
        (Completed, Submitted) => Some(Gate::Owner),
        (Submitted, Approved) => Some(Gate::Admin),
        (Submitted, Rejected) => Some(Gate::Admin),
        (Rejected, Pending) => Some(Gate::Owner),
        _ => None,
    }
}

pub fn is_permitted(role: Role, from: TaskStatus, to: TaskStatus, is_owner: bool) -> bool {
    match gate(from, to) {
        Some(Gate::Owner) => is_owner,
        Some(Gate::Admin) => role == Role::Admin,
        None => false,
    }
}

/// Whether title, description and due date may be replaced
pub fn can_edit_fields(role: Role, status: TaskStatus, is_owner: bool) -> bool {
    if status.is_terminal() {
        return false;
    }
    role == Role::Admin || (is_owner && !status.is_locked_for_owner())
}

/// Check that `actor` may move `task` to `to`.
///
/// A move missing from the table is an invalid transition; a move that exists
/// but belongs to someone else is forbidden.
pub fn authorize_transition(actor: &Actor, task: &Task, to: TaskStatus) -> Result<()> {
    let from = task.status;
    let Some(required) = gate(from, to) else {
        return Err(AppError::InvalidTransition { from, to });
    };

    if is_permitted(actor.role, from, to, task.is_owned_by(actor.id)) {
        return Ok(());
    }

    let reason = match required {
        Gate::Owner => format!("only the task owner may move a task from {} to {}", from, to),
        Gate::Admin => format!("only an admin may move a task from {} to {}", from, to),
    };
    Err(AppError::Forbidden(reason))
}

pub fn authorize_edit(actor: &Actor, task: &Task) -> Result<()> {
    let is_owner = task.is_owned_by(actor.id);
    if can_edit_fields(actor.role, task.status, is_owner) {
        return Ok(());
    }
    if task.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "task {} is {} and can no longer be edited",
            task.id, task.status
        )));
    }
    if is_owner {
        Err(AppError::Forbidden(format!(
            "task {} is {} and locked until reviewed",
            task.id, task.status
        )))
    } else {
        Err(AppError::Forbidden(format!(
            "only the owner or an admin may edit task {}",
            task.id
        )))
    }
}

/// Only the task's owner or an admin may read it
pub fn authorize_read(actor: &Actor, task: &Task) -> Result<()> {
    if actor.is_admin() || task.is_owned_by(actor.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "task {} belongs to another user",
            task.id
        )))
    }
}

pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin role required".to_string()))
    }
}
