//! HTTP routes
//!
//! Handlers only decode requests, resolve the [`Actor`] and call into the
//! workflow; every rule is enforced below this layer.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::identity::Actor;
use crate::models::{
    Announcement, ApproveTaskRequest, AssignTaskRequest, AssignedTask, PostAnnouncementRequest,
    RegisterUserRequest, Role, TransitionRequest, UpdateTaskRequest, User,
};
use crate::workflow::{policy, AnalyticsSnapshot, PurgeSummary, Task, TaskFields};
use crate::AppState;

/// JSON body whose decoding failures surface as validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Largest request body buffered by [`OptionalApiJson`]
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// JSON body that may be omitted entirely.
///
/// An empty body yields `None`; anything else must decode as [`ApiJson`] would,
/// so a malformed body is a validation error rather than an absent one.
pub struct OptionalApiJson<T>(pub Option<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for OptionalApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| AppError::Validation(format!("failed to read body: {}", e)))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        Ok(Self(Some(value)))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(register_user))
        .route("/tasks", get(list_own_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task))
        .route("/tasks/:id/transition", post(transition_task))
        .route("/announcements", get(list_announcements))
        .route("/admin/users", get(list_users))
        .route("/admin/tasks", get(list_all_tasks))
        .route("/admin/tasks/assign", post(assign_task))
        .route("/admin/tasks/purge-old", delete(purge_old_tasks))
        .route("/admin/tasks/:id", put(edit_task).delete(delete_task))
        .route("/admin/tasks/:id/approve", put(approve_task))
        .route("/admin/tasks/:id/reject", put(reject_task))
        .route("/admin/announcements", post(post_announcement))
        .route("/admin/analytics", get(analytics))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let (name, email) = req.validated()?;
    let user = state.store.create_user(&name, &email, Role::User).await?;
    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

// Task routes

async fn list_own_tasks(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list_own(&actor).await?))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(fields): ApiJson<TaskFields>,
) -> Result<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(&actor, fields).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>> {
    Ok(Json(state.tasks.get(&actor, id).await?))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    let (fields, status) = req.into_parts();
    Ok(Json(state.tasks.update(id, &actor, fields, status).await?))
}

async fn transition_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<TransitionRequest>,
) -> Result<Json<Task>> {
    let task = state
        .tasks
        .request_transition(id, &actor, req.action)
        .await?;
    Ok(Json(task))
}

async fn list_announcements(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
) -> Result<Json<Vec<Announcement>>> {
    Ok(Json(state.store.list_announcements().await?))
}

// Admin routes

async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<User>>> {
    policy::require_admin(&actor)?;
    Ok(Json(state.store.list_users().await?))
}

async fn list_all_tasks(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<AssignedTask>>> {
    policy::require_admin(&actor)?;
    Ok(Json(state.store.list_tasks_with_assignee().await?))
}

async fn assign_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(req): ApiJson<AssignTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let task = state
        .moderation
        .assign(&actor, req.user_id, req.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn edit_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    ApiJson(fields): ApiJson<TaskFields>,
) -> Result<Json<Task>> {
    Ok(Json(state.moderation.edit(&actor, id, fields).await?))
}

async fn approve_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalApiJson(body): OptionalApiJson<ApproveTaskRequest>,
) -> Result<Json<Task>> {
    let req = body.unwrap_or_default();
    let task = state
        .moderation
        .approve(&actor, id, req.approver_email.as_deref())
        .await?;
    Ok(Json(task))
}

async fn reject_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>> {
    Ok(Json(state.moderation.reject(&actor, id).await?))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.moderation.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn purge_old_tasks(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<PurgeSummary>> {
    Ok(Json(state.moderation.purge_expired(&actor).await?))
}

async fn post_announcement(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(req): ApiJson<PostAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>)> {
    policy::require_admin(&actor)?;
    let req = req.validated()?;
    let announcement = state
        .store
        .create_announcement(&req.title, &req.content, req.kind)
        .await?;
    tracing::info!("Announcement {} posted by {}", announcement.id, actor.id);
    Ok((StatusCode::CREATED, Json(announcement)))
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<AnalyticsSnapshot>> {
    Ok(Json(state.analytics.snapshot(&actor).await?))
}
