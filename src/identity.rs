//! Request identity
//!
//! The caller's credential is opaque to the workflow: an `X-User-Id` header is
//! resolved against the user table into an [`Actor`], which is then passed
//! explicitly into every operation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};
use crate::AppState;

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The verified identity behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Parse the user id header without touching the store
pub fn user_id_from_parts(parts: &Parts) -> Result<Uuid, AppError> {
    let value = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed user id".to_string()))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Unauthorized("malformed user id".to_string()))
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = user_id_from_parts(parts)?;

        let user = match state.store.get_user(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                tracing::debug!("Rejected request from unknown user {}", user_id);
                return Err(AppError::Unauthorized("unknown user".to_string()));
            }
            Err(e) => return Err(e),
        };

        Ok(user.into())
    }
}
