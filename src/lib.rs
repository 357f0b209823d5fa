//! Taskboard server - personal tasks with an admin moderation workflow

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod store;
pub mod workflow;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::workflow::{Analytics, Moderation, TaskLifecycle};

/// Application state shared across handlers
pub struct AppState {
    pub store: store::Store,
    pub tasks: TaskLifecycle,
    pub moderation: Moderation,
    pub analytics: Analytics,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        let store = store::Store::new(pool);
        Arc::new(Self {
            tasks: TaskLifecycle::new(store.clone()),
            moderation: Moderation::new(store.clone()),
            analytics: Analytics::new(store.clone()),
            store,
        })
    }
}
