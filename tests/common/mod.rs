//! Shared setup for integration tests

#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use taskboard::identity::Actor;
use taskboard::models::Role;
use taskboard::AppState;

pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub async fn setup_state() -> Arc<AppState> {
    AppState::new(setup_pool().await)
}

pub async fn make_actor(state: &AppState, name: &str, role: Role) -> Actor {
    let email = format!("{}@example.com", name.to_lowercase());
    state
        .store
        .create_user(name, &email, role)
        .await
        .expect("Failed to create user")
        .into()
}
