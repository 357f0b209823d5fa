//! Taskboard server - personal tasks with an admin moderation workflow

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::config::Config;
use taskboard::models::{normalize_email, Role};
use taskboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    // Database connection
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(pool);

    if let Some(email) = &config.admin_email {
        let email = normalize_email(email)?;
        let admin = state
            .store
            .ensure_user(&config.admin_name, &email, Role::Admin)
            .await?;
        if admin.role != Role::Admin {
            anyhow::bail!("{} is registered as a regular user", email);
        }
        tracing::info!("Admin account {} has id {}", admin.email, admin.id);
    }

    let app = taskboard::api::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
