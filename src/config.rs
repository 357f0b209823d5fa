//! Server configuration from command-line flags and environment

use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard server - personal tasks with admin moderation")]
#[command(version)]
pub struct Config {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:taskboard.db?mode=rwc")]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "TASKBOARD_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Connection pool size
    #[arg(long, env = "TASKBOARD_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Email of the administrator account to create at startup
    #[arg(long, env = "TASKBOARD_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Display name for the bootstrap administrator
    #[arg(long, env = "TASKBOARD_ADMIN_NAME", default_value = "Admin")]
    pub admin_name: String,
}
