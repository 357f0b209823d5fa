//! Taskboard CLI client

mod client;
mod messages;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use client::TaskboardClient;
use messages::{AnnouncementKind, TaskAction, TaskFields};

#[derive(Parser)]
#[command(name = "taskboard-cli")]
#[command(about = "CLI client for the Taskboard server")]
#[command(version)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "TASKBOARD_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Your user id
    #[arg(short, long, env = "TASKBOARD_USER")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,
    },

    /// List your tasks
    Tasks,

    /// Create a task for yourself
    Create {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Mark a task completed
    Complete { task: Uuid },

    /// Move a task back to pending
    Reopen { task: Uuid },

    /// Submit a completed task for review
    Submit { task: Uuid },

    /// List announcements
    Announcements,

    /// Administrator commands
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List all users
    Users,

    /// List every task with its assignee
    Tasks,

    /// Create a task on behalf of a user
    Assign {
        /// Assignee user id
        #[arg(long = "to")]
        user_id: Uuid,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Approve a submitted task
    Approve {
        task: Uuid,

        /// Email the approval is recorded under; must be your own
        #[arg(long)]
        email: Option<String>,
    },

    /// Reject a submitted task
    Reject { task: Uuid },

    /// Delete a task
    Delete { task: Uuid },

    /// Delete approved tasks older than the retention window
    Purge,

    /// Post an announcement
    Announce {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        #[arg(short, long, value_enum, default_value = "info")]
        kind: KindArg,
    },

    /// Show task and user counts
    Analytics,
}

#[derive(clap::Args)]
struct FieldArgs {
    #[arg(short, long)]
    title: String,

    #[arg(short, long)]
    description: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due: Option<NaiveDate>,
}

impl From<FieldArgs> for TaskFields {
    fn from(args: FieldArgs) -> Self {
        TaskFields {
            title: args.title,
            description: args.description,
            due_date: args.due,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Info,
    Warning,
    Success,
}

impl From<KindArg> for AnnouncementKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Info => AnnouncementKind::Info,
            KindArg::Warning => AnnouncementKind::Warning,
            KindArg::Success => AnnouncementKind::Success,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let client = TaskboardClient::new(cli.server, cli.user);

    match cli.command {
        Commands::Register { name, email } => print(&client.register(&name, &email).await?),
        Commands::Tasks => print(&client.list_tasks().await?),
        Commands::Create { fields } => print(&client.create_task(&fields.into()).await?),
        Commands::Complete { task } => {
            print(&client.transition(task, TaskAction::Complete).await?)
        }
        Commands::Reopen { task } => print(&client.transition(task, TaskAction::Reopen).await?),
        Commands::Submit { task } => print(&client.transition(task, TaskAction::Submit).await?),
        Commands::Announcements => print(&client.list_announcements().await?),
        Commands::Admin(command) => run_admin(&client, command).await,
    }
}

async fn run_admin(client: &TaskboardClient, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Users => print(&client.list_users().await?),
        AdminCommands::Tasks => print(&client.list_all_tasks().await?),
        AdminCommands::Assign { user_id, fields } => {
            print(&client.assign_task(user_id, fields.into()).await?)
        }
        AdminCommands::Approve { task, email } => print(&client.approve(task, email).await?),
        AdminCommands::Reject { task } => print(&client.reject(task).await?),
        AdminCommands::Delete { task } => {
            client.delete_task(task).await?;
            println!("Deleted task {}", task);
            Ok(())
        }
        AdminCommands::Purge => print(&client.purge().await?),
        AdminCommands::Announce {
            title,
            content,
            kind,
        } => print(&client.announce(&title, &content, kind.into()).await?),
        AdminCommands::Analytics => print(&client.analytics().await?),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
