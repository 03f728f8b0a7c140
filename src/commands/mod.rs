pub mod add;
pub mod complete;
pub mod consume;
pub mod init;
pub mod list;
pub mod migrations;
pub mod next;
pub mod reminders;

use crate::api::Transport;
use crate::db::store::SqliteStore;
use crate::libs::config::Config;
use crate::libs::service::TaskService;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Write or delete the configuration file")]
    Init(init::InitArgs),
    #[command(about = "Create a task, optionally recurring and with a reminder")]
    Add(add::AddArgs),
    #[command(about = "List tasks")]
    List(list::ListArgs),
    #[command(about = "Complete a task and create its next instance")]
    Complete(complete::CompleteArgs),
    #[command(about = "Run task events through the next-instance materializer")]
    Consume(consume::ConsumeArgs),
    #[command(about = "Preview the next occurrences of a recurrence")]
    Next(next::NextArgs),
    #[command(about = "List pending reminders")]
    Reminders(reminders::RemindersArgs),
    #[command(about = "Show database schema version and history")]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Add(args) => add::cmd(args).await,
            Commands::List(args) => list::cmd(args),
            Commands::Complete(args) => complete::cmd(args).await,
            Commands::Consume(args) => consume::cmd(args).await,
            Commands::Next(args) => next::cmd(args),
            Commands::Reminders(args) => reminders::cmd(args),
            Commands::Migrations(args) => migrations::cmd(args),
        }
    }
}

/// The task service wired to the configured store and transport.
pub(crate) fn service(config: &Config) -> Result<TaskService<Transport, Transport>> {
    let transport = Transport::from_config(config)?;
    let local = transport.is_local();

    Ok(TaskService::new(SqliteStore::new()?, transport.clone(), transport, config.reminders()).materialize_locally(local))
}
