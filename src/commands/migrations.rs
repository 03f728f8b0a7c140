use crate::{
    db::{
        db::{Db, DB_FILE_NAME},
        migrations::{get_db_version, needs_migration, MigrationManager},
    },
    libs::{data_storage::DataStorage, messages::Message},
    msg_info, msg_print,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    Status,
    History,
    /// Forget migration records newer than VERSION (debug builds only)
    #[cfg(debug_assertions)]
    Rollback { version: u32 },
}

pub fn cmd(args: MigrationsArgs) -> Result<()> {
    #[allow(unused_mut)]
    let mut conn = Db::connect(DataStorage::new().get_path(DB_FILE_NAME)?)?;

    match args.command {
        MigrationsCommand::Status => {
            let version = get_db_version(&conn)?;

            msg_print!(Message::DbVersion(version));
            if needs_migration(&conn)? {
                msg_info!(Message::DbNeedsUpdate);
            } else {
                msg_info!(Message::DbUpToDate);
            }
        }
        MigrationsCommand::History => {
            let manager = MigrationManager::new();
            let history = manager.get_migration_history(&conn)?;

            msg_print!(Message::MigrationHistory, true);
            for (version, name, applied_at) in history {
                println!("  v{}: {} (applied: {})", version, name, applied_at);
            }
        }
        #[cfg(debug_assertions)]
        MigrationsCommand::Rollback { version } => MigrationManager::new().rollback_to(&mut conn, version)?,
    }

    Ok(())
}
