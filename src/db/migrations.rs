//! Versioned schema migrations.
//!
//! Every connection opened through [`Db`](super::db::Db) runs the pending
//! migrations before it is handed out. Applied versions are recorded in the
//! `migrations` table, so running the manager again is a no-op.
//!
//! ```rust,no_run
//! use rekur::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("rekur.db")?;
//! init_with_migrations(&mut conn)?;
//! let version = get_db_version(&conn)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use anyhow::Result;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    /// The full schema history, oldest first. Never edit a registered
    /// migration; add a new version instead.
    fn register_migrations(&mut self) {
        // Version 1: tasks and the recurrence rules they point at
        self.add_migration(1, "create_tasks_and_recurrence_rules", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS recurrence_rules (
                    id TEXT NOT NULL PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    pattern TEXT NOT NULL CHECK (pattern IN ('daily', 'weekly', 'monthly')),
                    interval INTEGER NOT NULL CHECK (interval >= 1),
                    metadata TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id TEXT NOT NULL PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    completed BOOLEAN NOT NULL DEFAULT FALSE,
                    priority TEXT NOT NULL DEFAULT 'normal',
                    tags TEXT NOT NULL DEFAULT '[]',
                    due_date TEXT,
                    due_ts INTEGER,
                    recurrence_id TEXT REFERENCES recurrence_rules(id) ON DELETE SET NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_due_ts ON tasks(due_ts)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_recurrence_rules_user_id ON recurrence_rules(user_id)", [])?;
            Ok(())
        });

        // Version 2: reminders, written once by the core and then owned by the delivery service
        self.add_migration(2, "add_reminders", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS reminders (
                    id TEXT NOT NULL PRIMARY KEY,
                    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                    user_id TEXT NOT NULL,
                    reminder_time TEXT NOT NULL,
                    reminder_ts INTEGER NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'sent', 'failed')),
                    delivery_method TEXT NOT NULL DEFAULT 'webhook',
                    retry_count INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    sent_at TEXT
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_reminders_task_id ON reminders(task_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_reminders_status_ts ON reminders(status, reminder_ts)", [])?;
            Ok(())
        });

        // Version 3: at most one open instance per rule and due date
        self.add_migration(3, "unique_open_recurring_instance", |tx| {
            tx.execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_open_instance
                    ON tasks(recurrence_id, due_ts)
                    WHERE completed = 0 AND recurrence_id IS NOT NULL",
                [],
            )?;
            Ok(())
        });

        // Version 4: due_ts in milliseconds, recomputed from the stored RFC 3339 text
        self.add_migration(4, "due_ts_milliseconds", |tx| {
            tx.execute(
                "UPDATE tasks
                    SET due_ts = CAST(ROUND((julianday(due_date) - 2440587.5) * 86400000.0) AS INTEGER)
                    WHERE due_date IS NOT NULL",
                [],
            )?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the recorded version, in one
    /// immediate transaction so two processes opening a fresh file do not
    /// both apply the same version.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current_version = self.get_current_version(&tx)?;

        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();
        if pending.is_empty() {
            msg_debug!(Message::DbUpToDate);
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            if let Err(e) = (migration.up)(&tx) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
            msg_debug!(Message::MigrationCompleted(migration.version));
        }

        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;

        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> Result<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// Applied migrations as (version, name, applied_at), ordered by version.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }

    /// Forgets migration records newer than `target_version`. Schema changes
    /// are not reversed; debug builds only.
    #[cfg(debug_assertions)]
    pub fn rollback_to(&self, conn: &mut Connection, target_version: u32) -> Result<()> {
        let current_version = self.get_current_version(conn)?;

        if target_version >= current_version {
            crate::msg_info!(Message::NothingToRollback);
            return Ok(());
        }

        crate::msg_info!(Message::RollingBack(current_version, target_version));
        conn.execute("DELETE FROM migrations WHERE version > ?1", params![target_version])?;
        crate::msg_success!(Message::RollbackCompleted(target_version));

        Ok(())
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

/// Current schema version, 0 for a database that was never migrated.
pub fn get_db_version(conn: &Connection) -> Result<u32> {
    conn.execute(MIGRATIONS_TABLE, [])?;
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    Ok(get_db_version(conn)? < manager.latest_version())
}
