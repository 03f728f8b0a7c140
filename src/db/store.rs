//! The SQLite implementation of [`TaskStore`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rekur::db::store::SqliteStore;
//! use rekur::libs::task::{Task, TaskFilter};
//!
//! let mut store = SqliteStore::new()?;
//! store.create_task(&Task::new("default", "Buy milk"), None, None)?;
//! let open = store.tasks().fetch(TaskFilter::Open)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::db::Db;
use super::recurrence_rules::RecurrenceRules;
use super::reminders::Reminders;
use super::tasks::Tasks;
use crate::libs::recurrence::RecurrenceRule;
use crate::libs::reminder::Reminder;
use crate::libs::store::{InsertOutcome, TaskStore};
use crate::libs::task::Task;
use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed store: one connection shared by the task, rule and reminder tables.
pub struct SqliteStore {
    db: Db,
}

impl SqliteStore {
    pub fn new() -> Result<Self> {
        Ok(Self { db: Db::new()? })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { db: Db::open(path)? })
    }

    pub fn conn(&self) -> &Connection {
        &self.db.conn
    }

    pub fn tasks(&self) -> Tasks<'_> {
        Tasks::new(&self.db.conn)
    }

    pub fn rules(&self) -> RecurrenceRules<'_> {
        RecurrenceRules::new(&self.db.conn)
    }

    pub fn reminders(&self) -> Reminders<'_> {
        Reminders::new(&self.db.conn)
    }

    /// Writes a user-created task together with its rule and reminder, all or nothing.
    ///
    /// # Arguments
    ///
    /// * `task` - The new task, pointing at `rule` when it recurs
    /// * `rule` - Recurrence rule created with the task
    /// * `reminder` - Pending reminder for the task
    ///
    /// # Errors
    ///
    /// Any failed write rolls the whole transaction back, including an open
    /// instance that already exists for the same rule and due date.
    pub fn create_task(&mut self, task: &Task, rule: Option<&RecurrenceRule>, reminder: Option<&Reminder>) -> Result<()> {
        let tx = self.db.conn.transaction()?;

        if let Some(rule) = rule {
            RecurrenceRules::new(&tx).insert(rule)?;
        }
        if Tasks::new(&tx).insert(task)? == InsertOutcome::Duplicate {
            bail!("an open task for this recurrence and due date already exists");
        }
        if let Some(reminder) = reminder {
            Reminders::new(&tx).insert(reminder)?;
        }

        tx.commit()?;
        tracing::debug!(task_id = %task.id, with_rule = rule.is_some(), with_reminder = reminder.is_some(), "task stored");

        Ok(())
    }
}

impl TaskStore for SqliteStore {
    fn find_rule(&mut self, rule_id: &Uuid) -> Result<Option<RecurrenceRule>> {
        self.rules().get_by_id(rule_id)
    }

    fn find_open_instance(&mut self, rule_id: &Uuid, due_date: &DateTime<FixedOffset>) -> Result<Option<Task>> {
        self.tasks().find_open_instance(rule_id, due_date)
    }

    fn insert_instance(&mut self, task: &Task) -> Result<InsertOutcome> {
        self.tasks().insert(task)
    }
}
