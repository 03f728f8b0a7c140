//! Task rows.
//!
//! Due dates are stored twice: `due_date` keeps the RFC 3339 text in the
//! offset the user gave, `due_ts` holds the instant as unix milliseconds, which
//! equality checks and the open-instance unique index use.
//!
//! ## Features
//!
//! - **Duplicate-aware inserts**: a second open instance of a rule and due date
//!   is reported as [`InsertOutcome::Duplicate`] instead of an error
//! - **Instance lookup**: find the open instance of a rule at an exact instant
//! - **Filtered listing**: all, open, per user, ordered by due date with undated tasks last
//! - **Short ids**: resolve a task from the first characters of its id

use super::db::{json_column, opt_fixed_column, opt_uuid_column, parsed_column, utc_column, uuid_column};
use crate::libs::store::InsertOutcome;
use crate::libs::task::{Task, TaskFilter};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

pub mod col {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const COMPLETED: &str = "completed";
    pub const PRIORITY: &str = "priority";
    pub const TAGS: &str = "tags";
    pub const DUE_DATE: &str = "due_date";
    pub const DUE_TS: &str = "due_ts";
    pub const RECURRENCE_ID: &str = "recurrence_id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

const COLUMNS: [&str; 12] = [
    col::ID,
    col::USER_ID,
    col::TITLE,
    col::DESCRIPTION,
    col::COMPLETED,
    col::PRIORITY,
    col::TAGS,
    col::DUE_DATE,
    col::DUE_TS,
    col::RECURRENCE_ID,
    col::CREATED_AT,
    col::UPDATED_AT,
];

static SELECT_TASKS: Lazy<String> = Lazy::new(|| format!("SELECT {} FROM tasks", COLUMNS.join(", ")));
static INSERT_TASK: Lazy<String> = Lazy::new(|| {
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("?{}", i)).collect();
    format!("INSERT INTO tasks ({}) VALUES ({})", COLUMNS.join(", "), placeholders.join(", "))
});
const ORDER_BY_DUE: &str = "ORDER BY due_ts IS NULL, due_ts, created_at";

/// Maps a row selected with [`SELECT_TASKS`].
fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: uuid_column(row, col::ID)?,
        user_id: row.get(col::USER_ID)?,
        title: row.get(col::TITLE)?,
        description: row.get(col::DESCRIPTION)?,
        completed: row.get(col::COMPLETED)?,
        priority: parsed_column(row, col::PRIORITY)?,
        tags: json_column(row, col::TAGS)?,
        due_date: opt_fixed_column(row, col::DUE_DATE)?,
        recurrence_id: opt_uuid_column(row, col::RECURRENCE_ID)?,
        created_at: utc_column(row, col::CREATED_AT)?,
        updated_at: utc_column(row, col::UPDATED_AT)?,
    })
}

/// True when `err` is the open-instance unique index rejecting a row.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Task table access over a borrowed connection or transaction.
pub struct Tasks<'c> {
    conn: &'c Connection,
}

impl<'c> Tasks<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Tasks { conn }
    }

    /// Inserts a task row.
    ///
    /// # Arguments
    ///
    /// * `task` - The task to write, with its id already assigned
    ///
    /// # Returns
    ///
    /// [`InsertOutcome::Inserted`] on success, or [`InsertOutcome::Duplicate`]
    /// when an open instance of the same rule and due date already exists.
    /// Any other database failure is an error.
    pub fn insert(&self, task: &Task) -> Result<InsertOutcome> {
        let tags = serde_json::to_string(&task.tags)?;
        let result = self.conn.execute(
            INSERT_TASK.as_str(),
            params![
                task.id.to_string(),
                task.user_id,
                task.title,
                task.description,
                task.completed,
                task.priority.as_str(),
                tags,
                task.due_date.map(|d| d.to_rfc3339()),
                task.due_date.map(|d| d.timestamp_millis()),
                task.recurrence_id.map(|id| id.to_string()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_id(&self, id: &Uuid) -> Result<Option<Task>> {
        let sql = format!("{} WHERE {} = ?1", SELECT_TASKS.as_str(), col::ID);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id.to_string()], task_from_row)?;

        Ok(rows.next().transpose()?)
    }

    /// Tasks whose id starts with `prefix`, so the CLI can accept short ids.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Task>> {
        let sql = format!("{} WHERE {} LIKE ?1 || '%' {}", SELECT_TASKS.as_str(), col::ID, ORDER_BY_DUE);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![prefix.to_lowercase()], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    /// Tasks matching `filter`, soonest due first, undated tasks last.
    ///
    /// # Arguments
    ///
    /// * `filter` - Which tasks to return, see [`TaskFilter`]
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use rekur::db::store::SqliteStore;
    /// use rekur::libs::task::TaskFilter;
    ///
    /// let store = SqliteStore::new()?;
    /// let open = store.tasks().fetch(TaskFilter::OpenByUser("default".to_string()))?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn fetch(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let (condition, params): (&str, Vec<String>) = match filter {
            TaskFilter::All => ("", vec![]),
            TaskFilter::Open => ("WHERE completed = 0", vec![]),
            TaskFilter::ByUser(user_id) => ("WHERE user_id = ?1", vec![user_id]),
            TaskFilter::OpenByUser(user_id) => ("WHERE completed = 0 AND user_id = ?1", vec![user_id]),
        };
        let sql = format!("{} {} {}", SELECT_TASKS.as_str(), condition, ORDER_BY_DUE);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_from_iter(params.iter()), task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    /// The uncompleted task of `rule_id` due at `due_date`, if any.
    ///
    /// Dates are compared as instants, so `09:00Z` and `11:00+02:00` match.
    ///
    /// # Arguments
    ///
    /// * `rule_id` - Recurrence rule the instance belongs to
    /// * `due_date` - Due instant of the instance
    pub fn find_open_instance(&self, rule_id: &Uuid, due_date: &DateTime<FixedOffset>) -> Result<Option<Task>> {
        let sql = format!(
            "{} WHERE {} = ?1 AND {} = ?2 AND {} = 0 LIMIT 1",
            SELECT_TASKS.as_str(),
            col::RECURRENCE_ID,
            col::DUE_TS,
            col::COMPLETED
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![rule_id.to_string(), due_date.timestamp_millis()], task_from_row)?;

        Ok(rows.next().transpose()?)
    }

    /// Marks an open task completed. Returns false when it was already
    /// completed or does not exist.
    pub fn complete(&self, id: &Uuid, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE tasks SET completed = 1, updated_at = ?2 WHERE id = ?1 AND completed = 0",
            params![id.to_string(), at.to_rfc3339()],
        )?;

        Ok(affected > 0)
    }

    /// Number of uncompleted tasks attached to `rule_id`.
    pub fn count_open_instances(&self, rule_id: &Uuid) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE recurrence_id = ?1 AND completed = 0",
            params![rule_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }
}
