//! SQLite persistence for tasks, recurrence rules and reminders.
//!
//! ```rust,no_run
//! use rekur::db::store::SqliteStore;
//! use rekur::libs::task::{Task, TaskFilter};
//!
//! let mut store = SqliteStore::new()?;
//! let task = Task::new("user-1", "Review pull requests");
//! store.create_task(&task, None, None)?;
//! let open = store.tasks().fetch(TaskFilter::Open)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection setup and column conversion helpers.
pub mod db;

/// Versioned schema changes, applied on every open.
pub mod migrations;

pub mod recurrence_rules;

pub mod reminders;

/// The [`TaskStore`](crate::libs::store::TaskStore) implementation.
pub mod store;

pub mod tasks;
