//! Core library modules for rekur.
//!
//! The domain logic (recurrence, reminders, materialization) has no I/O of its
//! own. Persistence lives in [`crate::db`], the sidecar client in
//! [`crate::api`].
//!
//! ```rust,no_run
//! use rekur::libs::recurrence::{next_occurrence, Pattern};
//! use chrono::DateTime;
//!
//! let due = DateTime::parse_from_rfc3339("2026-01-31T09:00:00Z")?;
//! let next = next_occurrence(Pattern::Monthly, 1, due)?;
//! assert_eq!(next.to_rfc3339(), "2026-02-28T09:00:00+00:00");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod data_storage;
pub mod event;
pub mod formatter;
pub mod materializer;
pub mod messages;
pub mod recurrence;
pub mod reminder;
pub mod service;
pub mod store;
pub mod task;
pub mod view;
