//! Reminder rows.
//!
//! The core writes a reminder once, as `pending`, in the same transaction as
//! its task. Status changes after that belong to the delivery service.

use super::db::{fixed_column, opt_utc_column, parsed_column, utc_column, uuid_column};
use crate::libs::reminder::Reminder;
use anyhow::Result;
use once_cell::sync::Lazy;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

pub mod col {
    pub const ID: &str = "id";
    pub const TASK_ID: &str = "task_id";
    pub const USER_ID: &str = "user_id";
    pub const REMINDER_TIME: &str = "reminder_time";
    pub const REMINDER_TS: &str = "reminder_ts";
    pub const STATUS: &str = "status";
    pub const DELIVERY_METHOD: &str = "delivery_method";
    pub const RETRY_COUNT: &str = "retry_count";
    pub const CREATED_AT: &str = "created_at";
    pub const SENT_AT: &str = "sent_at";
}

const COLUMNS: [&str; 10] = [
    col::ID,
    col::TASK_ID,
    col::USER_ID,
    col::REMINDER_TIME,
    col::REMINDER_TS,
    col::STATUS,
    col::DELIVERY_METHOD,
    col::RETRY_COUNT,
    col::CREATED_AT,
    col::SENT_AT,
];

static SELECT_REMINDERS: Lazy<String> = Lazy::new(|| format!("SELECT {} FROM reminders", COLUMNS.join(", ")));
static INSERT_REMINDER: Lazy<String> = Lazy::new(|| {
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("?{}", i)).collect();
    format!("INSERT INTO reminders ({}) VALUES ({})", COLUMNS.join(", "), placeholders.join(", "))
});

fn reminder_from_row(row: &Row) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: uuid_column(row, col::ID)?,
        task_id: uuid_column(row, col::TASK_ID)?,
        user_id: row.get(col::USER_ID)?,
        reminder_time: fixed_column(row, col::REMINDER_TIME)?,
        status: parsed_column(row, col::STATUS)?,
        delivery_method: row.get(col::DELIVERY_METHOD)?,
        retry_count: row.get(col::RETRY_COUNT)?,
        created_at: utc_column(row, col::CREATED_AT)?,
        sent_at: opt_utc_column(row, col::SENT_AT)?,
    })
}

#[derive(Debug, Clone)]
pub enum ReminderFilter {
    /// Every reminder not yet delivered
    Pending,
    /// Undelivered reminders of one user
    PendingByUser(String),
    /// All reminders of one task, whatever their status
    ByTask(Uuid),
}

pub struct Reminders<'c> {
    conn: &'c Connection,
}

impl<'c> Reminders<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Reminders { conn }
    }

    pub fn insert(&self, reminder: &Reminder) -> Result<()> {
        self.conn.execute(
            INSERT_REMINDER.as_str(),
            params![
                reminder.id.to_string(),
                reminder.task_id.to_string(),
                reminder.user_id,
                reminder.reminder_time.to_rfc3339(),
                reminder.reminder_time.timestamp(),
                reminder.status.as_str(),
                reminder.delivery_method,
                reminder.retry_count,
                reminder.created_at.to_rfc3339(),
                reminder.sent_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    /// Reminders matching `filter`, soonest first.
    pub fn fetch(&self, filter: ReminderFilter) -> Result<Vec<Reminder>> {
        let (condition, params): (&str, Vec<String>) = match filter {
            ReminderFilter::Pending => ("WHERE status = 'pending'", vec![]),
            ReminderFilter::PendingByUser(user_id) => ("WHERE status = 'pending' AND user_id = ?1", vec![user_id]),
            ReminderFilter::ByTask(task_id) => ("WHERE task_id = ?1", vec![task_id.to_string()]),
        };
        let sql = format!("{} {} ORDER BY {}", SELECT_REMINDERS.as_str(), condition, col::REMINDER_TS);
        let mut stmt = self.conn.prepare(&sql)?;
        let reminders = stmt
            .query_map(params_from_iter(params.iter()), reminder_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reminders)
    }
}
