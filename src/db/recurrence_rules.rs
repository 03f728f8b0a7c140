//! Recurrence rule rows.
//!
//! A rule is written once, when the first task of a chain is created, and is
//! only read afterwards: every instance of the chain points at it through
//! `tasks.recurrence_id`.

use super::db::{json_column, parsed_column, utc_column, uuid_column};
use crate::libs::recurrence::RecurrenceRule;
use anyhow::Result;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub mod col {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const PATTERN: &str = "pattern";
    pub const INTERVAL: &str = "interval";
    pub const METADATA: &str = "metadata";
    pub const CREATED_AT: &str = "created_at";
}

const COLUMNS: [&str; 6] = [col::ID, col::USER_ID, col::PATTERN, col::INTERVAL, col::METADATA, col::CREATED_AT];

static SELECT_RULES: Lazy<String> = Lazy::new(|| format!("SELECT {} FROM recurrence_rules", COLUMNS.join(", ")));
static INSERT_RULE: Lazy<String> = Lazy::new(|| format!("INSERT INTO recurrence_rules ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)", COLUMNS.join(", ")));

fn rule_from_row(row: &Row) -> rusqlite::Result<RecurrenceRule> {
    Ok(RecurrenceRule {
        id: uuid_column(row, col::ID)?,
        user_id: row.get(col::USER_ID)?,
        pattern: parsed_column(row, col::PATTERN)?,
        interval: row.get(col::INTERVAL)?,
        metadata: json_column(row, col::METADATA)?,
        created_at: utc_column(row, col::CREATED_AT)?,
    })
}

/// Rule table access over a borrowed connection or transaction.
pub struct RecurrenceRules<'c> {
    conn: &'c Connection,
}

impl<'c> RecurrenceRules<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        RecurrenceRules { conn }
    }

    /// Stores a new rule.
    ///
    /// # Arguments
    ///
    /// * `rule` - The rule to write; its metadata is stored as JSON
    ///
    /// # Errors
    ///
    /// Fails when a rule with the same id exists or the pattern or interval
    /// violates the table's checks.
    pub fn insert(&self, rule: &RecurrenceRule) -> Result<()> {
        self.conn.execute(
            INSERT_RULE.as_str(),
            params![
                rule.id.to_string(),
                rule.user_id,
                rule.pattern.as_str(),
                rule.interval,
                serde_json::to_string(&rule.metadata)?,
                rule.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Loads a rule, `None` when it does not exist.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use rekur::db::store::SqliteStore;
    /// use uuid::Uuid;
    ///
    /// let store = SqliteStore::new()?;
    /// if let Some(rule) = store.rules().get_by_id(&Uuid::nil())? {
    ///     println!("repeats {} every {}", rule.pattern, rule.interval);
    /// }
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_by_id(&self, id: &Uuid) -> Result<Option<RecurrenceRule>> {
        let sql = format!("{} WHERE {} = ?1", SELECT_RULES.as_str(), col::ID);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id.to_string()], rule_from_row)?;

        Ok(rows.next().transpose()?)
    }
}
