use super::migrations::init_with_migrations;
use crate::libs::data_storage::DataStorage;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "rekur.db";

/// How long a writer waits for a competing writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database in the application data directory.
    pub fn new() -> Result<Db> {
        let db_file_path = DataStorage::new().get_path(DB_FILE_NAME)?;
        Self::open(db_file_path)
    }

    /// Opens the database at `path` and brings its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        let mut conn = Self::connect(path)?;
        init_with_migrations(&mut conn)?;

        Ok(Db { conn })
    }

    /// Opens a configured connection without touching the schema.
    pub fn connect(path: impl AsRef<Path>) -> Result<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

        Ok(conn)
    }
}

fn conversion_error<E>(column: &str, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    tracing::error!(column, "unreadable column value");
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, err.into())
}

pub(crate) fn uuid_column(row: &Row, column: &str) -> rusqlite::Result<Uuid> {
    let value: String = row.get(column)?;
    Uuid::parse_str(&value).map_err(|e| conversion_error(column, e))
}

pub(crate) fn opt_uuid_column(row: &Row, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let value: Option<String> = row.get(column)?;
    value.map(|v| Uuid::parse_str(&v).map_err(|e| conversion_error(column, e))).transpose()
}

pub(crate) fn fixed_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<FixedOffset>> {
    let value: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&value).map_err(|e| conversion_error(column, e))
}

pub(crate) fn opt_fixed_column(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<FixedOffset>>> {
    let value: Option<String> = row.get(column)?;
    value.map(|v| DateTime::parse_from_rfc3339(&v).map_err(|e| conversion_error(column, e))).transpose()
}

pub(crate) fn utc_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    Ok(fixed_column(row, column)?.with_timezone(&Utc))
}

pub(crate) fn opt_utc_column(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(opt_fixed_column(row, column)?.map(|v| v.with_timezone(&Utc)))
}

/// Reads a text column through the type's `FromStr`.
pub(crate) fn parsed_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let value: String = row.get(column)?;
    value.parse::<T>().map_err(|e| conversion_error(column, e))
}

pub(crate) fn json_column<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let value: String = row.get(column)?;
    serde_json::from_str(&value).map_err(|e| conversion_error(column, e))
}
