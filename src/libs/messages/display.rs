//! Display implementation for rekur application messages.
//!
//! All user-facing text lives here so commands only deal with `Message`
//! variants and their parameters.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let s = match self {
            // === TASK MESSAGES ===
            Message::TaskCreated(id) => format!("Task created: {}", id),
            Message::TaskCompleted(id) => format!("Task {} completed", id),
            Message::TaskAlreadyCompleted(id) => format!("Task {} is already completed", id),
            Message::TaskNotFound(id) => format!("Task {} not found", id),
            Message::TaskNotFoundForPrefix(prefix) => format!("No task id starts with '{}'", prefix),
            Message::TaskPrefixAmbiguous(prefix) => format!("More than one task id starts with '{}', use a longer prefix", prefix),
            Message::TasksNotFound => "Tasks not found".to_string(),
            Message::TasksHeader => "Tasks:".to_string(),
            Message::RecurrenceAttached(rule) => format!("Repeats {}", rule),

            // === MATERIALIZATION MESSAGES ===
            Message::NextInstanceCreated(id, due) => format!("Next instance {} created, due {}", id, due),
            Message::NextInstanceExists(due) => format!("Next instance due {} already exists", due),
            Message::NextInstanceSkipped(reason) => format!("Next instance not created: {}", reason),
            Message::EventsConsumed(processed, created) => format!("Processed {} events, created {} task instances", processed, created),
            Message::EventParseFailed(line, error) => format!("Skipping event on line {}: {}", line, error),
            Message::EventSourceEmpty => "No events to process".to_string(),
            Message::EventPublishFailed(event_type, error) => format!("Failed to publish {}: {}", event_type, error),

            // === REMINDER MESSAGES ===
            Message::ReminderScheduled(time) => format!("Reminder scheduled for {}", time),
            Message::ReminderDropped(reason) => format!("Reminder not scheduled: {}", reason),
            Message::ReminderJobFailed(error) => format!("Failed to schedule reminder job: {}", error),
            Message::RemindersNotFound => "Reminders not found".to_string(),
            Message::RemindersHeader => "Reminders:".to_string(),

            // === OCCURRENCE PREVIEW ===
            Message::OccurrencesHeader(rule) => format!("Next occurrences ({}):", rule),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration file deleted".to_string(),
            Message::ConfigNotFound => "Configuration file not found, using defaults".to_string(),
            Message::ConfigPath(path) => format!("Configuration file: {}", path),
            Message::ConfigEndpoint(endpoint) => format!("Events and reminder jobs go to {}", endpoint),
            Message::ConfigLocalOnly => "No sidecar configured, next instances are created locally".to_string(),

            // === INPUT ERRORS ===
            Message::InvalidDate(value) => format!(
                "Invalid date '{}', expected RFC 3339, 'YYYY-MM-DD [HH:MM]', 'in 2 days' or 'tomorrow at 5pm'",
                value
            ),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("✓ Migration v{} completed", version),
            Message::MigrationFailed(version, error) => format!("✗ Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DbUpToDate => "Database is up to date".to_string(),
            Message::DbNeedsUpdate => "Database needs migration, it is applied on next use".to_string(),
            Message::DbVersion(version) => format!("Current database version: {}", version),
            Message::MigrationHistory => "Migration history:".to_string(),
            Message::NothingToRollback => "Nothing to rollback".to_string(),
            Message::RollingBack(from, to) => format!("Rolling back from v{} to v{}", from, to),
            Message::RollbackCompleted(version) => format!("Rollback to v{} completed", version),
        };
        write!(f, "{}", s)
    }
}
