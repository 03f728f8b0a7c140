//! Reminder offsets and trigger times.
//!
//! A reminder fires a fixed offset before its task's due date. Offsets are
//! written the way people say them: `30 minutes before`, `1 hour before`,
//! `2 days before`. The trigger time must lie strictly in the future when the
//! reminder is scheduled.
//!
//! Validation separates two failures on purpose:
//!
//! - [`ReminderError::InvalidOffset`] and [`ReminderError::MissingDueDate`]
//!   mean the request itself is malformed and must be rejected.
//! - [`ReminderError::InPast`] means the request is well formed but too late;
//!   callers may still create the task without a reminder.
//!
//! Delivery is not handled here. A computed [`ReminderJob`] is handed to a
//! [`JobScheduler`], which wakes the notification side at `reminder_time`.

use crate::libs::task::{Task, ValidationError};
use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_DELIVERY_METHOD: &str = "webhook";

static MINUTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*minutes?\s+before").expect("valid minutes regex"));
static HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*hours?\s+before").expect("valid hours regex"));
static DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*days?\s+before").expect("valid days regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReminderError {
    #[error("Invalid reminder offset '{0}'. Use a format like '1 hour before', '30 minutes before', or '1 day before'")]
    InvalidOffset(String),
    #[error("A reminder needs a due date to count back from")]
    MissingDueDate,
    #[error("Reminder time ({0}) is in the past. Due date might be too soon or offset too large")]
    InPast(String),
}

impl ReminderError {
    /// Whether the task can still be created, just without this reminder.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReminderError::InPast(_))
    }
}

/// Parses `<N> minute(s)|hour(s)|day(s) before`, case-insensitively.
pub fn parse_offset(offset: &str) -> Option<Duration> {
    let offset = offset.trim().to_lowercase();
    if offset.is_empty() {
        return None;
    }

    let units: [(&Lazy<Regex>, fn(i64) -> Option<Duration>); 3] =
        [(&MINUTES_RE, Duration::try_minutes), (&HOURS_RE, Duration::try_hours), (&DAYS_RE, Duration::try_days)];

    for (re, to_duration) in units {
        if let Some(caps) = re.captures(&offset) {
            let amount = caps[1].parse::<i64>().ok()?;
            return to_duration(amount);
        }
    }
    None
}

/// `due - offset`, or `None` if that leaves the representable range.
pub fn reminder_time(due: DateTime<FixedOffset>, offset: Duration) -> Option<DateTime<FixedOffset>> {
    due.checked_sub_signed(offset)
}

/// Parses `offset` and checks the resulting trigger time is after `now`.
pub fn validate_offset(offset: &str, due: DateTime<FixedOffset>, now: DateTime<Utc>) -> Result<(Duration, DateTime<FixedOffset>), ReminderError> {
    let duration = parse_offset(offset).ok_or_else(|| ReminderError::InvalidOffset(offset.to_string()))?;
    let trigger = reminder_time(due, duration).ok_or_else(|| ReminderError::InvalidOffset(offset.to_string()))?;

    if trigger <= now {
        return Err(ReminderError::InPast(trigger.to_rfc3339()));
    }
    Ok((duration, trigger))
}

/// Rejects due dates before `now` unless `allow_past` is set.
pub fn validate_due_date(due: &DateTime<FixedOffset>, now: DateTime<Utc>, allow_past: bool) -> Result<(), ValidationError> {
    if !allow_past && *due < now {
        return Err(ValidationError::DueDateInPast(due.to_rfc3339()));
    }
    Ok(())
}

/// A validated reminder request, not yet attached to a stored task.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderPlan {
    pub offset_text: String,
    pub offset: Duration,
    pub reminder_time: DateTime<FixedOffset>,
}

/// Validates an optional reminder request against an optional due date.
///
/// The due date check happens before any parsing or arithmetic.
pub fn plan_reminder(due: Option<DateTime<FixedOffset>>, offset: Option<&str>, now: DateTime<Utc>) -> Result<Option<ReminderPlan>, ReminderError> {
    let offset_text = match offset.map(str::trim).filter(|o| !o.is_empty()) {
        Some(text) => text,
        None => return Ok(None),
    };
    let due = due.ok_or(ReminderError::MissingDueDate)?;

    let (offset, reminder_time) = validate_offset(offset_text, due, now)?;
    Ok(Some(ReminderPlan {
        offset_text: offset_text.to_string(),
        offset,
        reminder_time,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(ReminderStatus::Pending),
            "sent" => Ok(ReminderStatus::Sent),
            "failed" => Ok(ReminderStatus::Failed),
            other => anyhow::bail!("unknown reminder status '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: String,
    pub reminder_time: DateTime<FixedOffset>,
    pub status: ReminderStatus,
    pub delivery_method: String,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Reminder {
    pub fn pending(task: &Task, plan: &ReminderPlan, delivery_method: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task.id,
            user_id: task.user_id.clone(),
            reminder_time: plan.reminder_time,
            status: ReminderStatus::Pending,
            delivery_method: delivery_method.to_string(),
            retry_count: 0,
            created_at: Utc::now(),
            sent_at: None,
        }
    }
}

/// Payload handed to the scheduled-job service; it comes back verbatim when the job fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderJob {
    pub reminder_id: Uuid,
    pub task_id: Uuid,
    pub user_id: String,
    pub task_title: String,
    pub due_date: String,
    pub reminder_offset: String,
    pub reminder_time: String,
}

impl ReminderJob {
    pub fn new(reminder: &Reminder, task: &Task, plan: &ReminderPlan) -> Self {
        Self {
            reminder_id: reminder.id,
            task_id: task.id,
            user_id: task.user_id.clone(),
            task_title: task.title.clone(),
            due_date: task.due_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            reminder_offset: plan.offset_text.clone(),
            reminder_time: reminder.reminder_time.to_rfc3339(),
        }
    }

    pub fn name(&self) -> String {
        format!("reminder-{}", self.reminder_id)
    }
}

/// Wall-clock trigger service that calls the notification side back at `due_time`.
#[allow(async_fn_in_trait)]
pub trait JobScheduler {
    async fn schedule(&self, job: &ReminderJob, due_time: DateTime<FixedOffset>) -> Result<()>;
}

/// Used when no trigger service is configured; the reminder row stays pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl JobScheduler for NoopScheduler {
    async fn schedule(&self, job: &ReminderJob, due_time: DateTime<FixedOffset>) -> Result<()> {
        tracing::debug!(job = %job.name(), due_time = %due_time, "no job scheduler configured, reminder left pending");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn utc(value: &str) -> DateTime<Utc> {
        at(value).with_timezone(&Utc)
    }

    #[test]
    fn test_parse_offset_units() {
        assert_eq!(parse_offset("1 hour before"), Some(Duration::hours(1)));
        assert_eq!(parse_offset("30 minutes before"), Some(Duration::minutes(30)));
        assert_eq!(parse_offset("2 days before"), Some(Duration::days(2)));
        assert_eq!(parse_offset("1 minute before"), Some(Duration::minutes(1)));
        assert_eq!(parse_offset("1 day before"), Some(Duration::days(1)));
        assert_eq!(parse_offset("Remind me 3 HOURS BEFORE the call"), Some(Duration::hours(3)));
    }

    #[test]
    fn test_parse_offset_rejects_other_text() {
        for invalid in ["not a valid offset", "1 hour after", "abc minutes before", "", "just minutes", "1 week before"] {
            assert_eq!(parse_offset(invalid), None, "'{invalid}' should not parse");
        }
    }

    #[test]
    fn test_reminder_time_round_trip() {
        let due = at("2026-01-08T15:00:00Z");
        for offset in [Duration::minutes(30), Duration::hours(1), Duration::days(2)] {
            let trigger = reminder_time(due, offset).unwrap();
            assert_eq!(trigger + offset, due);
        }
    }

    #[test]
    fn test_validate_offset_scenario() {
        let due = at("2026-01-08T15:00:00Z");

        let (_, trigger) = validate_offset("1 hour before", due, utc("2026-01-08T10:00:00Z")).unwrap();
        assert_eq!(trigger, at("2026-01-08T14:00:00Z"));

        let err = validate_offset("1 hour before", due, utc("2026-01-08T14:30:00Z")).unwrap_err();
        assert!(matches!(err, ReminderError::InPast(_)));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("past"));

        // The trigger must be strictly after now.
        let err = validate_offset("1 hour before", due, utc("2026-01-08T14:00:00Z")).unwrap_err();
        assert!(matches!(err, ReminderError::InPast(_)));
    }

    #[test]
    fn test_validate_offset_invalid_format() {
        let err = validate_offset("soonish", at("2026-01-08T15:00:00Z"), utc("2026-01-01T00:00:00Z")).unwrap_err();
        assert!(matches!(err, ReminderError::InvalidOffset(_)));
        assert!(!err.is_recoverable());
        assert!(err.to_string().to_lowercase().contains("invalid"));
    }

    #[test]
    fn test_plan_requires_due_date_first() {
        // Even a malformed offset is reported as a missing due date.
        assert_eq!(plan_reminder(None, Some("garbage"), Utc::now()), Err(ReminderError::MissingDueDate));
        assert_eq!(plan_reminder(None, Some("1 hour before"), Utc::now()), Err(ReminderError::MissingDueDate));
        assert_eq!(plan_reminder(None, None, Utc::now()), Ok(None));
        assert_eq!(plan_reminder(Some(at("2026-01-08T15:00:00Z")), Some("  "), Utc::now()), Ok(None));
    }

    #[test]
    fn test_plan_reminder_success() {
        let plan = plan_reminder(Some(at("2026-01-10T15:00:00+01:00")), Some("30 minutes before"), utc("2026-01-01T00:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(plan.offset, Duration::minutes(30));
        assert_eq!(plan.reminder_time.to_rfc3339(), "2026-01-10T14:30:00+01:00");
        assert_eq!(plan.offset_text, "30 minutes before");
    }

    #[test]
    fn test_validate_due_date() {
        let now = utc("2026-01-07T12:00:00Z");
        assert!(validate_due_date(&at("2026-01-08T09:00:00Z"), now, false).is_ok());
        assert!(matches!(validate_due_date(&at("2026-01-06T09:00:00Z"), now, false), Err(ValidationError::DueDateInPast(_))));
        assert!(validate_due_date(&at("2026-01-06T09:00:00Z"), now, true).is_ok());
    }

    #[test]
    fn test_reminder_job_payload() {
        let due = at("2026-01-10T15:00:00Z");
        let task = Task::new("user123", "Review presentation").with_due_date(Some(due));
        let plan = plan_reminder(Some(due), Some("1 hour before"), utc("2026-01-01T00:00:00Z")).unwrap().unwrap();
        let reminder = Reminder::pending(&task, &plan, DEFAULT_DELIVERY_METHOD);
        let job = ReminderJob::new(&reminder, &task, &plan);

        assert_eq!(job.task_id, task.id);
        assert_eq!(job.user_id, "user123");
        assert_eq!(job.task_title, "Review presentation");
        assert_eq!(job.due_date, "2026-01-10T15:00:00+00:00");
        assert_eq!(job.reminder_time, "2026-01-10T14:00:00+00:00");
        assert_eq!(job.name(), format!("reminder-{}", reminder.id));
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.retry_count, 0);
    }
}
