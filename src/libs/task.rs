use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" | "medium" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "critical" | "urgent" => Ok(Priority::Critical),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Task-level input problems, reported back to whoever asked for the task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task title must not be empty")]
    EmptyTitle,
    #[error("Task title must be at most {max} characters, got {0}", max = TITLE_MAX_LEN)]
    TitleTooLong(usize),
    #[error("Task description must be at most {max} characters, got {0}", max = DESCRIPTION_MAX_LEN)]
    DescriptionTooLong(usize),
    #[error("Unknown priority '{0}'. Use low, normal, high or critical")]
    UnknownPriority(String),
    #[error("Recurring tasks need a due date to anchor the next occurrence")]
    RecurrenceWithoutDueDate,
    #[error("Due date {0} is in the past")]
    DueDateInPast(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub recurrence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(user_id: &str, title: &str) -> Self {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: None,
            completed: false,
            priority: Priority::default(),
            tags: Vec::new(),
            due_date: None,
            recurrence_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_due_date(mut self, due_date: Option<DateTime<FixedOffset>>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_recurrence(mut self, recurrence_id: Option<Uuid>) -> Self {
        self.recurrence_id = recurrence_id;
        self
    }

    /// Checks the length limits of user supplied text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            return Err(ValidationError::EmptyTitle);
        }
        if title_len > TITLE_MAX_LEN {
            return Err(ValidationError::TitleTooLong(title_len));
        }
        if let Some(description) = &self.description {
            let len = description.chars().count();
            if len > DESCRIPTION_MAX_LEN {
                return Err(ValidationError::DescriptionTooLong(len));
            }
        }
        Ok(())
    }

    /// The next instance in a recurring chain: same attributes, new identity,
    /// new due date, not completed.
    pub fn next_instance(&self, due_date: DateTime<FixedOffset>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            completed: false,
            due_date: Some(due_date),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Lowercases, trims and deduplicates tags while keeping their order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[derive(Debug, Clone)]
pub enum TaskFilter {
    All,
    Open,
    ByUser(String),
    OpenByUser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Normal);
        assert!(matches!("soon".parse::<Priority>(), Err(ValidationError::UnknownPriority(_))));
    }

    #[test]
    fn test_validate_title_limits() {
        assert_eq!(Task::new("u", "   ").validate(), Err(ValidationError::EmptyTitle));
        let long = "x".repeat(TITLE_MAX_LEN + 1);
        assert_eq!(Task::new("u", &long).validate(), Err(ValidationError::TitleTooLong(TITLE_MAX_LEN + 1)));
        assert!(Task::new("u", "Water the plants").validate().is_ok());
    }

    #[test]
    fn test_next_instance_carries_attributes() {
        let due = DateTime::parse_from_rfc3339("2026-01-07T09:00:00+02:00").unwrap();
        let next_due = DateTime::parse_from_rfc3339("2026-01-08T09:00:00+02:00").unwrap();
        let mut task = Task::new("user-1", "Standup")
            .with_description(Some("Team sync".to_string()))
            .with_priority(Priority::High)
            .with_tags(vec!["Work".to_string(), "work".to_string(), "meetings".to_string()])
            .with_due_date(Some(due))
            .with_recurrence(Some(Uuid::new_v4()));
        task.completed = true;

        let next = task.next_instance(next_due);
        assert_ne!(next.id, task.id);
        assert!(!next.completed);
        assert_eq!(next.due_date, Some(next_due));
        assert_eq!(next.title, "Standup");
        assert_eq!(next.priority, Priority::High);
        assert_eq!(next.tags, vec!["work".to_string(), "meetings".to_string()]);
        assert_eq!(next.recurrence_id, task.recurrence_id);
        assert_eq!(next.user_id, "user-1");
    }
}
