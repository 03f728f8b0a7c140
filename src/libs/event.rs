//! Task lifecycle events exchanged over the pub/sub transport.
//!
//! Every write to a task is followed by one event on the `task-events` topic.
//! The envelope carries a full snapshot of the task so consumers never need to
//! read it back from the store:
//!
//! ```json
//! {
//!   "event_id": "5b0c…",
//!   "event_type": "task.completed",
//!   "timestamp": "2026-01-07T09:05:00Z",
//!   "user_id": "user-1",
//!   "task_data": { "id": "…", "title": "Standup", "due_date": "2026-01-07T09:00:00Z", "recurrence_id": "…" },
//!   "previous_data": { "completed": false },
//!   "metadata": { "source": "api", "correlation_id": "…" }
//! }
//! ```
//!
//! Transports that wrap the payload (CloudEvents put it under `data`, sometimes
//! as an encoded string) are unwrapped by [`TaskEvent::parse`].

use crate::libs::task::{Priority, Task};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub const TOPIC_TASK_EVENTS: &str = "task-events";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Created,
    Updated,
    Completed,
    Deleted,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Created => "task.created",
            EventType::Updated => "task.updated",
            EventType::Completed => "task.completed",
            EventType::Deleted => "task.deleted",
            EventType::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "task.created" => EventType::Created,
            "task.updated" => EventType::Updated,
            "task.completed" => EventType::Completed,
            "task.deleted" => EventType::Deleted,
            _ => EventType::Other(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task attributes as they travel inside an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub recurrence_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn nullable_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            priority: task.priority,
            tags: task.tags.clone(),
            due_date: task.due_date,
            recurrence_id: task.recurrence_id,
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
        }
    }
}

impl TaskSnapshot {
    /// Rebuilds a task owned by `user_id` from the snapshot.
    pub fn to_task(&self, user_id: &str) -> Task {
        let mut task = Task::new(user_id, &self.title)
            .with_description(self.description.clone())
            .with_priority(self.priority)
            .with_tags(self.tags.clone())
            .with_due_date(self.due_date)
            .with_recurrence(self.recurrence_id);
        task.id = self.id;
        task.completed = self.completed;
        if let Some(created_at) = self.created_at {
            task.created_at = created_at;
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = updated_at;
        }
        task
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub task_data: TaskSnapshot,
    #[serde(default)]
    pub previous_data: Option<Value>,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl TaskEvent {
    pub fn new(event_type: EventType, task: &Task, previous_data: Option<Value>, source: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            user_id: task.user_id.clone(),
            task_data: TaskSnapshot::from(task),
            previous_data,
            metadata: EventMetadata {
                source: source.to_string(),
                correlation_id: Some(Uuid::new_v4()),
            },
        }
    }

    pub fn created(task: &Task, source: &str) -> Self {
        Self::new(EventType::Created, task, None, source)
    }

    pub fn completed(task: &Task, source: &str) -> Self {
        Self::new(EventType::Completed, task, Some(serde_json::json!({ "completed": false })), source)
    }

    /// Parses an envelope, unwrapping a transport `data` field when present.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("event is not valid JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self> {
        if value.get("event_type").is_none() {
            if let Some(data) = value.get_mut("data").map(Value::take) {
                value = match data {
                    Value::String(encoded) => serde_json::from_str(&encoded).context("event data is not valid JSON")?,
                    other => other,
                };
            }
        }
        serde_json::from_value(value).context("event does not match the task event envelope")
    }
}

/// Outgoing side of the signal transport.
#[allow(async_fn_in_trait)]
pub trait EventPublisher {
    async fn publish(&self, event: &TaskEvent) -> Result<()>;
}

/// Publisher used when no transport is configured: events are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &TaskEvent) -> Result<()> {
        tracing::info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            task_id = %event.task_data.id,
            user_id = %event.user_id,
            "event not published, no transport configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETED: &str = r#"{
        "event_id": "7f0e8a52-3a5b-4a0e-9d3c-8d1b2a6f4e11",
        "event_type": "task.completed",
        "timestamp": "2026-01-07T09:05:00Z",
        "user_id": "user-1",
        "task_data": {
            "id": "0b7d5b4e-4f0c-4f8e-a0f2-43d8c8a3c9aa",
            "title": "Standup",
            "completed": true,
            "priority": "high",
            "tags": null,
            "due_date": "2026-01-07T09:00:00Z",
            "recurrence_id": "c4a9e6a1-25c3-4a57-b7f9-0f0d4f7e2b10"
        }
    }"#;

    #[test]
    fn test_parse_plain_envelope() {
        let event = TaskEvent::parse(COMPLETED).unwrap();
        assert_eq!(event.event_type, EventType::Completed);
        assert_eq!(event.user_id, "user-1");
        assert_eq!(event.task_data.priority, Priority::High);
        assert!(event.task_data.tags.is_empty());
        assert!(event.task_data.recurrence_id.is_some());
        assert_eq!(event.metadata, EventMetadata::default());
    }

    #[test]
    fn test_parse_wrapped_envelopes() {
        let inner: Value = serde_json::from_str(COMPLETED).unwrap();

        let wrapped = serde_json::json!({ "id": "abc", "specversion": "1.0", "data": inner.clone() });
        assert_eq!(TaskEvent::from_value(wrapped).unwrap().event_type, EventType::Completed);

        let encoded = serde_json::json!({ "data": inner.to_string() });
        assert_eq!(TaskEvent::from_value(encoded).unwrap().user_id, "user-1");
    }

    #[test]
    fn test_unknown_event_type_is_kept() {
        let raw = COMPLETED.replace("task.completed", "reminder.trigger");
        let event = TaskEvent::parse(&raw).unwrap();
        assert_eq!(event.event_type, EventType::Other("reminder.trigger".to_string()));
    }

    #[test]
    fn test_completed_event_from_task() {
        let mut task = Task::new("user-2", "Pay rent");
        task.completed = true;
        let event = TaskEvent::completed(&task, "api");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "task.completed");
        assert_eq!(json["previous_data"]["completed"], false);
        assert_eq!(json["metadata"]["source"], "api");
        assert_eq!(event.task_data.to_task("user-2"), task);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TaskEvent::parse("not json").is_err());
        assert!(TaskEvent::parse(r#"{"data": {"hello": 1}}"#).is_err());
    }
}
