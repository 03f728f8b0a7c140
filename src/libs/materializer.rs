//! Creates the next instance of a recurring task when the current one is completed.
//!
//! The materializer consumes `task.completed` events. The transport delivers
//! them at least once, so the same completion may arrive twice, or twice at the
//! same moment from two consumers. Each delivery runs:
//!
//! 1. Skip events that are not `task.completed`, and tasks without a rule.
//! 2. Load the rule and compute the next due date from the completed due date.
//! 3. Look for an uncompleted instance with that rule and due date.
//! 4. Found: nothing to do.
//! 5. Not found: insert the next instance and publish `task.created`.
//!
//! The store's uniqueness constraint backs up step 3 for concurrent deliveries:
//! a losing insert is reported as [`Outcome::AlreadyExists`].
//!
//! Errors never travel back to the transport. A failing store is logged and
//! acknowledged, because a redelivered poison message would fail the same way
//! forever; reconciliation is an operator task.

use crate::libs::event::{EventPublisher, EventType, TaskEvent};
use crate::libs::store::{InsertOutcome, TaskStore};
use crate::libs::task::Task;
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const SOURCE: &str = "recurring_task_service";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ignored(EventType),
    NotRecurring,
    Created { task_id: Uuid, due_date: DateTime<FixedOffset> },
    AlreadyExists { task_id: Option<Uuid>, due_date: DateTime<FixedOffset> },
    Dropped(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckStatus {
    Success,
    Drop,
}

/// Response handed back to the transport for one delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<String>,
}

impl Outcome {
    pub fn ack(&self) -> Ack {
        let (status, next_task_id, next_due_date) = match self {
            Outcome::Created { task_id, due_date } => (AckStatus::Success, Some(*task_id), Some(due_date.to_rfc3339())),
            Outcome::Dropped(_) => (AckStatus::Drop, None, None),
            _ => (AckStatus::Success, None, None),
        };
        Ack {
            status,
            message: self.to_string(),
            next_task_id,
            next_due_date,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ignored(event_type) => write!(f, "Event ignored (not task.completed): {}", event_type),
            Outcome::NotRecurring => write!(f, "Task is not recurring"),
            Outcome::Created { task_id, due_date } => write!(f, "Next task instance created: {} due {}", task_id, due_date.to_rfc3339()),
            Outcome::AlreadyExists { due_date, .. } => write!(f, "Next instance due {} already exists", due_date.to_rfc3339()),
            Outcome::Dropped(reason) => write!(f, "Dropped: {}", reason),
            Outcome::Failed(reason) => write!(f, "Error noted, not retried: {}", reason),
        }
    }
}

enum Step {
    Done(Outcome),
    Created(Task, DateTime<FixedOffset>),
}

pub struct Materializer<S, P> {
    store: S,
    publisher: P,
}

impl<S: TaskStore, P: EventPublisher> Materializer<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs one delivery of an event.
    ///
    /// Safe to call any number of times with the same event, from any number
    /// of processes sharing the store: at most one next instance is created.
    ///
    /// # Arguments
    ///
    /// * `event` - The delivered event; anything but `task.completed` is ignored
    ///
    /// # Returns
    ///
    /// The [`Outcome`] of the delivery. Failures are folded into
    /// [`Outcome::Failed`] so the caller always has an ack to send, see
    /// [`Outcome::ack`].
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use rekur::db::store::SqliteStore;
    /// use rekur::libs::event::{LogPublisher, TaskEvent};
    /// use rekur::libs::materializer::Materializer;
    ///
    /// # async fn run(raw: &str) -> anyhow::Result<()> {
    /// let mut materializer = Materializer::new(SqliteStore::new()?, LogPublisher);
    /// let outcome = materializer.handle(&TaskEvent::parse(raw)?).await;
    /// println!("{}", serde_json::to_string(&outcome.ack())?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn handle(&mut self, event: &TaskEvent) -> Outcome {
        tracing::info!(event_id = %event.event_id, event_type = %event.event_type, task_id = %event.task_data.id, "received task event");

        if event.event_type != EventType::Completed {
            tracing::debug!(event_type = %event.event_type, "ignoring event");
            return Outcome::Ignored(event.event_type.clone());
        }

        let step = match self.step(event) {
            Ok(step) => step,
            Err(e) => {
                tracing::error!(event_id = %event.event_id, task_id = %event.task_data.id, error = %e, "failed to materialize next instance");
                return Outcome::Failed(e.to_string());
            }
        };

        match step {
            Step::Done(outcome) => outcome,
            Step::Created(task, due_date) => {
                let created = TaskEvent::created(&task, SOURCE);
                if let Err(e) = self.publisher.publish(&created).await {
                    tracing::error!(task_id = %task.id, error = %e, "failed to publish task.created for next instance");
                }
                Outcome::Created { task_id: task.id, due_date }
            }
        }
    }

    /// The store-side part of a delivery: everything up to the insert.
    ///
    /// Returns [`Step::Created`] only when this call inserted the instance,
    /// so the `task.created` publish happens once per instance. Store errors
    /// are returned for [`Self::handle`] to log.
    fn step(&mut self, event: &TaskEvent) -> Result<Step> {
        let snapshot = &event.task_data;

        let Some(rule_id) = snapshot.recurrence_id else {
            tracing::debug!(task_id = %snapshot.id, "task is not recurring");
            return Ok(Step::Done(Outcome::NotRecurring));
        };

        let Some(rule) = self.store.find_rule(&rule_id)? else {
            tracing::warn!(%rule_id, "recurrence rule not found");
            return Ok(Step::Done(Outcome::Dropped(format!("recurrence rule {} not found", rule_id))));
        };

        let Some(anchor) = snapshot.due_date else {
            tracing::warn!(task_id = %snapshot.id, "task has no due date, cannot compute next occurrence");
            return Ok(Step::Done(Outcome::Dropped("task has no due date".to_string())));
        };

        let next_due = match rule.next_after(anchor) {
            Ok(next_due) => next_due,
            Err(e) => {
                tracing::warn!(%rule_id, error = %e, "stored recurrence rule is invalid");
                return Ok(Step::Done(Outcome::Dropped(e.to_string())));
            }
        };
        tracing::info!(next_due = %next_due.to_rfc3339(), pattern = %rule.pattern, interval = rule.interval, "calculated next occurrence");

        if let Some(existing) = self.store.find_open_instance(&rule_id, &next_due)? {
            tracing::info!(task_id = %existing.id, "next instance already exists, skipping");
            return Ok(Step::Done(Outcome::AlreadyExists {
                task_id: Some(existing.id),
                due_date: next_due,
            }));
        }

        let next = snapshot.to_task(&event.user_id).next_instance(next_due);
        match self.store.insert_instance(&next)? {
            InsertOutcome::Inserted => {
                tracing::info!(task_id = %next.id, due_date = %next_due.to_rfc3339(), "created next task instance");
                Ok(Step::Created(next, next_due))
            }
            InsertOutcome::Duplicate => {
                tracing::info!(due_date = %next_due.to_rfc3339(), "next instance created concurrently, skipping");
                Ok(Step::Done(Outcome::AlreadyExists { task_id: None, due_date: next_due }))
            }
        }
    }
}
