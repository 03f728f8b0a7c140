//! Task operations that cut across the store, the reminder planner and the
//! event transport.
//!
//! Writes are database-first: the task, its recurrence rule and its reminder
//! are committed together, then the reminder job is scheduled and the event is
//! published. A failing sidecar leaves the stored rows alone; the error is
//! logged and returned alongside the result for the caller to report.

use crate::db::reminders::ReminderFilter;
use crate::db::store::SqliteStore;
use crate::libs::config::RemindersConfig;
use crate::libs::event::{EventPublisher, LogPublisher, TaskEvent};
use crate::libs::materializer::{Materializer, Outcome};
use crate::libs::messages::Message;
use crate::libs::recurrence::{RecurrenceRule, RecurrenceSpec};
use crate::libs::reminder::{plan_reminder, validate_due_date, JobScheduler, Reminder, ReminderError, ReminderJob};
use crate::libs::task::{Priority, Task, TaskFilter, ValidationError};
use crate::msg_bail_anyhow;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

pub const EVENT_SOURCE: &str = "task_service";

/// A task creation request as it arrives from the command line.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub recurrence: Option<String>,
    pub interval: Option<u32>,
    pub remind: Option<String>,
}

#[derive(Debug)]
pub struct Created {
    pub task: Task,
    pub rule: Option<RecurrenceRule>,
    pub reminder: Option<Reminder>,
    /// Set when the reminder was dropped instead of failing the request.
    pub dropped_reminder: Option<ReminderError>,
    pub job_error: Option<String>,
    /// Set when `task.created` could not be handed to the transport.
    pub publish_error: Option<String>,
}

#[derive(Debug)]
pub struct Completion {
    pub task: Task,
    /// Result of in-process materialization; `None` when a sidecar takes the event.
    pub next: Option<Outcome>,
    /// Set when `task.completed` could not be handed to the transport. In
    /// sidecar mode no next instance is created until the event is resent.
    pub publish_error: Option<String>,
}

pub struct TaskService<P, J> {
    store: SqliteStore,
    publisher: P,
    scheduler: J,
    reminders: RemindersConfig,
    materialize_locally: bool,
}

impl<P: EventPublisher, J: JobScheduler> TaskService<P, J> {
    pub fn new(store: SqliteStore, publisher: P, scheduler: J, reminders: RemindersConfig) -> Self {
        Self {
            store,
            publisher,
            scheduler,
            reminders,
            materialize_locally: false,
        }
    }

    /// Run the materializer right after completing a task, for setups where
    /// no consumer listens to published events.
    pub fn materialize_locally(mut self, enabled: bool) -> Self {
        self.materialize_locally = enabled;
        self
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    /// Validates and stores a new task, then schedules its reminder job and
    /// publishes `task.created`.
    ///
    /// # Arguments
    ///
    /// * `request` - The task as typed by the user
    /// * `now` - Reference time for due-date and reminder validation
    ///
    /// # Errors
    ///
    /// Validation failures ([`ValidationError`], [`ReminderError`] unless the
    /// reminder may be dropped) and store failures. Sidecar failures are not
    /// errors; they come back in [`Created::job_error`] and
    /// [`Created::publish_error`].
    pub async fn create(&mut self, request: NewTask, now: DateTime<Utc>) -> Result<Created> {
        let mut task = Task::new(&request.user_id, &request.title)
            .with_description(request.description)
            .with_priority(request.priority)
            .with_tags(request.tags)
            .with_due_date(request.due_date);
        task.validate()?;

        if let Some(due) = &task.due_date {
            validate_due_date(due, now, self.reminders.allow_past_due_dates)?;
        }

        let rule = match RecurrenceSpec::resolve(request.recurrence.as_deref(), request.interval)? {
            Some(spec) => {
                let due = task.due_date.ok_or(ValidationError::RecurrenceWithoutDueDate)?;
                Some(RecurrenceRule::new(&task.user_id, spec, &due))
            }
            None => None,
        };
        task.recurrence_id = rule.as_ref().map(|r| r.id);

        let mut dropped_reminder = None;
        let plan = match plan_reminder(task.due_date, request.remind.as_deref(), now) {
            Ok(plan) => plan,
            Err(e) if e.is_recoverable() && self.reminders.drop_invalid => {
                tracing::warn!(task_id = %task.id, error = %e, "dropping reminder, task is created without it");
                dropped_reminder = Some(e);
                None
            }
            Err(e) => return Err(e.into()),
        };
        let reminder = plan.as_ref().map(|plan| Reminder::pending(&task, plan, &self.reminders.delivery_method));

        self.store.create_task(&task, rule.as_ref(), reminder.as_ref())?;
        tracing::info!(task_id = %task.id, user_id = %task.user_id, recurring = rule.is_some(), "task created");

        let mut job_error = None;
        if let (Some(reminder), Some(plan)) = (&reminder, &plan) {
            let job = ReminderJob::new(reminder, &task, plan);
            if let Err(e) = self.scheduler.schedule(&job, plan.reminder_time).await {
                tracing::error!(reminder_id = %reminder.id, error = %e, "failed to schedule reminder job");
                job_error = Some(e.to_string());
            }
        }

        let publish_error = match self.publisher.publish(&TaskEvent::created(&task, EVENT_SOURCE)).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "failed to publish task.created");
                Some(format!("{:#}", e))
            }
        };

        Ok(Created {
            task,
            rule,
            reminder,
            dropped_reminder,
            job_error,
            publish_error,
        })
    }

    /// Marks a task completed and publishes `task.completed`.
    ///
    /// With [`Self::materialize_locally`] the next instance of a recurring
    /// task is created right away and reported in [`Completion::next`].
    ///
    /// # Errors
    ///
    /// Fails when the task does not exist or is already completed.
    pub async fn complete(&mut self, id: &Uuid, now: DateTime<Utc>) -> Result<Completion> {
        let Some(mut task) = self.store.tasks().get_by_id(id)? else {
            msg_bail_anyhow!(Message::TaskNotFound(id.to_string()));
        };
        if task.completed || !self.store.tasks().complete(id, now)? {
            msg_bail_anyhow!(Message::TaskAlreadyCompleted(id.to_string()));
        }
        task.completed = true;
        task.updated_at = now;
        tracing::info!(task_id = %task.id, "task completed");

        let event = TaskEvent::completed(&task, EVENT_SOURCE);
        let publish_error = match self.publisher.publish(&event).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "failed to publish task.completed");
                Some(format!("{:#}", e))
            }
        };

        let next = if self.materialize_locally && task.recurrence_id.is_some() {
            let mut materializer = Materializer::new(&mut self.store, LogPublisher);
            Some(materializer.handle(&event).await)
        } else {
            None
        };

        Ok(Completion { task, next, publish_error })
    }

    /// Tasks matching `filter`, soonest due first.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use rekur::db::store::SqliteStore;
    /// use rekur::libs::config::RemindersConfig;
    /// use rekur::libs::event::LogPublisher;
    /// use rekur::libs::reminder::NoopScheduler;
    /// use rekur::libs::service::TaskService;
    /// use rekur::libs::task::TaskFilter;
    ///
    /// let service = TaskService::new(SqliteStore::new()?, LogPublisher, NoopScheduler, RemindersConfig::default());
    /// for task in service.list(TaskFilter::Open)? {
    ///     println!("{} {}", task.id, task.title);
    /// }
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.store.tasks().fetch(filter)
    }

    /// Stored reminders matching `filter`, earliest reminder time first.
    ///
    /// # Arguments
    ///
    /// * `filter` - See [`ReminderFilter`]
    pub fn reminders(&self, filter: ReminderFilter) -> Result<Vec<Reminder>> {
        self.store.reminders().fetch(filter)
    }

    /// Accepts a full task id or an unambiguous prefix of one.
    pub fn resolve_id(&self, id: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(id) {
            return Ok(id);
        }

        let matches = self.store.tasks().find_by_prefix(id)?;
        match matches.as_slice() {
            [task] => Ok(task.id),
            [] => msg_bail_anyhow!(Message::TaskNotFoundForPrefix(id.to_string())),
            _ => msg_bail_anyhow!(Message::TaskPrefixAmbiguous(id.to_string())),
        }
    }
}
