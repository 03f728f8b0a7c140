use crate::libs::recurrence::RecurrenceRule;
use crate::libs::task::Task;
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An uncompleted instance with the same rule and due date already exists.
    Duplicate,
}

/// What the materializer needs from persistence.
///
/// `insert_instance` must be atomic with respect to the "one open instance per
/// rule and due date" invariant: a concurrent writer that lost the race gets
/// [`InsertOutcome::Duplicate`], not a second row.
pub trait TaskStore {
    fn find_rule(&mut self, rule_id: &Uuid) -> Result<Option<RecurrenceRule>>;

    fn find_open_instance(&mut self, rule_id: &Uuid, due_date: &DateTime<FixedOffset>) -> Result<Option<Task>>;

    fn insert_instance(&mut self, task: &Task) -> Result<InsertOutcome>;
}

impl<S: TaskStore + ?Sized> TaskStore for &mut S {
    fn find_rule(&mut self, rule_id: &Uuid) -> Result<Option<RecurrenceRule>> {
        (**self).find_rule(rule_id)
    }

    fn find_open_instance(&mut self, rule_id: &Uuid, due_date: &DateTime<FixedOffset>) -> Result<Option<Task>> {
        (**self).find_open_instance(rule_id, due_date)
    }

    fn insert_instance(&mut self, task: &Task) -> Result<InsertOutcome> {
        (**self).insert_instance(task)
    }
}
