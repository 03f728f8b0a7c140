use super::formatter::{format_date, format_offset};
use super::reminder::Reminder;
use super::task::Task;
use chrono::{DateTime, FixedOffset};
use prettytable::{row, Table};
use uuid::Uuid;

pub struct View {}

impl View {
    pub fn tasks(tasks: &[Task]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "DUE", "PRIORITY", "TAGS", "REPEATS", "DONE"]);
        for task in tasks {
            let repeats = if task.recurrence_id.is_some() { "yes" } else { "" };
            let done = if task.completed { "✓" } else { "" };
            table.add_row(row![
                short_id(&task.id),
                task.title,
                task.due_date.as_ref().map(format_date).unwrap_or_default(),
                task.priority,
                task.tags.join(", "),
                repeats,
                done
            ]);
        }
        table.printstd();
    }

    /// Each reminder with its task's due date, when the task still has one.
    pub fn reminders(reminders: &[(Reminder, Option<DateTime<FixedOffset>>)]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TASK", "FIRES AT", "BEFORE DUE", "STATUS", "METHOD"]);
        for (reminder, due_date) in reminders {
            let before_due = due_date.map(|due| format_offset(&(due - reminder.reminder_time))).unwrap_or_default();
            table.add_row(row![
                short_id(&reminder.id),
                short_id(&reminder.task_id),
                format_date(&reminder.reminder_time),
                before_due,
                reminder.status,
                reminder.delivery_method
            ]);
        }
        table.printstd();
    }

    pub fn occurrences(dates: &[DateTime<FixedOffset>]) {
        let mut table = Table::new();

        table.add_row(row!["#", "DUE", "WEEKDAY"]);
        for (i, date) in dates.iter().enumerate() {
            table.add_row(row![i + 1, format_date(date), date.format("%A")]);
        }
        table.printstd();
    }
}

/// First block of the UUID, which the CLI accepts as a prefix.
fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
