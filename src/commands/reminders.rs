use crate::{
    db::reminders::ReminderFilter,
    libs::{config::Config, messages::Message, view::View},
    msg_print,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct RemindersArgs {
    #[arg(short, long, help = "Only reminders of this owner")]
    user: Option<String>,
}

pub fn cmd(reminders_args: RemindersArgs) -> Result<()> {
    let config = Config::load()?;
    let service = super::service(&config)?;

    let filter = match reminders_args.user {
        Some(user) => ReminderFilter::PendingByUser(user),
        None => ReminderFilter::Pending,
    };
    let reminders = service.reminders(filter)?;

    if reminders.is_empty() {
        msg_print!(Message::RemindersNotFound);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(reminders.len());
    for reminder in reminders {
        let due_date = service.store().tasks().get_by_id(&reminder.task_id)?.and_then(|task| task.due_date);
        rows.push((reminder, due_date));
    }

    msg_print!(Message::RemindersHeader, true);
    View::reminders(&rows);
    Ok(())
}
