use crate::{
    libs::{
        config::Config,
        event::EventType,
        formatter::{format_date, parse_when},
        messages::Message,
        service::NewTask,
        task::Priority,
    },
    msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(required = true)]
    title: String,
    #[arg(short, long)]
    description: Option<String>,
    #[arg(short, long, default_value = "normal", help = "low, normal, high or critical")]
    priority: String,
    #[arg(short, long = "tag")]
    tags: Vec<String>,
    #[arg(long, help = "Due date: RFC 3339, 'YYYY-MM-DD HH:MM', 'in 2 days', 'tomorrow at 5pm', ...")]
    due: Option<String>,
    #[arg(short, long, help = "daily, weekly, monthly, 'every 2 weeks', ...")]
    repeat: Option<String>,
    #[arg(short, long, help = "Repeat every N days, weeks or months")]
    interval: Option<u32>,
    #[arg(long, help = "'1 hour before', '30 minutes before', '2 days before'")]
    remind: Option<String>,
    #[arg(short, long)]
    user: Option<String>,
}

pub async fn cmd(add_args: AddArgs) -> Result<()> {
    let config = Config::load()?;
    let mut service = super::service(&config)?;

    let due_date = add_args.due.as_deref().map(parse_when).transpose()?;
    let request = NewTask {
        user_id: add_args.user.unwrap_or_else(|| config.user()),
        title: add_args.title,
        description: add_args.description,
        priority: add_args.priority.parse::<Priority>()?,
        tags: add_args.tags,
        due_date,
        recurrence: add_args.repeat,
        interval: add_args.interval,
        remind: add_args.remind,
    };

    let created = service.create(request, Utc::now()).await?;

    msg_success!(Message::TaskCreated(created.task.id.to_string()));
    if let Some(spec) = created.rule.as_ref().and_then(|rule| rule.spec().ok()) {
        msg_print!(Message::RecurrenceAttached(spec.to_string()));
    }
    if let Some(reminder) = &created.reminder {
        msg_info!(Message::ReminderScheduled(format_date(&reminder.reminder_time)));
    }
    if let Some(reason) = &created.dropped_reminder {
        msg_warning!(Message::ReminderDropped(reason.to_string()));
    }
    if let Some(error) = &created.job_error {
        msg_warning!(Message::ReminderJobFailed(error.clone()));
    }
    if let Some(error) = &created.publish_error {
        msg_warning!(Message::EventPublishFailed(EventType::Created.to_string(), error.clone()));
    }
    Ok(())
}
