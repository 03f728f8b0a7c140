use crate::{
    libs::{config::Config, event::EventType, formatter::format_date, materializer::Outcome, messages::Message},
    msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct CompleteArgs {
    #[arg(required = true, help = "Task id or a unique prefix of it")]
    id: String,
}

pub async fn cmd(complete_args: CompleteArgs) -> Result<()> {
    let config = Config::load()?;
    let mut service = super::service(&config)?;

    let id = service.resolve_id(&complete_args.id)?;
    let completion = service.complete(&id, Utc::now()).await?;
    msg_success!(Message::TaskCompleted(completion.task.id.to_string()));
    if let Some(error) = &completion.publish_error {
        msg_warning!(Message::EventPublishFailed(EventType::Completed.to_string(), error.clone()));
    }

    match completion.next {
        Some(Outcome::Created { task_id, due_date }) => {
            msg_info!(Message::NextInstanceCreated(task_id.to_string(), format_date(&due_date)))
        }
        Some(Outcome::AlreadyExists { due_date, .. }) => msg_info!(Message::NextInstanceExists(format_date(&due_date))),
        Some(Outcome::Dropped(reason)) | Some(Outcome::Failed(reason)) => msg_warning!(Message::NextInstanceSkipped(reason)),
        Some(Outcome::Ignored(_)) | Some(Outcome::NotRecurring) | None => {}
    }
    Ok(())
}
