use crate::{
    libs::{
        config::{Config, DaprConfig, RemindersConfig},
        messages::Message,
    },
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(short, long, help = "Delete the configuration file")]
    delete: bool,
    #[arg(long, help = "Dapr sidecar HTTP endpoint, e.g. http://localhost:3500")]
    dapr_endpoint: Option<String>,
    #[arg(long, requires = "dapr_endpoint")]
    pubsub: Option<String>,
    #[arg(long, requires = "dapr_endpoint")]
    topic: Option<String>,
    #[arg(long, help = "Owner of tasks created from this machine")]
    user: Option<String>,
    #[arg(long, help = "Reject tasks whose reminder would fire in the past instead of dropping the reminder")]
    strict_reminders: bool,
    #[arg(long, help = "Accept due dates in the past")]
    allow_past_due_dates: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    if init_args.delete {
        if Config::delete()? {
            msg_success!(Message::ConfigDeleted);
        } else {
            msg_info!(Message::ConfigNotFound);
        }
        return Ok(());
    }

    let mut config = Config::read()?;

    if let Some(endpoint) = &init_args.dapr_endpoint {
        let mut dapr = DaprConfig::new(endpoint);
        if let Some(pubsub) = init_args.pubsub {
            dapr.pubsub_name = pubsub;
        }
        if let Some(topic) = init_args.topic {
            dapr.topic = topic;
        }
        config.dapr = Some(dapr);
    }
    if let Some(user) = init_args.user {
        config.default_user = Some(user);
    }
    if init_args.strict_reminders || init_args.allow_past_due_dates || config.reminders.is_none() {
        let mut reminders = config.reminders.clone().unwrap_or_else(RemindersConfig::default);
        reminders.drop_invalid = reminders.drop_invalid && !init_args.strict_reminders;
        reminders.allow_past_due_dates = reminders.allow_past_due_dates || init_args.allow_past_due_dates;
        config.reminders = Some(reminders);
    }

    config.save()?;

    msg_success!(Message::ConfigSaved);
    msg_print!(Message::ConfigPath(Config::path()?.display().to_string()));
    match &config.dapr {
        Some(dapr) => msg_info!(Message::ConfigEndpoint(dapr.http_endpoint.clone())),
        None => msg_info!(Message::ConfigLocalOnly),
    }
    Ok(())
}
