use crate::{
    libs::{config::Config, messages::Message, task::TaskFilter, view::View},
    msg_print,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(short, long, help = "Include completed tasks")]
    all: bool,
    #[arg(short, long, help = "Only tasks of this owner")]
    user: Option<String>,
}

pub fn cmd(list_args: ListArgs) -> Result<()> {
    let config = Config::load()?;
    let service = super::service(&config)?;

    let filter = match (list_args.all, list_args.user) {
        (true, None) => TaskFilter::All,
        (false, None) => TaskFilter::Open,
        (true, Some(user)) => TaskFilter::ByUser(user),
        (false, Some(user)) => TaskFilter::OpenByUser(user),
    };
    let tasks = service.list(filter)?;

    if tasks.is_empty() {
        msg_print!(Message::TasksNotFound);
        return Ok(());
    }

    msg_print!(Message::TasksHeader, true);
    View::tasks(&tasks);
    Ok(())
}
