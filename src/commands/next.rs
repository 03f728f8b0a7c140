use crate::{
    libs::{
        formatter::parse_when,
        messages::Message,
        recurrence::{RecurrenceRule, RecurrenceSpec},
        view::View,
    },
    msg_print,
};
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct NextArgs {
    #[arg(required = true, help = "daily, weekly, monthly, 'every 3 days', ...")]
    repeat: String,
    #[arg(short, long, help = "Anchor due date, defaults to now")]
    from: Option<String>,
    #[arg(short, long)]
    interval: Option<u32>,
    #[arg(short, long, default_value_t = 5)]
    count: usize,
}

/// Shows the due dates a chain would get, completing each instance in turn.
pub fn cmd(next_args: NextArgs) -> Result<()> {
    let spec = RecurrenceSpec::resolve(Some(&next_args.repeat), next_args.interval)?
        .ok_or_else(|| anyhow!("no recurrence given"))?;
    let anchor = match next_args.from.as_deref() {
        Some(from) => parse_when(from)?,
        None => Utc::now().fixed_offset(),
    };

    let rule = RecurrenceRule::new("preview", spec, &anchor);
    let dates = rule.occurrences(anchor, next_args.count)?;

    msg_print!(Message::OccurrencesHeader(spec.to_string()), true);
    View::occurrences(&dates);
    Ok(())
}
