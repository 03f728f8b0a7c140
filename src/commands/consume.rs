//! Feeds task events to the materializer, one JSON envelope per line.
//!
//! This is the subscriber side of the `task-events` topic for setups that
//! pipe the topic into a process (`kcat -C -t task-events | rekur consume`).
//!
//! ## Behavior
//!
//! - Every handled line gets one acknowledgement line on stdout.
//! - A line that is not UTF-8 or not a task event is reported and skipped;
//!   the following lines are still handled.
//! - Blank lines are ignored.

use crate::{
    api::Transport,
    db::store::SqliteStore,
    libs::{
        config::Config,
        event::{EventPublisher, TaskEvent},
        materializer::{Materializer, Outcome},
        messages::Message,
        store::TaskStore,
    },
    msg_info, msg_warning,
};
use anyhow::Result;
use clap::Args;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ConsumeArgs {
    #[arg(short, long, help = "Read events from a file instead of stdin")]
    file: Option<PathBuf>,
}

/// Counts for one consumed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Events handed to the materializer and acknowledged.
    pub processed: usize,
    /// Of those, events that created a next instance.
    pub created: usize,
    /// Lines that could not be decoded into an event.
    pub skipped: usize,
}

pub async fn cmd(consume_args: ConsumeArgs) -> Result<()> {
    let config = Config::load()?;
    let reader: Box<dyn BufRead> = match &consume_args.file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut materializer = Materializer::new(SqliteStore::new()?, Transport::from_config(&config)?);
    let tally = process(reader, &mut io::stdout().lock(), &mut materializer).await?;

    if tally.processed == 0 {
        msg_info!(Message::EventSourceEmpty);
    } else {
        msg_info!(Message::EventsConsumed(tally.processed, tally.created));
    }
    Ok(())
}

/// Runs every line of `reader` through `materializer`, writing one ack JSON
/// line to `out` per handled event.
///
/// Only failures to read the input or to write an ack are returned as errors.
///
/// # Arguments
///
/// * `reader` - Source of newline-separated event envelopes
/// * `out` - Sink for the acknowledgement lines
/// * `materializer` - Materializer the events are handed to
pub async fn process<R, W, S, P>(mut reader: R, out: &mut W, materializer: &mut Materializer<S, P>) -> Result<Tally>
where
    R: BufRead,
    W: Write,
    S: TaskStore,
    P: EventPublisher,
{
    let mut tally = Tally::default();
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let event = match decode(&buf) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                msg_warning!(Message::EventParseFailed(line_number, format!("{:#}", e)));
                tally.skipped += 1;
                continue;
            }
        };

        let outcome = materializer.handle(&event).await;
        if matches!(outcome, Outcome::Created { .. }) {
            tally.created += 1;
        }
        tally.processed += 1;
        writeln!(out, "{}", serde_json::to_string(&outcome.ack())?)?;
    }

    Ok(tally)
}

/// `None` for a blank line.
fn decode(raw: &[u8]) -> Result<Option<TaskEvent>> {
    let line = std::str::from_utf8(raw)?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    TaskEvent::parse(line).map(Some)
}
