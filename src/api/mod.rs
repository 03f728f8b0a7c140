//! Clients for services outside the process.

pub mod dapr;

pub use dapr::DaprClient;

use crate::libs::config::Config;
use crate::libs::event::{EventPublisher, LogPublisher, TaskEvent};
use crate::libs::reminder::{JobScheduler, NoopScheduler, ReminderJob};
use anyhow::Result;
use chrono::{DateTime, FixedOffset};

/// Where events and reminder jobs go, picked from the configuration.
#[derive(Debug, Clone)]
pub enum Transport {
    Sidecar(DaprClient),
    /// Nothing configured: events are logged and reminder jobs are skipped.
    Local,
}

impl Transport {
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.dapr {
            Some(dapr) => Ok(Transport::Sidecar(DaprClient::new(dapr)?)),
            None => Ok(Transport::Local),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Transport::Local)
    }
}

impl EventPublisher for Transport {
    async fn publish(&self, event: &TaskEvent) -> Result<()> {
        match self {
            Transport::Sidecar(client) => client.publish(event).await,
            Transport::Local => LogPublisher.publish(event).await,
        }
    }
}

impl JobScheduler for Transport {
    async fn schedule(&self, job: &ReminderJob, due_time: DateTime<FixedOffset>) -> Result<()> {
        match self {
            Transport::Sidecar(client) => client.schedule(job, due_time).await,
            Transport::Local => NoopScheduler.schedule(job, due_time).await,
        }
    }
}
