//! HTTP client for a Dapr sidecar.
//!
//! Task events go out through the pub/sub building block and reminder jobs
//! through the jobs API:
//!
//! - `POST {endpoint}/v1.0/publish/{pubsub}/{topic}` with the event envelope
//! - `POST {endpoint}/v1.0-alpha1/jobs/{name}` with `{ "dueTime", "data" }`

use crate::libs::config::DaprConfig;
use crate::libs::event::{EventPublisher, TaskEvent};
use crate::libs::reminder::{JobScheduler, ReminderJob};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DaprClient {
    client: Client,
    config: DaprConfig,
}

#[derive(Debug, Serialize)]
struct JobRequest<'a> {
    #[serde(rename = "dueTime")]
    due_time: String,
    data: JobData<'a>,
}

#[derive(Debug, Serialize)]
struct JobData<'a> {
    callback: &'a str,
    #[serde(flatten)]
    job: &'a ReminderJob,
}

impl DaprClient {
    pub fn new(config: &DaprConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.http_endpoint
    }

    fn publish_url(&self) -> String {
        format!("{}/v1.0/publish/{}/{}", self.config.http_endpoint, self.config.pubsub_name, self.config.topic)
    }

    fn job_url(&self, name: &str) -> String {
        format!("{}/v1.0-alpha1/jobs/{}", self.config.http_endpoint, name)
    }
}

impl EventPublisher for DaprClient {
    async fn publish(&self, event: &TaskEvent) -> Result<()> {
        let url = self.publish_url();
        self.client
            .post(&url)
            .json(event)
            .send()
            .await
            .with_context(|| format!("failed to reach sidecar at {}", url))?
            .error_for_status()
            .context("sidecar rejected the event")?;

        tracing::info!(event_type = %event.event_type, task_id = %event.task_data.id, topic = %self.config.topic, "published task event");
        Ok(())
    }
}

impl JobScheduler for DaprClient {
    async fn schedule(&self, job: &ReminderJob, due_time: DateTime<FixedOffset>) -> Result<()> {
        let name = job.name();
        let url = self.job_url(&name);
        let body = JobRequest {
            due_time: due_time.to_rfc3339(),
            data: JobData {
                callback: &self.config.job_callback,
                job,
            },
        };

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach sidecar at {}", url))?
            .error_for_status()
            .context("sidecar rejected the reminder job")?;

        tracing::info!(job = %name, due_time = %body.due_time, task_id = %job.task_id, "scheduled reminder job");
        Ok(())
    }
}
