//! Application configuration.
//!
//! Stored as pretty-printed JSON in `config.json` inside the data directory.
//! Every section is optional; a missing file or section means defaults:
//! no sidecar (events are only logged and next instances are created in
//! process), webhook delivery, and reminders that would fire in the past are
//! dropped instead of failing the request.
//!
//! ```json
//! {
//!   "dapr": {
//!     "http_endpoint": "http://localhost:3500",
//!     "pubsub_name": "kafka-pubsub",
//!     "topic": "task-events",
//!     "job_callback": "/api/jobs/trigger"
//!   },
//!   "reminders": { "delivery_method": "webhook", "drop_invalid": true },
//!   "default_user": "user-1"
//! }
//! ```
//!
//! `DAPR_HTTP_ENDPOINT` in the environment (or `.env`) overrides
//! `dapr.http_endpoint` and enables the sidecar when no section is saved.

use super::data_storage::DataStorage;
use crate::libs::event::TOPIC_TASK_EVENTS;
use crate::libs::reminder::DEFAULT_DELIVERY_METHOD;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DAPR_HTTP_ENDPOINT_ENV: &str = "DAPR_HTTP_ENDPOINT";
pub const DEFAULT_PUBSUB_NAME: &str = "kafka-pubsub";
pub const DEFAULT_JOB_CALLBACK: &str = "/api/jobs/trigger";
pub const DEFAULT_USER: &str = "local";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DaprConfig {
    pub http_endpoint: String,
    #[serde(default = "default_pubsub_name")]
    pub pubsub_name: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Path the sidecar calls back when a reminder job fires.
    #[serde(default = "default_job_callback")]
    pub job_callback: String,
}

fn default_pubsub_name() -> String {
    DEFAULT_PUBSUB_NAME.to_string()
}

fn default_topic() -> String {
    TOPIC_TASK_EVENTS.to_string()
}

fn default_job_callback() -> String {
    DEFAULT_JOB_CALLBACK.to_string()
}

impl DaprConfig {
    pub fn new(http_endpoint: &str) -> Self {
        Self {
            http_endpoint: http_endpoint.trim_end_matches('/').to_string(),
            pubsub_name: default_pubsub_name(),
            topic: default_topic(),
            job_callback: default_job_callback(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemindersConfig {
    #[serde(default = "default_delivery_method")]
    pub delivery_method: String,
    /// Create the task without its reminder when the reminder would fire in the past.
    #[serde(default = "default_true")]
    pub drop_invalid: bool,
    #[serde(default)]
    pub allow_past_due_dates: bool,
}

fn default_delivery_method() -> String {
    DEFAULT_DELIVERY_METHOD.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            delivery_method: default_delivery_method(),
            drop_invalid: true,
            allow_past_due_dates: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dapr: Option<DaprConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<RemindersConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        DataStorage::new().get_path(CONFIG_FILE_NAME)
    }

    /// Reads the saved configuration, or defaults when none is saved.
    pub fn read() -> Result<Config> {
        let config_file_path = Self::path()?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// [`Config::read`] with environment overrides applied.
    pub fn load() -> Result<Config> {
        Ok(Self::read()?.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = env::var(DAPR_HTTP_ENDPOINT_ENV) {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                match self.dapr.as_mut() {
                    Some(dapr) => dapr.http_endpoint = endpoint.trim_end_matches('/').to_string(),
                    None => self.dapr = Some(DaprConfig::new(endpoint)),
                }
            }
        }
        self
    }

    pub fn save(&self) -> Result<()> {
        let config_file = File::create(Self::path()?)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes the saved file. Returns false when there was none.
    pub fn delete() -> Result<bool> {
        let config_file_path = Self::path()?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    pub fn reminders(&self) -> RemindersConfig {
        self.reminders.clone().unwrap_or_default()
    }

    pub fn user(&self) -> String {
        self.default_user.clone().unwrap_or_else(|| DEFAULT_USER.to_string())
    }
}
