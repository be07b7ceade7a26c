use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity::{Cacheable, EntityId};

/// How often a scheduled task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskInterval {
    /// Once a day at `hour:minute` UTC
    Daily,
    /// Every hour at `:minute`
    Hourly,
}

impl TaskInterval {
    /// Wire value sent when creating a task.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }
}

/// A command executed on a daily or hourly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduledTask {
    /// Task id
    pub id: u64,
    /// API path of the task
    pub url: String,
    /// Owning username
    pub user: String,
    /// Command to run
    pub command: String,
    /// Date the task stops running unless extended
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Whether the task is enabled
    pub enabled: bool,
    /// Path of the task's log file
    pub logfile: String,
    /// API path used to extend the expiry
    pub extend_url: String,
    /// Run frequency
    pub interval: TaskInterval,
    /// Hour of day (UTC); absent for hourly tasks
    #[serde(default)]
    pub hour: Option<u8>,
    /// Minute of the hour
    pub minute: u8,
    /// Human-readable schedule
    pub printable_time: String,
    /// Whether the account may enable the task
    pub can_enable: bool,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// Body of a create-task request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewScheduledTask {
    /// Command to run
    pub command: String,
    /// Run frequency
    pub interval: TaskInterval,
    /// Hour of day (UTC); ignored for hourly tasks
    pub hour: Option<u8>,
    /// Minute of the hour
    pub minute: u8,
    /// Whether the task starts enabled
    pub enabled: bool,
    /// Free-form description
    pub description: String,
}

impl NewScheduledTask {
    /// Enabled daily task at `hour:minute` UTC
    pub fn daily(command: impl Into<String>, hour: u8, minute: u8) -> Self {
        Self {
            command: command.into(),
            interval: TaskInterval::Daily,
            hour: Some(hour),
            minute,
            enabled: true,
            description: String::new(),
        }
    }

    /// Enabled hourly task at `:minute`
    pub fn hourly(command: impl Into<String>, minute: u8) -> Self {
        Self {
            command: command.into(),
            interval: TaskInterval::Hourly,
            hour: None,
            minute,
            enabled: true,
            description: String::new(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Body of a partial task update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduledTaskUpdate {
    /// New command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// New run frequency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<TaskInterval>,
    /// New hour of day (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    /// New minute of the hour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
    /// Enable or disable the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Cacheable for ScheduledTask {
    fn cache_id(&self) -> EntityId {
        EntityId::Int(self.id)
    }
}
