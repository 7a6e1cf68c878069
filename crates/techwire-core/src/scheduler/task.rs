use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Frequency;

/// What a scheduled task dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Rss,
    Scrape,
    AiGenerate,
    Maintenance,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Rss => "rss",
            TaskKind::Scrape => "scrape",
            TaskKind::AiGenerate => "ai_generate",
            TaskKind::Maintenance => "maintenance",
        }
    }

    /// Unknown kinds collapse to Maintenance; dispatch rejects both the
    /// same way
    pub fn parse(s: &str) -> Self {
        match s {
            "rss" => TaskKind::Rss,
            "scrape" => TaskKind::Scrape,
            "ai_generate" => TaskKind::AiGenerate,
            _ => TaskKind::Maintenance,
        }
    }
}

/// Outcome recorded for the most recent run of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(RunStatus::Success),
            "failure" => Some(RunStatus::Failure),
            _ => None,
        }
    }
}

/// A persisted scheduled task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub name: String,
    pub kind: TaskKind,
    pub frequency: Frequency,
    pub config: serde_json::Value,
    pub is_active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub run_count: i64,
    pub error_count: i64,
    pub last_run_status: Option<RunStatus>,
    pub last_run_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new scheduled task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub kind: TaskKind,
    pub frequency: Frequency,
    pub config: serde_json::Value,
}

impl ScheduledTask {
    /// Whether enough time has elapsed since the last run.
    ///
    /// A never-run task is always due. Immediately after last_run_at is set
    /// to `now` this returns false until `now + frequency.interval()`.
    pub fn should_run(&self, now: DateTime<Utc>) -> bool {
        match self.last_run_at {
            None => true,
            Some(last_run) => now >= last_run + self.frequency.interval(),
        }
    }
}
