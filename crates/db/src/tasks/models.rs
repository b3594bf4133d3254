use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Ticket,
    Mail,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Mail => "mail",
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ticket" => Ok(Self::Ticket),
            "mail" => Ok(Self::Mail),
            _ => Err(format!("unknown task kind: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown task status: {value}")),
        }
    }
}

/// A durable side-effect job recorded when feedback is submitted.
///
/// Ticket filing and mail delivery run from these rows rather than inline
/// with the request, so a crash between the insert and the side effect
/// loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyTask {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    /// Earliest time the task may be claimed.
    pub run_after: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotifyTask {
    pub feedback_id: Uuid,
    pub kind: TaskKind,
}
