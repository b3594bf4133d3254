use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedbackType {
    Feedback,
    Issue,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feedback => "FEEDBACK",
            Self::Issue => "ISSUE",
        }
    }

    /// Human-readable form used in summaries and mail subjects.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Feedback => "Feedback",
            Self::Issue => "Issue",
        }
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FEEDBACK" => Ok(Self::Feedback),
            "ISSUE" => Ok(Self::Issue),
            _ => Err(format!("unknown feedback type: {value}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: Uuid,
    /// Entity reference of the catalog entity this feedback targets.
    pub project_id: String,
    pub created_by: String,
    pub updated_by: String,
    pub summary: String,
    pub description: String,
    /// Free-form sentiment tag, e.g. "Excellent" or "Needs Improvement".
    pub tag: String,
    pub feedback_type: FeedbackType,
    /// Page the feedback was submitted from.
    pub url: String,
    pub ticket_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedbackFilter {
    pub project_id: Option<String>,
    /// Case-insensitive substring match against summary, description and tag.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackPage {
    pub items: Vec<FeedbackRecord>,
    /// Total rows matching the filter, ignoring limit/offset.
    pub total: i64,
}
