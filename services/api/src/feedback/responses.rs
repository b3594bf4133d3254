use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use opine_db::feedback::models::{FeedbackRecord, FeedbackType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub feedback_id: Uuid,
    pub project_id: String,
    pub created_by: String,
    pub updated_by: String,
    pub summary: String,
    pub description: String,
    pub tag: String,
    pub feedback_type: FeedbackType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FeedbackRecord> for FeedbackResponse {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            feedback_id: record.feedback_id,
            project_id: record.project_id,
            created_by: record.created_by,
            updated_by: record.updated_by,
            summary: record.summary,
            description: record.description,
            tag: record.tag,
            feedback_type: record.feedback_type,
            url: record.url,
            ticket_url: record.ticket_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListFeedbackResponse {
    pub data: Vec<FeedbackResponse>,
    pub count: usize,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct TicketDetailsResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}
