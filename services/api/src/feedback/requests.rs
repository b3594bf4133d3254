use serde::Deserialize;

use opine_db::feedback::models::FeedbackType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub project_id: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub tag: String,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackRequest {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub url: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFeedbackQuery {
    pub project_id: Option<String>,
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQuery {
    pub ticket_id: Option<String>,
    pub project_id: Option<String>,
}
