use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use opine_common::error::{OpineError, OpineResult};
use opine_config::JiraIntegration;
use opine_db::feedback::models::FeedbackType;

use super::models::{CreatedTicket, JiraIssue, JiraUser, NewTicket, TicketDetails};

/// Issue-tracker operations the feedback flow needs.
///
/// Retries are owned by the notify queue, so implementations make a single
/// attempt and report failures as errors.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// File a ticket and return its key.
    async fn create_ticket(
        &self,
        integration: &JiraIntegration,
        ticket: NewTicket,
    ) -> OpineResult<CreatedTicket>;

    /// Resolve a tracker-side username for an email address. `None` when the
    /// tracker knows no such user.
    async fn find_user_by_email(
        &self,
        integration: &JiraIntegration,
        email: &str,
    ) -> OpineResult<Option<String>>;

    /// Current status and assignee of a ticket, `None` for unknown ids.
    async fn ticket_details(
        &self,
        integration: &JiraIntegration,
        ticket_id: &str,
    ) -> OpineResult<Option<TicketDetails>>;
}

#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl From<JiraClientError> for OpineError {
    fn from(err: JiraClientError) -> Self {
        OpineError::Integration(format!("jira: {err}"))
    }
}

#[derive(Clone)]
pub struct JiraTicketClient {
    client: Client,
}

impl JiraTicketClient {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    fn issue_type(feedback_type: FeedbackType) -> &'static str {
        match feedback_type {
            FeedbackType::Issue => "Bug",
            FeedbackType::Feedback => "Task",
        }
    }

    fn tag_label(tag: &str) -> String {
        tag.trim().to_lowercase().replace(' ', "-")
    }

    fn api_base(integration: &JiraIntegration) -> String {
        format!("{}/rest/api/2", integration.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl TicketClient for JiraTicketClient {
    async fn create_ticket(
        &self,
        integration: &JiraIntegration,
        ticket: NewTicket,
    ) -> OpineResult<CreatedTicket> {
        let url = format!("{}/issue", Self::api_base(integration));

        let mut fields = serde_json::json!({
            "project": { "key": ticket.project_key },
            "summary": ticket.summary,
            "description": ticket.description,
            "issuetype": { "name": Self::issue_type(ticket.feedback_type) },
            "labels": [
                Self::tag_label(&ticket.tag),
                format!("reported-by:{}", ticket.reporter),
            ],
        });
        if let Some(assignee) = &ticket.assignee {
            fields["assignee"] = serde_json::json!({ "name": assignee });
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&integration.token)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await
            .map_err(JiraClientError::RequestError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraClientError::HttpError { status, body }.into());
        }

        let created = response
            .json::<CreatedTicket>()
            .await
            .map_err(JiraClientError::RequestError)?;
        Ok(created)
    }

    async fn find_user_by_email(
        &self,
        integration: &JiraIntegration,
        email: &str,
    ) -> OpineResult<Option<String>> {
        let url = format!("{}/user/search", Self::api_base(integration));

        let response = self
            .client
            .get(&url)
            .query(&[("username", email)])
            .bearer_auth(&integration.token)
            .send()
            .await
            .map_err(JiraClientError::RequestError)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraClientError::HttpError { status, body }.into());
        }

        let users = response
            .json::<Vec<JiraUser>>()
            .await
            .map_err(JiraClientError::RequestError)?;
        Ok(users.into_iter().find_map(|user| user.display_name))
    }

    async fn ticket_details(
        &self,
        integration: &JiraIntegration,
        ticket_id: &str,
    ) -> OpineResult<Option<TicketDetails>> {
        let url = format!("{}/issue/{}", Self::api_base(integration), ticket_id);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,assignee")])
            .bearer_auth(&integration.token)
            .send()
            .await
            .map_err(JiraClientError::RequestError)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraClientError::HttpError { status, body }.into());
        }

        let issue = response
            .json::<JiraIssue>()
            .await
            .map_err(JiraClientError::RequestError)?;
        Ok(Some(TicketDetails {
            status: issue
                .fields
                .status
                .map(|status| status.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            assignee: issue
                .fields
                .assignee
                .and_then(|assignee| assignee.display_name),
        }))
    }
}
