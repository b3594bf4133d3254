use serde::Deserialize;

use opine_db::feedback::models::FeedbackType;

/// Ticket to be filed, independent of tracker wire details.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub project_key: String,
    pub summary: String,
    pub description: String,
    pub tag: String,
    pub feedback_type: FeedbackType,
    /// Entity ref of the submitter, recorded as a label on the issue.
    pub reporter: String,
    /// Tracker-side username to assign, when the reporter could be resolved.
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTicket {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetails {
    pub status: String,
    pub assignee: Option<String>,
}

// Jira REST wire shapes; only the fields we read.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JiraIssue {
    pub fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
pub struct JiraIssueFields {
    pub status: Option<JiraStatusField>,
    pub assignee: Option<JiraAssigneeField>,
}

#[derive(Debug, Deserialize)]
pub struct JiraStatusField {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraAssigneeField {
    pub display_name: Option<String>,
}
