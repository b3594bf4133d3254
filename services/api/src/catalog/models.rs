use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Routing channel for submitted feedback: "JIRA" or "MAIL".
pub const FEEDBACK_TYPE_ANNOTATION: &str = "feedback/type";
/// Jira base URL to file tickets against, when several are configured.
pub const FEEDBACK_HOST_ANNOTATION: &str = "feedback/host";
/// Comma-separated recipient list for feedback mail.
pub const FEEDBACK_EMAIL_TO_ANNOTATION: &str = "feedback/email-to";
/// Jira project key tickets are created under.
pub const JIRA_PROJECT_KEY_ANNOTATION: &str = "jira/project-key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub spec: EntitySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<EntityProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Entity {
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Display title, falling back to the entity name.
    pub fn display_title(&self) -> &str {
        self.metadata
            .title
            .as_deref()
            .unwrap_or(&self.metadata.name)
    }

    pub fn profile_email(&self) -> Option<&str> {
        self.spec
            .profile
            .as_ref()
            .and_then(|profile| profile.email.as_deref())
    }
}
