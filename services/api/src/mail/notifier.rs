use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use opine_common::error::{OpineError, OpineResult};

/// Outbound message handed to the mail relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailNotifier: Send + Sync {
    async fn send(&self, message: &MailMessage) -> OpineResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl From<MailError> for OpineError {
    fn from(err: MailError) -> Self {
        OpineError::Integration(format!("mail: {err}"))
    }
}

/// Sends mail by posting the message to an HTTP relay endpoint.
#[derive(Clone)]
pub struct RelayMailNotifier {
    client: Client,
    relay_url: String,
    from: Option<String>,
}

impl RelayMailNotifier {
    pub fn new(
        relay_url: &str,
        from: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
            from,
        })
    }
}

#[async_trait]
impl MailNotifier for RelayMailNotifier {
    async fn send(&self, message: &MailMessage) -> OpineResult<()> {
        let mut message = message.clone();
        if message.from.is_none() {
            message.from = self.from.clone();
        }

        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(MailError::RequestError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::HttpError { status, body }.into());
        }
        Ok(())
    }
}

/// Stand-in used when no relay is configured. Sending always fails, which
/// parks the task instead of retrying it.
pub struct DisabledMailNotifier;

#[async_trait]
impl MailNotifier for DisabledMailNotifier {
    async fn send(&self, _message: &MailMessage) -> OpineResult<()> {
        Err(OpineError::Config("mail relay is not configured".to_string()))
    }
}
