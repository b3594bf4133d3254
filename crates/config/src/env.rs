use opine_common::error::{OpineError, OpineResult};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// A Jira server the service may file tickets against.
///
/// Configured via `JIRA_INTEGRATIONS`, a JSON array of
/// `{"host": "...", "token": "..."}` objects.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraIntegration {
    pub host: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub catalog_base_url: String,
    pub catalog_token: Option<String>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub app_title: String,
    pub summary_limit: usize,
    pub base_entity_ref: Option<String>,
    pub jira_integrations: Vec<JiraIntegration>,
    pub mail_relay_url: Option<String>,
    pub mail_from: Option<String>,
    pub http_timeout_secs: u64,
    pub worker_poll_secs: u64,
    pub worker_max_attempts: i32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> OpineResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_var("DATABASE_URL")?,
            catalog_base_url: get_var("CATALOG_BASE_URL")?,
            catalog_token: env::var("CATALOG_TOKEN").ok(),
            host: get_var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "8080")?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            app_title: get_var_or("APP_TITLE", "Feedback"),
            summary_limit: parse_var("SUMMARY_LIMIT", "255")?,
            base_entity_ref: env::var("BASE_ENTITY_REF").ok(),
            jira_integrations: parse_jira_integrations()?,
            mail_relay_url: env::var("MAIL_RELAY_URL").ok(),
            mail_from: env::var("MAIL_FROM").ok(),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", "30")?,
            worker_poll_secs: parse_var("WORKER_POLL_SECS", "2")?,
            worker_max_attempts: parse_var("WORKER_MAX_ATTEMPTS", "5")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pick the Jira integration for an entity's `feedback/host` annotation.
    ///
    /// Prefers the entry whose host matches the annotation; falls back to the
    /// first configured entry when the annotation is absent or matches
    /// nothing. Returns `None` only when no integrations are configured.
    pub fn jira_for_host(&self, host: Option<&str>) -> Option<&JiraIntegration> {
        host.and_then(|host| {
            let host = host.trim_end_matches('/');
            self.jira_integrations
                .iter()
                .find(|integration| integration.host.trim_end_matches('/') == host)
        })
        .or_else(|| self.jira_integrations.first())
    }
}

fn get_var(key: &str) -> OpineResult<String> {
    env::var(key).map_err(|_| OpineError::Config(format!("{key} is required but not set")))
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> OpineResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    get_var_or(key, default)
        .parse()
        .map_err(|e| OpineError::Config(format!("invalid {key}: {e}")))
}

fn parse_jira_integrations() -> OpineResult<Vec<JiraIntegration>> {
    match env::var("JIRA_INTEGRATIONS") {
        Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map_err(|e| OpineError::Config(format!("invalid JIRA_INTEGRATIONS: {e}"))),
        _ => Ok(Vec::new()),
    }
}
