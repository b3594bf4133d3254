use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use opine_common::error::{OpineError, OpineResult};
use opine_common::types::EntityRef;
use opine_config::AppConfig;
use opine_db::feedback::models::FeedbackRecord;
use opine_db::feedback::repositories::FeedbackRepository;
use opine_db::tasks::models::{NotifyTask, TaskKind};
use opine_db::tasks::repositories::NotifyTaskRepository;

use crate::catalog::client::CatalogClient;
use crate::catalog::models::{
    Entity, FEEDBACK_EMAIL_TO_ANNOTATION, FEEDBACK_HOST_ANNOTATION, JIRA_PROJECT_KEY_ANNOTATION,
};
use crate::feedback::formatters;
use crate::jira::client::TicketClient;
use crate::jira::models::NewTicket;
use crate::mail::notifier::{MailMessage, MailNotifier};

// NotFound covers catalog lag between submission and task run.
fn is_transient(error: &OpineError) -> bool {
    matches!(
        error,
        OpineError::Integration(_) | OpineError::Database(_) | OpineError::NotFound(_)
    )
}

/// Drains the notify queue: claims due tasks, runs the side effect they
/// describe, and records completion or schedules a retry.
pub struct NotifyWorker {
    config: Arc<AppConfig>,
    feedback_repo: Arc<dyn FeedbackRepository>,
    task_repo: Arc<dyn NotifyTaskRepository>,
    catalog: Arc<dyn CatalogClient>,
    tickets: Arc<dyn TicketClient>,
    mailer: Arc<dyn MailNotifier>,
}

impl NotifyWorker {
    pub fn new(
        config: Arc<AppConfig>,
        feedback_repo: Arc<dyn FeedbackRepository>,
        task_repo: Arc<dyn NotifyTaskRepository>,
        catalog: Arc<dyn CatalogClient>,
        tickets: Arc<dyn TicketClient>,
        mailer: Arc<dyn MailNotifier>,
    ) -> Self {
        Self {
            config,
            feedback_repo,
            task_repo,
            catalog,
            tickets,
            mailer,
        }
    }

    pub async fn run(self) {
        let poll = Duration::from_secs(self.config.worker_poll_secs.max(1));
        tracing::info!(poll_secs = poll.as_secs(), "notify worker started");

        loop {
            match self.run_once().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(poll).await,
                Err(err) => {
                    tracing::error!(error = %err, "notify worker iteration failed");
                    tokio::time::sleep(poll).await;
                }
            }
        }
    }

    /// Claim and process a single task. Returns false when nothing was due.
    pub async fn run_once(&self) -> OpineResult<bool> {
        let task = match self.task_repo.claim().await? {
            Some(task) => task,
            None => return Ok(false),
        };

        match self.process(&task).await {
            Ok(()) => self.task_repo.mark_completed(task.id).await?,
            Err(err) => {
                let retry_at = self.retry_at(&task, &err);
                tracing::warn!(
                    task_id = %task.id,
                    kind = task.kind.as_str(),
                    attempts = task.attempts,
                    retrying = retry_at.is_some(),
                    error = %err,
                    "notify task failed"
                );
                self.task_repo
                    .mark_failed(task.id, &err.to_string(), retry_at)
                    .await?;
            }
        }
        Ok(true)
    }

    /// Transient failures back off exponentially until the attempt budget is
    /// spent; everything else parks the task immediately.
    fn retry_at(&self, task: &NotifyTask, error: &OpineError) -> Option<DateTime<Utc>> {
        if !is_transient(error) || task.attempts >= self.config.worker_max_attempts {
            return None;
        }
        let backoff_secs = std::cmp::min(1u64 << task.attempts.min(30), 300);
        Some(Utc::now() + chrono::Duration::seconds(backoff_secs as i64))
    }

    async fn process(&self, task: &NotifyTask) -> OpineResult<()> {
        let record = match self.feedback_repo.get(task.feedback_id).await? {
            Some(record) => record,
            None => {
                tracing::info!(
                    feedback_id = %task.feedback_id,
                    "feedback removed before task ran, skipping"
                );
                return Ok(());
            }
        };

        // Stored project ids are canonical entity refs.
        let entity_ref = record
            .project_id
            .parse::<EntityRef>()
            .map_err(OpineError::Internal)?;
        let entity = self
            .catalog
            .entity(&entity_ref)
            .await?
            .ok_or_else(|| OpineError::NotFound(format!("entity not found: {entity_ref}")))?;

        match task.kind {
            TaskKind::Ticket => self.file_ticket(&record, &entity).await,
            TaskKind::Mail => self.send_mail(&record, &entity).await,
        }
    }

    async fn file_ticket(&self, record: &FeedbackRecord, entity: &Entity) -> OpineResult<()> {
        // Retried tasks must not file twice.
        if record.ticket_url.is_some() {
            tracing::info!(feedback_id = %record.feedback_id, "ticket already filed, skipping");
            return Ok(());
        }

        let integration = self
            .config
            .jira_for_host(entity.annotation(FEEDBACK_HOST_ANNOTATION))
            .ok_or_else(|| OpineError::Config("no jira integration configured".to_string()))?;
        let project_key = entity
            .annotation(JIRA_PROJECT_KEY_ANNOTATION)
            .ok_or_else(|| {
                OpineError::Validation(format!(
                    "entity {} has no jira/project-key annotation",
                    record.project_id
                ))
            })?;

        let assignee = match self.reporter_email(&record.created_by).await {
            Some(email) => match self.tickets.find_user_by_email(integration, &email).await {
                Ok(user) => user,
                Err(err) => {
                    tracing::warn!(error = %err, "tracker user lookup failed, filing unassigned");
                    None
                }
            },
            None => None,
        };

        let ticket = NewTicket {
            project_key: project_key.to_string(),
            summary: record.summary.clone(),
            description: formatters::ticket_description(record),
            tag: record.tag.clone(),
            feedback_type: record.feedback_type,
            reporter: record.created_by.clone(),
            assignee,
        };
        let created = self.tickets.create_ticket(integration, ticket).await?;

        let ticket_url = format!(
            "{}/browse/{}",
            integration.host.trim_end_matches('/'),
            created.key
        );
        self.feedback_repo
            .set_ticket_url(record.feedback_id, &ticket_url)
            .await?;

        tracing::info!(
            feedback_id = %record.feedback_id,
            ticket = %created.key,
            "ticket filed"
        );
        Ok(())
    }

    async fn send_mail(&self, record: &FeedbackRecord, entity: &Entity) -> OpineResult<()> {
        let recipients: Vec<String> = entity
            .annotation(FEEDBACK_EMAIL_TO_ANNOTATION)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if recipients.is_empty() {
            tracing::info!(
                feedback_id = %record.feedback_id,
                "no mail recipients configured, skipping"
            );
            return Ok(());
        }

        let message = MailMessage {
            to: recipients,
            from: None,
            reply_to: self.reporter_email(&record.created_by).await,
            subject: formatters::mail_subject(record, entity.display_title()),
            body: formatters::mail_body(record, entity.display_title(), &self.config.app_title),
        };
        self.mailer.send(&message).await?;

        tracing::info!(feedback_id = %record.feedback_id, "notification mail sent");
        Ok(())
    }

    /// Email from the reporter's catalog profile. Lookup failures degrade to
    /// `None` rather than failing the task.
    async fn reporter_email(&self, created_by: &str) -> Option<String> {
        let user_ref = created_by.parse::<EntityRef>().ok()?;
        match self.catalog.entity(&user_ref).await {
            Ok(entity) => entity.and_then(|e| e.profile_email().map(str::to_string)),
            Err(err) => {
                tracing::warn!(user = created_by, error = %err, "reporter lookup failed");
                None
            }
        }
    }
}
