//! In-memory doubles shared by the endpoint and worker tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use chrono::Utc;
use uuid::Uuid;

use opine_common::error::{OpineError, OpineResult};
use opine_common::types::EntityRef;
use opine_config::{AppConfig, JiraIntegration};
use opine_db::feedback::models::{FeedbackFilter, FeedbackPage, FeedbackRecord};
use opine_db::feedback::repositories::FeedbackRepository;
use opine_db::tasks::models::{NewNotifyTask, NotifyTask, TaskStatus};
use opine_db::tasks::repositories::NotifyTaskRepository;

use crate::catalog::client::CatalogClient;
use crate::catalog::models::{Entity, EntityMetadata, EntityProfile, EntitySpec};
use crate::jira::client::TicketClient;
use crate::jira::models::{CreatedTicket, NewTicket, TicketDetails};
use crate::mail::notifier::{MailMessage, MailNotifier};
use crate::AppState;

// ── Repositories ────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    records: Mutex<Vec<FeedbackRecord>>,
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn create(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, feedback_id: Uuid) -> OpineResult<Option<FeedbackRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.feedback_id == feedback_id)
            .cloned())
    }

    async fn exists(&self, feedback_id: Uuid) -> OpineResult<bool> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().any(|r| r.feedback_id == feedback_id))
    }

    async fn list(&self, filter: FeedbackFilter) -> OpineResult<FeedbackPage> {
        let records = self.records.lock().unwrap();
        let needle = filter.search.as_deref().unwrap_or_default().to_lowercase();
        let mut matches: Vec<FeedbackRecord> = records
            .iter()
            .filter(|r| {
                filter
                    .project_id
                    .as_deref()
                    .map_or(true, |p| r.project_id == p)
            })
            .filter(|r| {
                needle.is_empty()
                    || r.summary.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
                    || r.tag.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as i64;
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.unwrap_or(25).max(0) as usize;
        let items = matches.into_iter().skip(offset).take(limit).collect();
        Ok(FeedbackPage { items, total })
    }

    async fn update(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord> {
        let mut records = self.records.lock().unwrap();
        let stored = records
            .iter_mut()
            .find(|r| r.feedback_id == record.feedback_id)
            .ok_or_else(|| {
                OpineError::NotFound(format!("feedback not found: {}", record.feedback_id))
            })?;
        stored.summary = record.summary;
        stored.description = record.description;
        stored.tag = record.tag;
        stored.url = record.url;
        stored.updated_by = record.updated_by;
        stored.updated_at = record.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, feedback_id: Uuid) -> OpineResult<()> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.feedback_id != feedback_id);
        if records.len() == before {
            return Err(OpineError::NotFound(format!(
                "feedback not found: {feedback_id}"
            )));
        }
        Ok(())
    }

    async fn set_ticket_url(&self, feedback_id: Uuid, ticket_url: &str) -> OpineResult<()> {
        let mut records = self.records.lock().unwrap();
        let stored = records
            .iter_mut()
            .find(|r| r.feedback_id == feedback_id)
            .ok_or_else(|| OpineError::NotFound(format!("feedback not found: {feedback_id}")))?;
        stored.ticket_url = Some(ticket_url.to_string());
        stored.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotifyTaskRepository {
    tasks: Mutex<Vec<NotifyTask>>,
}

impl InMemoryNotifyTaskRepository {
    pub fn snapshot(&self) -> Vec<NotifyTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyTaskRepository for InMemoryNotifyTaskRepository {
    async fn enqueue(&self, task: NewNotifyTask) -> OpineResult<NotifyTask> {
        let now = Utc::now();
        let task = NotifyTask {
            id: Uuid::new_v4(),
            feedback_id: task.feedback_id,
            kind: task.kind,
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
            run_after: now,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn claim(&self) -> OpineResult<Option<NotifyTask>> {
        let mut tasks = self.tasks.lock().unwrap();
        let now = Utc::now();
        let task = tasks
            .iter_mut()
            .filter(|t| t.status == TaskStatus::Pending && t.run_after <= now)
            .min_by_key(|t| (t.run_after, t.created_at));
        let task = match task {
            Some(task) => task,
            None => return Ok(None),
        };
        task.status = TaskStatus::Running;
        task.attempts += 1;
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn mark_completed(&self, id: Uuid) -> OpineResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| OpineError::NotFound(format!("notify task not found: {id}")))?;
        task.status = TaskStatus::Completed;
        task.last_error = None;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        retry_at: Option<chrono::DateTime<Utc>>,
    ) -> OpineResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| OpineError::NotFound(format!("notify task not found: {id}")))?;
        match retry_at {
            Some(at) => {
                task.status = TaskStatus::Pending;
                task.run_after = at;
            }
            None => task.status = TaskStatus::Failed,
        }
        task.last_error = Some(error_message.to_string());
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: Uuid) -> OpineResult<Option<NotifyTask>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_for_feedback(&self, feedback_id: Uuid) -> OpineResult<Vec<NotifyTask>> {
        let tasks = self.tasks.lock().unwrap();
        let mut matches: Vec<NotifyTask> = tasks
            .iter()
            .filter(|t| t.feedback_id == feedback_id)
            .cloned()
            .collect();
        matches.sort_by_key(|t| t.created_at);
        Ok(matches)
    }
}

// ── Clients ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct StaticCatalogClient {
    entities: Mutex<HashMap<String, Entity>>,
}

impl StaticCatalogClient {
    pub fn insert(&self, entity_ref: &str, entity: Entity) {
        self.entities
            .lock()
            .unwrap()
            .insert(entity_ref.to_string(), entity);
    }
}

#[async_trait]
impl CatalogClient for StaticCatalogClient {
    async fn entity(&self, entity_ref: &EntityRef) -> OpineResult<Option<Entity>> {
        let entities = self.entities.lock().unwrap();
        Ok(entities.get(&entity_ref.to_string()).cloned())
    }
}

/// Records filed tickets; keys follow the `{project-key}-01` mock contract.
#[derive(Default)]
pub struct RecordingTicketClient {
    created: Mutex<Vec<NewTicket>>,
    fail_create: Mutex<Option<String>>,
    user: Mutex<Option<String>>,
    details: Mutex<Option<TicketDetails>>,
}

impl RecordingTicketClient {
    pub fn created(&self) -> Vec<NewTicket> {
        self.created.lock().unwrap().clone()
    }

    pub fn fail_create(&self, message: &str) {
        *self.fail_create.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_user(&self, display_name: &str) {
        *self.user.lock().unwrap() = Some(display_name.to_string());
    }

    pub fn set_details(&self, details: TicketDetails) {
        *self.details.lock().unwrap() = Some(details);
    }
}

#[async_trait]
impl TicketClient for RecordingTicketClient {
    async fn create_ticket(
        &self,
        _integration: &JiraIntegration,
        ticket: NewTicket,
    ) -> OpineResult<CreatedTicket> {
        if let Some(message) = self.fail_create.lock().unwrap().clone() {
            return Err(OpineError::Integration(format!("jira: {message}")));
        }
        let key = format!("{}-01", ticket.project_key);
        self.created.lock().unwrap().push(ticket);
        Ok(CreatedTicket { key })
    }

    async fn find_user_by_email(
        &self,
        _integration: &JiraIntegration,
        _email: &str,
    ) -> OpineResult<Option<String>> {
        Ok(self.user.lock().unwrap().clone())
    }

    async fn ticket_details(
        &self,
        _integration: &JiraIntegration,
        _ticket_id: &str,
    ) -> OpineResult<Option<TicketDetails>> {
        Ok(self.details.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingMailNotifier {
    sent: Mutex<Vec<MailMessage>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingMailNotifier {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl MailNotifier for RecordingMailNotifier {
    async fn send(&self, message: &MailMessage) -> OpineResult<()> {
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(OpineError::Integration(format!("mail: {reason}")));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ── Builders ────────────────────────────────────────────────────

pub fn catalog_entity(
    kind: &str,
    name: &str,
    title: Option<&str>,
    annotations: &[(&str, &str)],
) -> Entity {
    Entity {
        kind: kind.to_string(),
        metadata: EntityMetadata {
            name: name.to_string(),
            namespace: "default".to_string(),
            title: title.map(str::to_string),
            annotations: annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        },
        spec: EntitySpec::default(),
    }
}

pub fn user_entity(name: &str, email: &str) -> Entity {
    let mut entity = catalog_entity("user", name, None, &[]);
    entity.spec = EntitySpec {
        profile: Some(EntityProfile {
            email: Some(email.to_string()),
            display_name: None,
        }),
    };
    entity
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/unused".to_string(),
        catalog_base_url: "http://127.0.0.1:7007/api/catalog".to_string(),
        catalog_token: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        log_level: "info".to_string(),
        app_title: "Opine".to_string(),
        summary_limit: 255,
        base_entity_ref: None,
        jira_integrations: vec![JiraIntegration {
            host: "https://jira.example.com".to_string(),
            token: "fake-token".to_string(),
        }],
        mail_relay_url: None,
        mail_from: Some("feedback@example.com".to_string()),
        http_timeout_secs: 5,
        worker_poll_secs: 1,
        worker_max_attempts: 5,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub task_repo: Arc<InMemoryNotifyTaskRepository>,
    pub catalog: Arc<StaticCatalogClient>,
    pub tickets: Arc<RecordingTicketClient>,
}

pub fn test_app(config: AppConfig) -> TestApp {
    let feedback_repo = Arc::new(InMemoryFeedbackRepository::default());
    let task_repo = Arc::new(InMemoryNotifyTaskRepository::default());
    let catalog = Arc::new(StaticCatalogClient::default());
    let tickets = Arc::new(RecordingTicketClient::default());

    let state = AppState {
        config: Arc::new(config),
        feedback_repo,
        task_repo: task_repo.clone(),
        catalog: catalog.clone(),
        tickets: tickets.clone(),
    };

    TestApp {
        state,
        task_repo,
        catalog,
        tickets,
    }
}

pub async fn read_body(resp: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_body_string(resp: axum::http::Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
