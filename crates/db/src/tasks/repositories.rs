use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::tasks::models::{NewNotifyTask, NotifyTask};
use opine_common::error::OpineResult;

#[async_trait]
pub trait NotifyTaskRepository: Send + Sync {
    /// Record a new pending task, runnable immediately.
    async fn enqueue(&self, task: NewNotifyTask) -> OpineResult<NotifyTask>;

    /// Atomically claim the oldest runnable task, marking it 'running' and
    /// incrementing its attempt counter. Returns `None` when nothing is due.
    /// Concurrent claimers never receive the same task.
    async fn claim(&self) -> OpineResult<Option<NotifyTask>>;

    async fn mark_completed(&self, id: Uuid) -> OpineResult<()>;

    /// Record a failure. With `retry_at` the task goes back to 'pending' and
    /// becomes claimable at that time; without it the task is parked as
    /// 'failed' and never retried.
    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> OpineResult<()>;

    async fn get(&self, id: Uuid) -> OpineResult<Option<NotifyTask>>;

    async fn list_for_feedback(&self, feedback_id: Uuid) -> OpineResult<Vec<NotifyTask>>;
}
