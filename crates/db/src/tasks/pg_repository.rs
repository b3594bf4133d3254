use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::tasks::models::{NewNotifyTask, NotifyTask, TaskKind, TaskStatus};
use crate::tasks::repositories::NotifyTaskRepository;
use opine_common::error::{OpineError, OpineResult};

#[derive(Clone)]
pub struct PgNotifyTaskRepository {
    pool: PgPool,
}

impl PgNotifyTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> OpineResult<NotifyTask> {
        let kind_raw: String = row.get("kind");
        let kind = TaskKind::from_str(&kind_raw).map_err(OpineError::Internal)?;
        let status_raw: String = row.get("status");
        let status = TaskStatus::from_str(&status_raw).map_err(OpineError::Internal)?;

        Ok(NotifyTask {
            id: row.get("id"),
            feedback_id: row.get("feedback_id"),
            kind,
            status,
            attempts: row.get("attempts"),
            last_error: row.get("last_error"),
            run_after: row.get("run_after"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl NotifyTaskRepository for PgNotifyTaskRepository {
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

        sqlx::query(
            "insert into notify_tasks
             (id, feedback_id, kind, status, attempts, last_error, run_after, created_at, updated_at)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(task.id)
        .bind(task.feedback_id)
        .bind(task.kind.as_str())
        .bind(task.status.as_str())
        .bind(task.attempts)
        .bind(&task.last_error)
        .bind(task.run_after)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        Ok(task)
    }

    async fn claim(&self) -> OpineResult<Option<NotifyTask>> {
        // skip locked keeps concurrent workers off the same row
        let row = sqlx::query(
            "update notify_tasks
             set status = 'running', attempts = attempts + 1, updated_at = now()
             where id = (
               select id from notify_tasks
               where status = 'pending' and run_after <= now()
               order by run_after, created_at
               limit 1
               for update skip locked
             )
             returning id, feedback_id, kind, status, attempts, last_error, run_after, created_at, updated_at",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::map_row(r)?)),
            None => Ok(None),
        }
    }

    async fn mark_completed(&self, id: Uuid) -> OpineResult<()> {
        let result = sqlx::query(
            "update notify_tasks
             set status = 'completed', last_error = null, updated_at = now()
             where id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OpineError::NotFound(format!("notify task not found: {id}")));
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> OpineResult<()> {
        let result = match retry_at {
            Some(retry_at) => {
                sqlx::query(
                    "update notify_tasks
                     set status = 'pending', last_error = $1, run_after = $2, updated_at = now()
                     where id = $3",
                )
                .bind(error_message)
                .bind(retry_at)
                .bind(id)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "update notify_tasks
                     set status = 'failed', last_error = $1, updated_at = now()
                     where id = $2",
                )
                .bind(error_message)
                .bind(id)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| OpineError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OpineError::NotFound(format!("notify task not found: {id}")));
        }

        Ok(())
    }

    async fn get(&self, id: Uuid) -> OpineResult<Option<NotifyTask>> {
        let row = sqlx::query(
            "select id, feedback_id, kind, status, attempts, last_error, run_after, created_at, updated_at
             from notify_tasks where id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::map_row(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_feedback(&self, feedback_id: Uuid) -> OpineResult<Vec<NotifyTask>> {
        let rows = sqlx::query(
            "select id, feedback_id, kind, status, attempts, last_error, run_after, created_at, updated_at
             from notify_tasks where feedback_id = $1
             order by created_at",
        )
        .bind(feedback_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }
}
