use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::feedback::models::{FeedbackFilter, FeedbackPage, FeedbackRecord, FeedbackType};
use crate::feedback::repositories::FeedbackRepository;
use opine_common::error::{OpineError, OpineResult};

#[derive(Clone)]
pub struct PgFeedbackRepository {
    pool: PgPool,
}

impl PgFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> OpineResult<FeedbackRecord> {
        let type_raw: String = row.get("feedback_type");
        let feedback_type = FeedbackType::from_str(&type_raw).map_err(OpineError::Internal)?;

        Ok(FeedbackRecord {
            feedback_id: row.get("feedback_id"),
            project_id: row.get("project_id"),
            created_by: row.get("created_by"),
            updated_by: row.get("updated_by"),
            summary: row.get("summary"),
            description: row.get("description"),
            tag: row.get("tag"),
            feedback_type,
            url: row.get("url"),
            ticket_url: row.get("ticket_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn filtered(select: &str, filter: &FeedbackFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(select);
        let mut clause = " where";

        if let Some(project_id) = &filter.project_id {
            qb.push(clause)
                .push(" project_id = ")
                .push_bind(project_id.clone());
            clause = " and";
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(clause)
                .push(" (summary ilike ")
                .push_bind(pattern.clone())
                .push(" or description ilike ")
                .push_bind(pattern.clone())
                .push(" or tag ilike ")
                .push_bind(pattern)
                .push(")");
        }

        qb
    }
}

#[async_trait]
impl FeedbackRepository for PgFeedbackRepository {
    async fn create(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord> {
        sqlx::query(
            "insert into feedback
             (feedback_id, project_id, created_by, updated_by, summary, description, tag, feedback_type, url, ticket_url, created_at, updated_at)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.feedback_id)
        .bind(&record.project_id)
        .bind(&record.created_by)
        .bind(&record.updated_by)
        .bind(&record.summary)
        .bind(&record.description)
        .bind(&record.tag)
        .bind(record.feedback_type.as_str())
        .bind(&record.url)
        .bind(&record.ticket_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        Ok(record)
    }

    async fn get(&self, feedback_id: Uuid) -> OpineResult<Option<FeedbackRecord>> {
        let row = sqlx::query(
            "select feedback_id, project_id, created_by, updated_by, summary, description, tag, feedback_type, url, ticket_url, created_at, updated_at
             from feedback where feedback_id = $1",
        )
        .bind(feedback_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::map_row(r)?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, feedback_id: Uuid) -> OpineResult<bool> {
        sqlx::query_scalar::<_, bool>("select exists(select 1 from feedback where feedback_id = $1)")
            .bind(feedback_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| OpineError::Database(e.to_string()))
    }

    async fn list(&self, filter: FeedbackFilter) -> OpineResult<FeedbackPage> {
        let mut qb = Self::filtered(
            "select feedback_id, project_id, created_by, updated_by, summary, description, tag, feedback_type, url, ticket_url, created_at, updated_at
             from feedback",
            &filter,
        );
        qb.push(" order by created_at desc");
        qb.push(" limit ").push_bind(filter.limit.unwrap_or(25));
        qb.push(" offset ").push_bind(filter.offset.unwrap_or(0));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OpineError::Database(e.to_string()))?;

        let items = rows
            .into_iter()
            .map(Self::map_row)
            .collect::<OpineResult<Vec<_>>>()?;

        let mut count_qb = Self::filtered("select count(*) from feedback", &filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| OpineError::Database(e.to_string()))?;

        Ok(FeedbackPage { items, total })
    }

    async fn update(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord> {
        let result = sqlx::query(
            "update feedback
             set summary = $1, description = $2, tag = $3, url = $4, updated_by = $5, updated_at = $6
             where feedback_id = $7",
        )
        .bind(&record.summary)
        .bind(&record.description)
        .bind(&record.tag)
        .bind(&record.url)
        .bind(&record.updated_by)
        .bind(record.updated_at)
        .bind(record.feedback_id)
        .execute(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OpineError::NotFound(format!(
                "feedback not found: {}",
                record.feedback_id
            )));
        }

        Ok(record)
    }

    async fn delete(&self, feedback_id: Uuid) -> OpineResult<()> {
        let result = sqlx::query("delete from feedback where feedback_id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await
            .map_err(|e| OpineError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OpineError::NotFound(format!(
                "feedback not found: {feedback_id}"
            )));
        }

        Ok(())
    }

    async fn set_ticket_url(&self, feedback_id: Uuid, ticket_url: &str) -> OpineResult<()> {
        let result = sqlx::query(
            "update feedback set ticket_url = $1, updated_at = now() where feedback_id = $2",
        )
        .bind(ticket_url)
        .bind(feedback_id)
        .execute(&self.pool)
        .await
        .map_err(|e| OpineError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OpineError::NotFound(format!(
                "feedback not found: {feedback_id}"
            )));
        }

        Ok(())
    }
}
