use async_trait::async_trait;
use uuid::Uuid;

use crate::feedback::models::{FeedbackFilter, FeedbackPage, FeedbackRecord};
use opine_common::error::OpineResult;

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn create(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord>;

    async fn get(&self, feedback_id: Uuid) -> OpineResult<Option<FeedbackRecord>>;

    async fn exists(&self, feedback_id: Uuid) -> OpineResult<bool>;

    async fn list(&self, filter: FeedbackFilter) -> OpineResult<FeedbackPage>;

    /// Update the mutable fields (summary, description, tag, url, updated_by)
    /// of an existing record. Returns `NotFound` if the id does not exist.
    async fn update(&self, record: FeedbackRecord) -> OpineResult<FeedbackRecord>;

    async fn delete(&self, feedback_id: Uuid) -> OpineResult<()>;

    /// Backfill the ticket URL after a tracker ticket has been filed.
    /// Keyed by feedback id, so replaying the same backfill is harmless.
    async fn set_ticket_url(&self, feedback_id: Uuid, ticket_url: &str) -> OpineResult<()>;
}
