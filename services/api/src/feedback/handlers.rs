use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use opine_common::error::OpineError;
use opine_common::types::EntityRef;
use opine_db::feedback::models::{FeedbackFilter, FeedbackRecord};
use opine_db::tasks::models::{NewNotifyTask, TaskKind};

use crate::catalog::models::{
    Entity, FEEDBACK_EMAIL_TO_ANNOTATION, FEEDBACK_HOST_ANNOTATION, FEEDBACK_TYPE_ANNOTATION,
};
use crate::error::ApiError;
use crate::feedback::formatters;
use crate::feedback::requests::{
    CreateFeedbackRequest, ListFeedbackQuery, TicketQuery, UpdateFeedbackRequest,
};
use crate::feedback::responses::{FeedbackResponse, ListFeedbackResponse, TicketDetailsResponse};
use crate::AppState;

fn parse_entity_ref(value: &str) -> Result<EntityRef, OpineError> {
    value.parse::<EntityRef>().map_err(OpineError::Validation)
}

async fn resolve_entity(state: &AppState, entity_ref: &EntityRef) -> Result<Entity, OpineError> {
    state
        .catalog
        .entity(entity_ref)
        .await?
        .ok_or_else(|| OpineError::NotFound(format!("entity not found: {entity_ref}")))
}

fn annotation_is(entity: &Entity, key: &str, expected: &str) -> bool {
    entity
        .annotation(key)
        .map_or(false, |value| value.eq_ignore_ascii_case(expected))
}

/// Queue the side effects a submission asks for. The record is already
/// stored, so enqueue failures are logged rather than surfaced to the client.
async fn enqueue_notify_tasks(state: &AppState, record: &FeedbackRecord, entity: &Entity) {
    let mut kinds = Vec::new();
    if annotation_is(entity, FEEDBACK_TYPE_ANNOTATION, "JIRA")
        && !formatters::is_positive_tag(&record.tag)
    {
        kinds.push(TaskKind::Ticket);
    }
    if annotation_is(entity, FEEDBACK_TYPE_ANNOTATION, "MAIL")
        || entity.annotation(FEEDBACK_EMAIL_TO_ANNOTATION).is_some()
    {
        kinds.push(TaskKind::Mail);
    }

    for kind in kinds {
        let task = NewNotifyTask {
            feedback_id: record.feedback_id,
            kind,
        };
        if let Err(err) = state.task_repo.enqueue(task).await {
            tracing::error!(
                feedback_id = %record.feedback_id,
                kind = kind.as_str(),
                error = %err,
                "failed to enqueue notify task"
            );
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────

pub async fn create_feedback(
    State(state): State<AppState>,
    Json(body): Json<CreateFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = body.summary.trim().to_string();
    if summary.is_empty() {
        return Err(ApiError(OpineError::Validation(
            "summary must not be empty".to_string(),
        )));
    }

    let project_ref = body
        .project_id
        .as_deref()
        .or(state.config.base_entity_ref.as_deref())
        .ok_or_else(|| {
            ApiError(OpineError::Validation(
                "projectId is required when no base entity is configured".to_string(),
            ))
        })?;
    let entity_ref = parse_entity_ref(project_ref)?;
    let entity = resolve_entity(&state, &entity_ref).await?;

    let (summary, description) = if summary.chars().count() > state.config.summary_limit {
        let mut description = summary;
        let extra = body.description.trim();
        if !extra.is_empty() {
            description.push_str("\n\n");
            description.push_str(extra);
        }
        let summary = formatters::synthesized_summary(
            body.feedback_type,
            &body.created_by,
            entity.display_title(),
        );
        (summary, description)
    } else {
        (summary, body.description.trim().to_string())
    };

    let now = chrono::Utc::now();
    let record = FeedbackRecord {
        feedback_id: Uuid::new_v4(),
        project_id: entity_ref.to_string(),
        created_by: body.created_by.clone(),
        updated_by: body.created_by,
        summary,
        description,
        tag: body.tag,
        feedback_type: body.feedback_type,
        url: body.url,
        ticket_url: None,
        created_at: now,
        updated_at: now,
    };

    let created = state.feedback_repo.create(record).await?;
    enqueue_notify_tasks(&state, &created, &entity).await;

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(created))))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<ListFeedbackQuery>,
) -> Result<Json<ListFeedbackResponse>, ApiError> {
    // "all" and absent both mean unfiltered. Stored project ids are
    // canonical entity refs, so normalize the filter the same way.
    let project_id = match query.project_id.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<EntityRef>()
                .map(|entity_ref| entity_ref.to_string())
                .unwrap_or_else(|_| raw.to_string()),
        ),
    };

    let limit = query.limit.unwrap_or(25);
    let offset = query.offset.unwrap_or(0);
    let filter = FeedbackFilter {
        project_id,
        search: query.query,
        limit: Some(limit),
        offset: Some(offset),
    };

    let page = state.feedback_repo.list(filter).await?;
    let data: Vec<FeedbackResponse> = page.items.into_iter().map(FeedbackResponse::from).collect();
    let count = data.len();
    Ok(Json(ListFeedbackResponse {
        data,
        count,
        total: page.total,
        offset,
        limit,
    }))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let record = state
        .feedback_repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError(OpineError::NotFound(format!("feedback not found: {id}"))))?;
    Ok(Json(FeedbackResponse::from(record)))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let existing = state
        .feedback_repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError(OpineError::NotFound(format!("feedback not found: {id}"))))?;

    let summary = body.summary.unwrap_or(existing.summary);
    if summary.trim().is_empty() {
        return Err(ApiError(OpineError::Validation(
            "summary must not be empty".to_string(),
        )));
    }

    let record = FeedbackRecord {
        feedback_id: existing.feedback_id,
        project_id: existing.project_id,
        created_by: existing.created_by,
        updated_by: body.updated_by.unwrap_or(existing.updated_by),
        summary,
        description: body.description.unwrap_or(existing.description),
        tag: body.tag.unwrap_or(existing.tag),
        feedback_type: existing.feedback_type,
        url: body.url.unwrap_or(existing.url),
        ticket_url: existing.ticket_url,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now(),
    };

    let updated = state.feedback_repo.update(record).await?;
    Ok(Json(FeedbackResponse::from(updated)))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.feedback_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_ticket_details(
    State(state): State<AppState>,
    Path(_id): Path<Uuid>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<TicketDetailsResponse>, ApiError> {
    let ticket_id = query.ticket_id.ok_or_else(|| {
        ApiError(OpineError::Validation(
            "ticketId query parameter is required".to_string(),
        ))
    })?;
    let project_id = query.project_id.ok_or_else(|| {
        ApiError(OpineError::Validation(
            "projectId query parameter is required".to_string(),
        ))
    })?;

    let entity_ref = parse_entity_ref(&project_id)?;
    let entity = resolve_entity(&state, &entity_ref).await?;

    if !annotation_is(&entity, FEEDBACK_TYPE_ANNOTATION, "JIRA") {
        return Err(ApiError(OpineError::NotFound(
            "entity is not configured for jira feedback".to_string(),
        )));
    }

    let integration = state
        .config
        .jira_for_host(entity.annotation(FEEDBACK_HOST_ANNOTATION))
        .ok_or_else(|| {
            ApiError(OpineError::NotFound(
                "no jira integration configured".to_string(),
            ))
        })?;

    let details = state
        .tickets
        .ticket_details(integration, &ticket_id)
        .await?
        .ok_or_else(|| ApiError(OpineError::NotFound(format!("ticket not found: {ticket_id}"))))?;

    Ok(Json(TicketDetailsResponse {
        status: details.status,
        assignee: details.assignee,
    }))
}
