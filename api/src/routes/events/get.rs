//! Event listing and detail handlers.

use crate::response::{ApiError, ApiResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::event::{
    Column as EventColumn, Entity as EventEntity, Model as EventModel, Status as EventStatus,
};
use db::models::event_participant::{
    self, Column as ParticipantColumn, Entity as ParticipantEntity,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use services::ServiceError;
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilterReq {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub query: Option<String>,
    pub status: Option<EventStatus>,
}

#[derive(Serialize, Default)]
pub struct FilterResponse {
    pub events: Vec<EventModel>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// GET /events
///
/// Retrieves a paginated list of events, newest first.
///
/// # Query Parameters
/// - `page`: (Optional) Page number. Defaults to 1.
/// - `per_page`: (Optional) Items per page. Defaults to 20, capped at 100.
/// - `query`: (Optional) Substring match on the event title.
/// - `status`: (Optional) Filter by lifecycle status.
pub async fn list_events(
    State(app_state): State<AppState>,
    Query(filter): Query<FilterReq>,
) -> Result<impl IntoResponse, ApiError> {
    let db = app_state.db();

    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter.per_page.unwrap_or(20).clamp(1, 100);

    let mut query = EventEntity::find().order_by_desc(EventColumn::CreatedAt);
    if let Some(q) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        query = query.filter(EventColumn::Title.contains(q));
    }
    if let Some(status) = filter.status {
        query = query.filter(EventColumn::Status.eq(status));
    }

    let paginator = query.paginate(db, per_page);
    let total = paginator.num_items().await.map_err(ServiceError::from)?;
    let events = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            FilterResponse {
                events,
                page,
                per_page,
                total,
            },
            "Events retrieved successfully",
        )),
    ))
}

#[derive(Serialize, Default)]
pub struct EventDetailResponse {
    pub event: Option<EventModel>,
    /// Participants currently holding a seat.
    pub seated: u64,
}

/// GET /events/{event_id}
///
/// Retrieves a single event with its current seat count.
pub async fn get_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = app_state.db();

    let event = EventEntity::find_by_id(event_id)
        .one(db)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("event not found"))?;

    let seated = event_participant::Model::count_seated(db, event.id)
        .await
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            EventDetailResponse {
                event: Some(event),
                seated,
            },
            "Event retrieved successfully",
        )),
    ))
}

/// GET /events/{event_id}/participants
///
/// Lists every participant row for an event, oldest registration first.
/// Admin only.
pub async fn list_event_participants(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = app_state.db();

    EventEntity::find_by_id(event_id)
        .one(db)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("event not found"))?;

    let participants = ParticipantEntity::find()
        .filter(ParticipantColumn::EventId.eq(event_id))
        .order_by_asc(ParticipantColumn::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            participants,
            "Participants retrieved successfully",
        )),
    ))
}
