//! Event deletion handler.

use crate::auth::guards::Empty;
use crate::response::{ApiError, ApiResponse};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::event::Entity as EventEntity;
use sea_orm::EntityTrait;
use services::ServiceError;
use util::state::AppState;

/// DELETE /events/{event_id}
///
/// Deletes an event. Admin only. Participant and attendance rows are removed
/// by the cascading foreign keys.
///
/// ### Responses
/// - `200 OK` on success.
/// - `404 Not Found` for an unknown event.
pub async fn delete_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = EventEntity::delete_by_id(event_id)
        .exec(app_state.db())
        .await
        .map_err(ServiceError::from)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::not_found("event not found").into());
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::<Empty>::success(
            Empty,
            "Event deleted successfully",
        )),
    ))
}
