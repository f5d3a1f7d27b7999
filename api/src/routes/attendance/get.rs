//! Attendance listing handlers.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::attendance_log::{Column as LogColumn, Entity as LogEntity};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use services::ServiceError;
use services::students::resolve_student;
use util::state::AppState;

/// GET /attendance/me
///
/// Lists the acting student's attendance logs, newest first.
pub async fn get_my_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = app_state.db();
    let student = resolve_student(db, claims.sub).await?;

    let logs = LogEntity::find()
        .filter(LogColumn::StudentId.eq(student.id))
        .order_by_desc(LogColumn::Timestamp)
        .all(db)
        .await
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(logs, "Attendance retrieved successfully")),
    ))
}

/// GET /attendance/events/{event_id}
///
/// Lists all attendance logs for an event. Admin only.
pub async fn get_event_attendance(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = LogEntity::find()
        .filter(LogColumn::EventId.eq(event_id))
        .order_by_desc(LogColumn::Timestamp)
        .all(app_state.db())
        .await
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(logs, "Attendance retrieved successfully")),
    ))
}
