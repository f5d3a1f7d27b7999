//! On-duty listing handlers.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::onduty::common::StatusFilter;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use util::state::AppState;

/// GET /onduty/requests
///
/// Lists the acting student's own requests, newest first.
pub async fn list_my_requests(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = services::on_duty::list_requests_for_student(app_state.db(), claims.sub).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            requests,
            "On-duty requests retrieved successfully",
        )),
    ))
}

/// GET /onduty/admin/requests
///
/// Lists all requests, optionally filtered by status. Admin only.
pub async fn list_all_requests(
    State(app_state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = services::on_duty::list_requests(app_state.db(), filter.status).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            requests,
            "On-duty requests retrieved successfully",
        )),
    ))
}

/// GET /onduty/requests/{request_id}/attendance
///
/// Lists attendance marked against one of the caller's own requests.
pub async fn list_request_attendance(
    State(app_state): State<AppState>,
    Path(request_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let attendance =
        services::on_duty::list_attendance(app_state.db(), claims.sub, request_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            attendance,
            "On-duty attendance retrieved successfully",
        )),
    ))
}
