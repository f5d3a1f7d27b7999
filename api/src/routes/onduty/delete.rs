//! On-duty deletion handler.

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::{ApiError, ApiResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use util::state::AppState;

/// DELETE /onduty/requests/{request_id}
///
/// Deletes one of the caller's own requests while it is still pending, along
/// with its uploaded document if present.
///
/// ### Responses
/// - `200 OK` on success.
/// - `400 Bad Request` when the request has already been reviewed.
/// - `404 Not Found` when the request does not exist or belongs to another
///   student.
pub async fn delete_request(
    State(app_state): State<AppState>,
    Path(request_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    services::on_duty::delete_request(app_state.db(), claims.sub, request_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::<Empty>::success(
            Empty,
            "On-duty request deleted successfully",
        )),
    ))
}
