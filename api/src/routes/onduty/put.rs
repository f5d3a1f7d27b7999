//! On-duty review handler.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::onduty::common::ReviewRequestBody;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use services::on_duty::ReviewDecision;
use util::state::AppState;

/// PUT /onduty/admin/requests/{request_id}
///
/// Approves or rejects a pending request. Admin only. Rejection requires a
/// reason; both outcomes are terminal.
///
/// ### Request Body
/// ```json
/// {
///   "status": "rejected",
///   "rejectionReason": "insufficient documentation"
/// }
/// ```
///
/// ### Responses
/// - `200 OK` with the reviewed request.
/// - `400 Bad Request` when the request was already reviewed or the reason
///   is missing on rejection.
/// - `404 Not Found` for an unknown request.
pub async fn review_request(
    State(app_state): State<AppState>,
    Path(request_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<ReviewRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = services::on_duty::review_request(
        app_state.db(),
        claims.sub,
        request_id,
        ReviewDecision {
            status: req.status,
            rejection_reason: req.rejection_reason,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            request,
            "On-duty request reviewed successfully",
        )),
    ))
}
