//! On-duty request creation and attendance marking handlers.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::MultipartForm;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use services::ServiceError;
use services::on_duty::{NewOnDutyRequest, OnDutyCheckIn};
use util::state::AppState;

/// POST /onduty/requests
///
/// Submits an on-duty leave request. Multipart form:
/// - `college_name` (required)
/// - `reason` (required)
/// - `start_date` / `end_date` (required, `YYYY-MM-DD`)
/// - `start_time` / `end_time` (optional, `HH:MM` or `HH:MM:SS`)
/// - `document` (optional file)
///
/// ### Responses
/// - `201 Created` with the pending request.
/// - `400 Bad Request` on a malformed form or an invalid window.
/// - `403 Forbidden` when the student profile is not approved.
pub async fn create_request(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = MultipartForm::read(multipart)
        .await
        .map_err(ServiceError::validation)?;

    let input = NewOnDutyRequest {
        college_name: form
            .require_text("college_name")
            .map_err(ServiceError::validation)?
            .to_owned(),
        reason: form
            .require_text("reason")
            .map_err(ServiceError::validation)?
            .to_owned(),
        start_date: form
            .require_date("start_date")
            .map_err(ServiceError::validation)?,
        start_time: form.time("start_time").map_err(ServiceError::validation)?,
        end_date: form
            .require_date("end_date")
            .map_err(ServiceError::validation)?,
        end_time: form.time("end_time").map_err(ServiceError::validation)?,
        document: form.file("document"),
    };

    let request =
        services::on_duty::create_request(app_state.db(), claims.sub, input, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            request,
            "On-duty request submitted successfully",
        )),
    ))
}

/// POST /onduty/attendance
///
/// Marks attendance for today against an approved on-duty request.
/// Multipart form:
/// - `on_duty_request_id` (required)
/// - `latitude` / `longitude` (required)
/// - `address`, `qr_data` (optional)
/// - `selfie` (optional file)
///
/// ### Responses
/// - `201 Created` with the attendance row.
/// - `400 Bad Request` when the request is not approved or today falls
///   outside the window.
/// - `409 Conflict` when attendance is already marked for today.
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = MultipartForm::read(multipart)
        .await
        .map_err(ServiceError::validation)?;

    let input = OnDutyCheckIn {
        on_duty_request_id: form
            .require_parsed("on_duty_request_id")
            .map_err(ServiceError::validation)?,
        latitude: form
            .require_parsed("latitude")
            .map_err(ServiceError::validation)?,
        longitude: form
            .require_parsed("longitude")
            .map_err(ServiceError::validation)?,
        address: form.text("address").map(str::to_owned),
        qr_data: form.text("qr_data").map(str::to_owned),
        selfie: form.file("selfie"),
    };

    let attendance =
        services::on_duty::mark_attendance(app_state.db(), claims.sub, input, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            attendance,
            "On-duty attendance marked successfully",
        )),
    ))
}
