//! QR check-in and photo-proof upload handlers.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::attendance::common::{CheckInRequest, CheckInResponse, UploadPhotoRequest};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use services::attendance::CheckInInput;
use services::proof::PhotoProofInput;
use util::state::AppState;

/// POST /attendance/checkin
///
/// Handles a QR scan. The event id is taken from the scanned payload; the
/// scan is classified as on-time or late against the event's start time and
/// grace period.
///
/// ### Request Body
/// ```json
/// {
///   "qrData": "{\"event_id\": 42}",
///   "location": "Main Hall",
///   "deviceInfo": "android/14"
/// }
/// ```
///
/// ### Responses
/// - `200 OK` with the attendance summary.
/// - `400 Bad Request` when the payload is not a valid QR code, the event
///   has not started, is cancelled, or has already ended.
/// - `404 Not Found` for an unknown event or missing student profile.
pub async fn check_in(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = services::attendance::check_in(
        app_state.db(),
        claims.sub,
        CheckInInput {
            qr_data: req.qr_data,
            location: req.location,
            device_info: req.device_info,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            CheckInResponse {
                event_id: summary.event_id,
                event_title: summary.event_title,
                venue: summary.venue,
                status: Some(summary.participant_status),
                log: Some(summary.log),
            },
            "Checked in successfully",
        )),
    ))
}

/// POST /attendance/upload-photo
///
/// Attaches a photo and GPS coordinates to the caller's attendance record,
/// creating the record if the student never scanned the QR code. Exactly one
/// of `attendanceLogId` and `eventId` must be supplied.
///
/// ### Responses
/// - `200 OK` with the updated attendance log.
/// - `400 Bad Request` on a malformed payload or missing target.
/// - `404 Not Found` when the log does not exist or belongs to another
///   student.
/// - `413 Payload Too Large` when the photo exceeds the configured maximum.
pub async fn upload_photo(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<UploadPhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let log = services::proof::attach_photo_proof(
        app_state.db(),
        claims.sub,
        PhotoProofInput {
            photo_data: req.photo_data,
            attendance_log_id: req.attendance_log_id,
            event_id: req.event_id,
            latitude: req.latitude,
            longitude: req.longitude,
            location: req.location,
            qr_data: req.qr_data,
            device_info: req.device_info,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(log, "Attendance proof uploaded")),
    ))
}
