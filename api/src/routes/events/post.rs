//! Event creation and registration handlers.

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::events::common::{CreateEventRequest, RegisterBody};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use common::format_validation_errors;
use db::models::event::{Model as EventModel, NewEvent};
use db::models::event_participant::Model as ParticipantModel;
use serde::Serialize;
use services::ServiceError;
use services::events::RegistrationOutcome;
use util::state::AppState;
use validator::Validate;

/// POST /events
///
/// Creates a new event. Admin only.
///
/// ### Request Body
/// ```json
/// {
///   "title": "Tech Symposium",
///   "venue": "Main Hall",
///   "event_date": "2025-03-15",
///   "event_time": "10:00",
///   "max_participants": 200,
///   "grace_period_minutes": 15
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the event.
/// - `400 Bad Request` on validation failure or an unparseable date.
pub async fn create_event(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(validation_errors) = req.validate() {
        return Err(ServiceError::validation(format_validation_errors(&validation_errors)).into());
    }

    // Legacy rows may carry free-text dates; new events must not.
    if NaiveDate::parse_from_str(&req.event_date, "%Y-%m-%d").is_err() {
        return Err(ServiceError::validation("event_date: expected YYYY-MM-DD").into());
    }

    let event = EventModel::create(
        app_state.db(),
        NewEvent {
            title: &req.title,
            description: req.description.as_deref(),
            venue: req.venue.as_deref(),
            event_date: &req.event_date,
            event_time: req.event_time.as_deref(),
            max_participants: req.max_participants,
            grace_period_minutes: req.grace_period_minutes,
            created_by: claims.sub,
        },
    )
    .await
    .map_err(ServiceError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(event, "Event created successfully")),
    ))
}

#[derive(Serialize, Default)]
pub struct RegistrationResponse {
    pub participant: Option<ParticipantModel>,
}

/// POST /events/{event_id}/register
///
/// Registers the acting student for an event. Re-registration is idempotent;
/// the message distinguishes a fresh registration from an existing one.
///
/// ### Responses
/// - `200 OK` when already registered or checked in.
/// - `201 Created` on a fresh registration.
/// - `400 Bad Request` when the event is cancelled or concluded.
/// - `403 Forbidden` when the student profile is not approved.
/// - `409 Conflict` when the event is at capacity.
pub async fn register_for_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    body: Option<Json<RegisterBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let fallback = body.and_then(|Json(b)| b.student_id);

    let outcome = services::events::register_for_event(
        app_state.db(),
        event_id,
        claims.sub,
        fallback,
        Utc::now(),
    )
    .await?;

    let status = match &outcome {
        RegistrationOutcome::Registered(_) => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    let message = outcome.message();

    Ok((
        status,
        Json(ApiResponse::success(
            RegistrationResponse {
                participant: Some(outcome.participant().clone()),
            },
            message,
        )),
    ))
}
