//! Event update handler.

use crate::response::{ApiError, ApiResponse};
use crate::routes::events::common::EditEventRequest;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use services::events::EventUpdate;
use services::ServiceError;
use util::state::AppState;

/// PUT /events/{event_id}
///
/// Applies a partial update to an event. Admin only. Setting the status to
/// `completed` or `archived` runs the absence sweep: every participant still
/// `registered` is marked absent and gets an absent attendance log.
///
/// ### Responses
/// - `200 OK` with the updated event.
/// - `400 Bad Request` for a malformed `event_date`.
/// - `404 Not Found` for an unknown event.
pub async fn edit_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<EditEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Legacy rows may carry free-text dates; edits must not introduce one.
    if let Some(date) = req.event_date.as_deref() {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(ServiceError::validation("event_date: expected YYYY-MM-DD").into());
        }
    }

    let event = services::events::update_event(
        app_state.db(),
        event_id,
        EventUpdate {
            title: req.title,
            description: req.description,
            venue: req.venue,
            event_date: req.event_date,
            event_time: req.event_time,
            status: req.status,
            max_participants: req.max_participants,
            grace_period_minutes: req.grace_period_minutes,
        },
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(event, "Event updated successfully")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;

    #[tokio::test]
    async fn malformed_event_date_is_rejected() {
        let db = setup_test_db().await;
        let req = EditEventRequest {
            event_date: Some("next tuesday".into()),
            ..Default::default()
        };

        let err = edit_event(State(AppState::new(db)), Path(1), Json(req))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
