//! Request DTOs for the `/events` route group.

use db::models::event::Status as EventStatus;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,

    pub description: Option<String>,
    pub venue: Option<String>,

    /// Calendar date, `YYYY-MM-DD`.
    pub event_date: String,
    /// Optional clock time, `HH:MM` or `HH:MM:SS`.
    pub event_time: Option<String>,

    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub max_participants: Option<i32>,

    #[validate(range(min = 0, message = "Grace period must not be negative"))]
    pub grace_period_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub status: Option<EventStatus>,
    pub max_participants: Option<i32>,
    pub grace_period_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    /// Fallback student id, honored only when it belongs to the caller.
    pub student_id: Option<i64>,
}
