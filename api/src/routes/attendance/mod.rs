use crate::auth::guards::allow_admin;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

pub mod common;
pub mod get;
pub mod post;

use get::{get_event_attendance, get_my_attendance};
use post::{check_in, upload_photo};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/checkin", post(check_in))
        .route("/upload-photo", post(upload_photo))
        .route("/me", get(get_my_attendance))
        .route(
            "/events/{event_id}",
            get(get_event_attendance).route_layer(from_fn(allow_admin)),
        )
}
