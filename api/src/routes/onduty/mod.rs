use crate::auth::guards::{allow_admin, allow_authenticated};
use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post, put},
};
use util::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use delete::delete_request;
use get::{list_all_requests, list_my_requests, list_request_attendance};
use post::{create_request, mark_attendance};
use put::review_request;

pub fn onduty_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request).get(list_my_requests))
        .route("/requests/{request_id}", delete(delete_request))
        .route("/requests/{request_id}/attendance", get(list_request_attendance))
        .route("/attendance", post(mark_attendance))
        .route_layer(from_fn(allow_authenticated))
        .route(
            "/admin/requests",
            get(list_all_requests).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/admin/requests/{request_id}",
            put(review_request).route_layer(from_fn(allow_admin)),
        )
}
