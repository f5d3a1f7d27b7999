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

use delete::delete_event;
use get::{get_event, list_event_participants, list_events};
use post::{create_event, register_for_event};
use put::edit_event;

pub fn events_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event).route_layer(from_fn(allow_admin)))
        .route(
            "/{event_id}",
            put(edit_event).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{event_id}",
            delete(delete_event).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{event_id}/participants",
            get(list_event_participants).route_layer(from_fn(allow_admin)),
        )
        .route("/", get(list_events).route_layer(from_fn(allow_authenticated)))
        .route(
            "/{event_id}",
            get(get_event).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/{event_id}/register",
            post(register_for_event).route_layer(from_fn(allow_authenticated)),
        )
}
