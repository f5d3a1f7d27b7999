//! HTTP route entry point for `/api/...`.
//!
//! Route groups include:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Registration and login (public)
//! - `/events` → Event CRUD and registration (authenticated; mutations admin-only)
//! - `/attendance` → QR check-in and photo proof (authenticated)
//! - `/onduty` → On-duty leave workflow (authenticated; review admin-only)
//! - `/files` → Stored uploads (public)

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, events::events_routes,
    health::health_routes, onduty::onduty_routes,
};
use axum::{Router, middleware::from_fn, routing::get};
use util::state::AppState;

pub mod attendance;
pub mod auth;
pub mod common;
pub mod events;
pub mod health;
pub mod onduty;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/events", events_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest("/onduty", onduty_routes())
        .route("/files/{*path}", get(common::serve_file))
        .with_state(app_state)
}
