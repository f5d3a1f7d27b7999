//! Request DTOs for the `/onduty` route group.
//!
//! Creation and attendance marking arrive as multipart forms (they carry
//! file uploads); review arrives as JSON.

use db::models::on_duty_request::Status as RequestStatus;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReviewRequestBody {
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<RequestStatus>,
}
