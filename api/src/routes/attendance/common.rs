//! Request and response DTOs for the `/attendance` route group.

use db::models::attendance_log::Model as LogModel;
use db::models::event_participant::Status as ParticipantStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub qr_data: String,
    pub location: Option<String>,
    pub device_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadPhotoRequest {
    /// Base64 photo payload, with or without a data-URL prefix.
    pub photo_data: String,
    pub attendance_log_id: Option<i64>,
    pub event_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub qr_data: Option<String>,
    pub device_info: Option<String>,
}

#[derive(Serialize, Default)]
pub struct CheckInResponse {
    pub event_id: i64,
    pub event_title: String,
    pub venue: Option<String>,
    pub status: Option<ParticipantStatus>,
    pub log: Option<LogModel>,
}
