//! QR check-in and the shared attendance-log upsert.
//!
//! Check-in, photo proof, and the absence sweep are three entry points that
//! all converge on one attendance-log row per (student, event). The upsert
//! here is the single write path for that row, so convergence is structural
//! rather than re-implemented per caller.

use crate::error::{ServiceError, ServiceResult};
use crate::events::{event_start, is_event_day_over};
use crate::students::resolve_student;
use chrono::{DateTime, Duration, Utc};
use db::models::{
    attendance_log::{self, Status as LogStatus},
    event::{self, Entity as EventEntity, Status as EventStatus},
    event_participant::{self, Status as ParticipantStatus},
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set,
    TransactionTrait,
};

/// Identity of the canonical attendance row.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceKey {
    pub student_id: i64,
    pub event_id: i64,
}

/// Partial update applied to an attendance-log row. `None` fields are left
/// untouched on an existing row, so a proof upload does not clobber QR data
/// recorded earlier and vice versa.
#[derive(Debug, Default, Clone)]
pub struct AttendancePatch {
    pub status: Option<LogStatus>,
    pub location: Option<String>,
    pub proof_photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_taken_at: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
    pub qr_data: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Updates the attendance-log row for `key` in place, or inserts it if this
/// is the first entry point to fire for the pair.
pub async fn upsert_attendance_log<C: ConnectionTrait>(
    conn: &C,
    key: AttendanceKey,
    patch: AttendancePatch,
) -> Result<attendance_log::Model, sea_orm::DbErr> {
    match attendance_log::Model::find_by_student_and_event(conn, key.student_id, key.event_id)
        .await?
    {
        Some(existing) => {
            let mut active = existing.into_active_model();
            if let Some(status) = patch.status {
                active.status = Set(status);
            }
            if let Some(location) = patch.location {
                active.location = Set(Some(location));
            }
            if let Some(url) = patch.proof_photo_url {
                active.proof_photo_url = Set(Some(url));
            }
            if let Some(lat) = patch.latitude {
                active.latitude = Set(Some(lat));
            }
            if let Some(long) = patch.longitude {
                active.longitude = Set(Some(long));
            }
            if let Some(taken_at) = patch.photo_taken_at {
                active.photo_taken_at = Set(Some(taken_at));
            }
            if let Some(device) = patch.device_info {
                active.device_info = Set(Some(device));
            }
            if let Some(qr) = patch.qr_data {
                active.qr_data = Set(Some(qr));
            }
            if let Some(ts) = patch.timestamp {
                active.timestamp = Set(ts);
            }
            active.update(conn).await
        }
        None => {
            attendance_log::ActiveModel {
                student_id: Set(key.student_id),
                event_id: Set(key.event_id),
                status: Set(patch.status.unwrap_or(LogStatus::Present)),
                location: Set(patch.location),
                proof_photo_url: Set(patch.proof_photo_url),
                latitude: Set(patch.latitude),
                longitude: Set(patch.longitude),
                photo_taken_at: Set(patch.photo_taken_at),
                device_info: Set(patch.device_info),
                qr_data: Set(patch.qr_data),
                timestamp: Set(patch.timestamp.unwrap_or_else(Utc::now)),
                ..Default::default()
            }
            .insert(conn)
            .await
        }
    }
}

/// Inserts an absent log for the pair unless a row already exists. Used by
/// the completion sweep, which must never overwrite a real check-in record.
pub async fn ensure_absent_log<C: ConnectionTrait>(
    conn: &C,
    student_id: i64,
    event_id: i64,
    now: DateTime<Utc>,
) -> Result<(), sea_orm::DbErr> {
    if attendance_log::Model::find_by_student_and_event(conn, student_id, event_id)
        .await?
        .is_some()
    {
        return Ok(());
    }

    attendance_log::ActiveModel {
        student_id: Set(student_id),
        event_id: Set(event_id),
        status: Set(LogStatus::Absent),
        location: Set(None),
        proof_photo_url: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        photo_taken_at: Set(None),
        device_info: Set(None),
        qr_data: Set(None),
        timestamp: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Upserts the participant row for a check-in style transition. Both the QR
/// path and the proof-only path land here.
pub(crate) async fn upsert_participant<C: ConnectionTrait>(
    conn: &C,
    event_id: i64,
    student_id: i64,
    status: ParticipantStatus,
    check_in_time: Option<DateTime<Utc>>,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<event_participant::Model, sea_orm::DbErr> {
    match event_participant::Model::find_by_event_and_student(conn, event_id, student_id).await? {
        Some(existing) => {
            let mut active = existing.into_active_model();
            active.status = Set(status);
            if check_in_time.is_some() {
                active.check_in_time = Set(check_in_time);
            }
            if let Some(note) = note {
                active.note = Set(Some(note.to_owned()));
            }
            active.updated_at = Set(now);
            active.update(conn).await
        }
        None => {
            event_participant::ActiveModel {
                event_id: Set(event_id),
                student_id: Set(student_id),
                status: Set(status),
                check_in_time: Set(check_in_time),
                note: Set(note.map(|s| s.to_owned())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await
        }
    }
}

/// Extracts the event id from the opaque QR payload. Both key spellings from
/// deployed QR generators are accepted, as are string-encoded ids.
pub fn parse_qr_event_id(qr_data: &str) -> ServiceResult<i64> {
    let value: serde_json::Value = serde_json::from_str(qr_data)
        .map_err(|_| ServiceError::validation("qr_data: not a valid QR code payload"))?;

    value
        .get("event_id")
        .or_else(|| value.get("eventId"))
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| ServiceError::validation("qr_data: payload does not contain an event id"))
}

#[derive(Debug, Clone)]
pub struct CheckInInput {
    pub qr_data: String,
    pub location: Option<String>,
    pub device_info: Option<String>,
}

/// What the client gets back after a scan: the classification plus enough
/// event fields for display without a second round-trip.
#[derive(Debug)]
pub struct CheckInSummary {
    pub event_id: i64,
    pub event_title: String,
    pub venue: Option<String>,
    pub participant_status: ParticipantStatus,
    pub log: attendance_log::Model,
}

/// Handles a QR scan: classifies it as on-time or late and applies it to both
/// the participant and attendance-log rows in one transaction.
pub async fn check_in(
    db: &DatabaseConnection,
    user_id: i64,
    input: CheckInInput,
    now: DateTime<Utc>,
) -> ServiceResult<CheckInSummary> {
    let event_id = parse_qr_event_id(&input.qr_data)?;

    let event = EventEntity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("event not found"))?;

    if event.status == EventStatus::Cancelled {
        return Err(ServiceError::invalid_state(
            "attendance for this event is closed",
        ));
    }

    // Unlike the registration gate, a missing time means the event starts at
    // midnight here, so same-day scans are never "too early" by default.
    let start = event_start(&event);
    if let Some(start) = start {
        if now < start {
            return Err(ServiceError::invalid_state("event has not started yet"));
        }
    }

    let classification = classify_check_in(&event, start, now);

    if is_event_day_over(&event, now) {
        return Err(ServiceError::invalid_state("event has already ended"));
    }

    let student = resolve_student(db, user_id).await?;

    let txn = db.begin().await?;

    let participant = upsert_participant(
        &txn,
        event.id,
        student.id,
        classification,
        Some(now),
        None,
        now,
    )
    .await?;

    let log = upsert_attendance_log(
        &txn,
        AttendanceKey {
            student_id: student.id,
            event_id: event.id,
        },
        AttendancePatch {
            status: Some(classification.into()),
            location: input.location,
            device_info: input.device_info,
            qr_data: Some(input.qr_data),
            timestamp: Some(now),
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    Ok(CheckInSummary {
        event_id: event.id,
        event_title: event.title,
        venue: event.venue,
        participant_status: participant.status,
        log,
    })
}

/// A scan within the grace period after the start instant is on-time;
/// anything later is late. Events with unparseable dates have no start
/// instant and classify as on-time.
fn classify_check_in(
    event: &event::Model,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ParticipantStatus {
    match start {
        Some(start) if now > start + Duration::minutes(event.grace_period_minutes as i64) => {
            ParticipantStatus::Late
        }
        _ => ParticipantStatus::Attended,
    }
}
