//! Photo-proof attachment: a second, independent path to the attended state.
//!
//! A proof upload can target an existing attendance-log row directly or go
//! through an event id, creating the row if the student never scanned the QR
//! code. Both paths share the upsert in [`crate::attendance`], so a proof
//! upload and a QR check-in always land on the same row.

use crate::attendance::{upsert_attendance_log, upsert_participant, AttendanceKey, AttendancePatch};
use crate::error::{ServiceError, ServiceResult};
use crate::students::resolve_student;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use db::models::{
    attendance_log::{self, Entity as LogEntity, Status as LogStatus},
    event::Entity as EventEntity,
    event_participant::Status as ParticipantStatus,
};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use std::fs;

#[derive(Debug, Clone)]
pub struct PhotoProofInput {
    /// Base64 photo payload, with or without a `data:...;base64,` prefix.
    pub photo_data: String,
    pub attendance_log_id: Option<i64>,
    pub event_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub qr_data: Option<String>,
    pub device_info: Option<String>,
}

/// Attaches a photo and GPS coordinates to the student's attendance record,
/// creating the record if it does not exist yet.
///
/// Exactly one of `attendance_log_id` and `event_id` must be supplied. The
/// file write is not transactional with the row update; a failed insert can
/// leave an orphaned file behind, which is accepted.
pub async fn attach_photo_proof(
    db: &DatabaseConnection,
    user_id: i64,
    input: PhotoProofInput,
    now: DateTime<Utc>,
) -> ServiceResult<attendance_log::Model> {
    let photo = decode_photo(&input.photo_data)?;

    let target = match (input.attendance_log_id, input.event_id) {
        (Some(log_id), None) => ProofTarget::Log(log_id),
        (None, Some(event_id)) => ProofTarget::Event(event_id),
        _ => {
            return Err(ServiceError::validation(
                "exactly one of attendance_log_id and event_id must be provided",
            ))
        }
    };

    let student = resolve_student(db, user_id).await?;

    match target {
        ProofTarget::Log(log_id) => {
            let log = LogEntity::find_by_id(log_id)
                .one(db)
                .await?
                .filter(|l| l.student_id == student.id)
                .ok_or_else(|| ServiceError::not_found("attendance record not found"))?;

            let url = store_photo(log.event_id, student.id, &photo, now)?;

            Ok(upsert_attendance_log(
                db,
                AttendanceKey {
                    student_id: student.id,
                    event_id: log.event_id,
                },
                AttendancePatch {
                    proof_photo_url: Some(url),
                    latitude: Some(input.latitude),
                    longitude: Some(input.longitude),
                    photo_taken_at: Some(now),
                    location: input.location,
                    device_info: input.device_info,
                    qr_data: input.qr_data,
                    ..Default::default()
                },
            )
            .await?)
        }
        ProofTarget::Event(event_id) => {
            let event = EventEntity::find_by_id(event_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("event not found"))?;

            let url = store_photo(event.id, student.id, &photo, now)?;

            let txn = db.begin().await?;

            let log = upsert_attendance_log(
                &txn,
                AttendanceKey {
                    student_id: student.id,
                    event_id: event.id,
                },
                AttendancePatch {
                    status: Some(LogStatus::Present),
                    proof_photo_url: Some(url),
                    latitude: Some(input.latitude),
                    longitude: Some(input.longitude),
                    photo_taken_at: Some(now),
                    location: input.location,
                    device_info: input.device_info,
                    qr_data: input.qr_data,
                    timestamp: Some(now),
                    ..Default::default()
                },
            )
            .await?;

            upsert_participant(
                &txn,
                event.id,
                student.id,
                ParticipantStatus::Attended,
                Some(now),
                Some("checked in via photo proof"),
                now,
            )
            .await?;

            txn.commit().await?;
            Ok(log)
        }
    }
}

enum ProofTarget {
    Log(i64),
    Event(i64),
}

/// Validates and decodes the photo payload. The size check runs against the
/// encoded length first so oversized uploads are rejected without decoding.
fn decode_photo(photo_data: &str) -> ServiceResult<Vec<u8>> {
    let trimmed = photo_data.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("photo_data: must not be empty"));
    }

    // Strip a data-URL prefix if the client sent one.
    let encoded = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };

    let max = util::config::max_photo_size_bytes() as usize;
    // Base64 expands by 4/3, so the decoded size is bounded by this.
    if encoded.len() / 4 * 3 > max {
        return Err(ServiceError::payload_too_large(format!(
            "photo exceeds the maximum size of {} MB",
            util::config::max_photo_size_mb()
        )));
    }

    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| ServiceError::validation("photo_data: not valid base64"))?;

    if bytes.len() > max {
        return Err(ServiceError::payload_too_large(format!(
            "photo exceeds the maximum size of {} MB",
            util::config::max_photo_size_mb()
        )));
    }

    Ok(bytes)
}

fn store_photo(
    event_id: i64,
    student_id: i64,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    let filename = format!(
        "proof_{}_{}_{}.jpg",
        event_id,
        student_id,
        now.timestamp_millis()
    );
    let rel = util::paths::event_proof_rel(event_id, &filename);
    let path = util::paths::storage_path(&rel);
    util::paths::ensure_parent_dir(&path)?;
    fs::write(&path, bytes)?;
    Ok(util::paths::storage_url(&rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{check_in, CheckInInput};
    use crate::testing::{seed_admin, seed_event, seed_student};
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use db::test_utils::setup_test_db;
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    fn at(date: &str, time: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_time(NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap()),
        )
    }

    fn tiny_photo() -> String {
        BASE64.encode(b"\xff\xd8\xff\xe0 not a real jpeg")
    }

    fn proof_input(event_id: Option<i64>, log_id: Option<i64>) -> PhotoProofInput {
        PhotoProofInput {
            photo_data: tiny_photo(),
            attendance_log_id: log_id,
            event_id,
            latitude: 12.9716,
            longitude: 77.5946,
            location: Some("Main Hall".into()),
            qr_data: None,
            device_info: None,
        }
    }

    fn with_temp_storage() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        util::config::AppConfig::set_storage_root(dir.path().to_string_lossy().to_string());
        dir
    }

    #[test]
    fn photo_payload_validation() {
        assert!(matches!(
            decode_photo("").unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            decode_photo("this is !!! not base64").unwrap_err(),
            ServiceError::Validation(_)
        ));

        let with_prefix = format!("data:image/jpeg;base64,{}", tiny_photo());
        assert_eq!(
            decode_photo(&with_prefix).unwrap(),
            decode_photo(&tiny_photo()).unwrap()
        );
    }

    #[tokio::test]
    async fn requires_exactly_one_target() {
        let db = setup_test_db().await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;

        let err = attach_photo_proof(&db, user.id, proof_input(None, None), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = attach_photo_proof(&db, user.id, proof_input(Some(1), Some(1)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn cannot_target_another_students_log() {
        let _storage = with_temp_storage();
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2025-03-15", Some("10:00:00"), None).await;
        let (owner, _) = seed_student(&db, "owner@example.com", "REG-1").await;
        let (other, _) = seed_student(&db, "other@example.com", "REG-2").await;

        let log = attach_photo_proof(
            &db,
            owner.id,
            proof_input(Some(event.id), None),
            at("2025-03-15", "10:05:00"),
        )
        .await
        .unwrap();

        let err = attach_photo_proof(
            &db,
            other.id,
            proof_input(None, Some(log.id)),
            at("2025-03-15", "10:06:00"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn proof_then_check_in_converge_on_one_row() {
        let _storage = with_temp_storage();
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2025-03-15", Some("10:00:00"), None).await;
        let (user, student) = seed_student(&db, "a@example.com", "REG-1").await;

        attach_photo_proof(
            &db,
            user.id,
            proof_input(Some(event.id), None),
            at("2025-03-15", "10:05:00"),
        )
        .await
        .unwrap();

        check_in(
            &db,
            user.id,
            CheckInInput {
                qr_data: serde_json::json!({ "event_id": event.id }).to_string(),
                location: None,
                device_info: None,
            },
            at("2025-03-15", "10:10:00"),
        )
        .await
        .unwrap();

        let logs: Vec<_> = attendance_log::Entity::find()
            .filter(attendance_log::Column::StudentId.eq(student.id))
            .filter(attendance_log::Column::EventId.eq(event.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].proof_photo_url.is_some());
        assert!(logs[0].qr_data.is_some());
        assert_eq!(logs[0].status, LogStatus::Present);
    }

    #[tokio::test]
    async fn check_in_then_proof_converge_on_one_row() {
        let _storage = with_temp_storage();
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2025-03-15", Some("10:00:00"), None).await;
        let (user, student) = seed_student(&db, "a@example.com", "REG-1").await;

        check_in(
            &db,
            user.id,
            CheckInInput {
                qr_data: serde_json::json!({ "event_id": event.id }).to_string(),
                location: None,
                device_info: None,
            },
            at("2025-03-15", "10:05:00"),
        )
        .await
        .unwrap();

        let log = attach_photo_proof(
            &db,
            user.id,
            proof_input(Some(event.id), None),
            at("2025-03-15", "10:10:00"),
        )
        .await
        .unwrap();
        assert!(log.proof_photo_url.is_some());
        assert!(log.qr_data.is_some());

        let count = attendance_log::Entity::find()
            .filter(attendance_log::Column::StudentId.eq(student.id))
            .filter(attendance_log::Column::EventId.eq(event.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn proof_only_path_marks_participant_attended() {
        let _storage = with_temp_storage();
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2025-03-15", Some("10:00:00"), None).await;
        let (user, student) = seed_student(&db, "a@example.com", "REG-1").await;

        attach_photo_proof(
            &db,
            user.id,
            proof_input(Some(event.id), None),
            at("2025-03-15", "10:05:00"),
        )
        .await
        .unwrap();

        let participant =
            db::models::event_participant::Model::find_by_event_and_student(&db, event.id, student.id)
                .await
                .unwrap()
                .unwrap();
        assert_eq!(participant.status, ParticipantStatus::Attended);
        assert_eq!(participant.note.as_deref(), Some("checked in via photo proof"));
    }
}
