//! On-duty leave workflow: request, admin review, and per-day attendance
//! marking within an approved window.

use crate::error::{ServiceError, ServiceResult};
use crate::students::{require_approved, resolve_student};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use db::models::{
    on_duty_attendance,
    on_duty_request::{self, Entity as RequestEntity, Status as RequestStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use std::fs;

/// An uploaded file as received from a multipart field.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOnDutyRequest {
    pub college_name: String,
    pub reason: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
    /// Supporting document, stored alongside the request if present.
    pub document: Option<Upload>,
}

/// Submits a leave request. Only approved students may apply; the window must
/// start in the future, end after it starts, and start within a year.
pub async fn create_request(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewOnDutyRequest,
    now: DateTime<Utc>,
) -> ServiceResult<on_duty_request::Model> {
    if input.college_name.trim().is_empty() {
        return Err(ServiceError::validation("college_name: must not be empty"));
    }
    if input.reason.trim().is_empty() {
        return Err(ServiceError::validation("reason: must not be empty"));
    }

    let start = input
        .start_date
        .and_time(input.start_time.unwrap_or(NaiveTime::MIN))
        .and_utc();
    // A missing end time means the window runs to the end of that day.
    let end = input
        .end_date
        .and_time(input.end_time.unwrap_or_else(end_of_day))
        .and_utc();

    if start < now {
        return Err(ServiceError::validation(
            "start_date: must not be in the past",
        ));
    }
    if end <= start {
        return Err(ServiceError::validation(
            "end_date: must be after the start of the window",
        ));
    }
    if start > now + Duration::days(365) {
        return Err(ServiceError::validation(
            "start_date: must be within one year",
        ));
    }

    let student = resolve_student(db, user_id).await?;
    require_approved(&student)?;

    let document_url = match &input.document {
        Some(upload) => Some(store_document(student.id, upload, now)?),
        None => None,
    };

    Ok(on_duty_request::ActiveModel {
        student_id: Set(student.id),
        college_name: Set(input.college_name.trim().to_owned()),
        reason: Set(input.reason.trim().to_owned()),
        start_date: Set(input.start_date),
        start_time: Set(input.start_time),
        end_date: Set(input.end_date),
        end_time: Set(input.end_time),
        status: Set(RequestStatus::Pending),
        rejection_reason: Set(None),
        document_url: Set(document_url),
        reviewed_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

#[derive(Debug, Clone)]
pub struct ReviewDecision {
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
}

/// Applies an admin decision to a pending request. Approved and rejected are
/// terminal; a decided request cannot be re-reviewed.
pub async fn review_request(
    db: &DatabaseConnection,
    admin_id: i64,
    request_id: i64,
    decision: ReviewDecision,
    now: DateTime<Utc>,
) -> ServiceResult<on_duty_request::Model> {
    let request = RequestEntity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("on-duty request not found"))?;

    if request.status != RequestStatus::Pending {
        return Err(ServiceError::invalid_state(
            "on-duty request has already been reviewed",
        ));
    }

    let rejection_reason = match decision.status {
        RequestStatus::Approved => None,
        RequestStatus::Rejected => {
            let reason = decision
                .rejection_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    ServiceError::validation("rejection_reason: required when rejecting")
                })?;
            Some(reason.to_owned())
        }
        RequestStatus::Pending => {
            return Err(ServiceError::validation(
                "status: must be approved or rejected",
            ))
        }
    };

    let mut active = request.into_active_model();
    active.status = Set(decision.status);
    active.rejection_reason = Set(rejection_reason);
    active.reviewed_by = Set(Some(admin_id));
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}

/// Deletes the student's own request while it is still pending, along with
/// its supporting document if one was uploaded.
pub async fn delete_request(
    db: &DatabaseConnection,
    user_id: i64,
    request_id: i64,
) -> ServiceResult<()> {
    let student = resolve_student(db, user_id).await?;

    let request = RequestEntity::find_by_id(request_id)
        .one(db)
        .await?
        .filter(|r| r.student_id == student.id)
        .ok_or_else(|| ServiceError::not_found("on-duty request not found"))?;

    if request.status != RequestStatus::Pending {
        return Err(ServiceError::invalid_state(
            "only pending requests can be deleted",
        ));
    }

    if let Some(rel) = request
        .document_url
        .as_deref()
        .and_then(util::paths::rel_from_storage_url)
    {
        let path = util::paths::storage_path(rel);
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!(request_id, path = %path.display(), error = %e, "failed to remove on-duty document");
        }
    }

    request.delete(db).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OnDutyCheckIn {
    pub on_duty_request_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub qr_data: Option<String>,
    /// Selfie photo, stored if present.
    pub selfie: Option<Upload>,
}

/// Marks attendance for one calendar day inside an approved window. The
/// unique index on (request, student, date) makes same-day duplicates a
/// conflict even under concurrent requests.
pub async fn mark_attendance(
    db: &DatabaseConnection,
    user_id: i64,
    input: OnDutyCheckIn,
    now: DateTime<Utc>,
) -> ServiceResult<on_duty_attendance::Model> {
    let student = resolve_student(db, user_id).await?;

    let request = RequestEntity::find_by_id(input.on_duty_request_id)
        .one(db)
        .await?
        .filter(|r| r.student_id == student.id)
        .ok_or_else(|| ServiceError::not_found("on-duty request not found"))?;

    if request.status != RequestStatus::Approved {
        return Err(ServiceError::invalid_state(
            "on-duty request is not approved",
        ));
    }

    let today = now.date_naive();
    if today < request.start_date || today > request.end_date {
        return Err(ServiceError::invalid_state(
            "today is outside the approved on-duty window",
        ));
    }

    if on_duty_attendance::Model::find_for_day(db, request.id, student.id, today)
        .await?
        .is_some()
    {
        return Err(ServiceError::conflict(
            "attendance already marked for today",
        ));
    }

    let selfie_photo_url = match &input.selfie {
        Some(upload) => Some(store_selfie(request.id, upload, now)?),
        None => None,
    };

    on_duty_attendance::ActiveModel {
        on_duty_request_id: Set(request.id),
        student_id: Set(student.id),
        check_in_date: Set(today),
        latitude: Set(input.latitude),
        longitude: Set(input.longitude),
        address: Set(input.address),
        selfie_photo_url: Set(selfie_photo_url),
        qr_data: Set(input.qr_data),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::conflict("attendance already marked for today")
        }
        _ => ServiceError::from(e),
    })
}

/// The student's own requests, newest first.
pub async fn list_requests_for_student(
    db: &DatabaseConnection,
    user_id: i64,
) -> ServiceResult<Vec<on_duty_request::Model>> {
    let student = resolve_student(db, user_id).await?;
    Ok(RequestEntity::find()
        .filter(on_duty_request::Column::StudentId.eq(student.id))
        .order_by_desc(on_duty_request::Column::CreatedAt)
        .all(db)
        .await?)
}

/// All requests, optionally filtered by status. Admin listing.
pub async fn list_requests(
    db: &DatabaseConnection,
    status: Option<RequestStatus>,
) -> ServiceResult<Vec<on_duty_request::Model>> {
    let mut query = RequestEntity::find().order_by_desc(on_duty_request::Column::CreatedAt);
    if let Some(status) = status {
        query = query.filter(on_duty_request::Column::Status.eq(status));
    }
    Ok(query.all(db).await?)
}

/// Attendance rows recorded against one of the student's own requests.
pub async fn list_attendance(
    db: &DatabaseConnection,
    user_id: i64,
    request_id: i64,
) -> ServiceResult<Vec<on_duty_attendance::Model>> {
    let student = resolve_student(db, user_id).await?;

    RequestEntity::find_by_id(request_id)
        .one(db)
        .await?
        .filter(|r| r.student_id == student.id)
        .ok_or_else(|| ServiceError::not_found("on-duty request not found"))?;

    Ok(on_duty_attendance::Entity::find()
        .filter(on_duty_attendance::Column::OnDutyRequestId.eq(request_id))
        .order_by_desc(on_duty_attendance::Column::CheckInDate)
        .all(db)
        .await?)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

fn store_document(student_id: i64, upload: &Upload, now: DateTime<Utc>) -> ServiceResult<String> {
    if upload.bytes.is_empty() {
        return Err(ServiceError::validation("document: must not be empty"));
    }
    let ext = upload
        .filename
        .as_deref()
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or("pdf");
    let name = format!("document_{}.{}", now.timestamp_millis(), ext);
    let rel = util::paths::onduty_document_rel(student_id, &name);
    write_storage_file(&rel, &upload.bytes)?;
    Ok(util::paths::storage_url(&rel))
}

fn store_selfie(request_id: i64, upload: &Upload, now: DateTime<Utc>) -> ServiceResult<String> {
    if upload.bytes.is_empty() {
        return Err(ServiceError::validation("selfie: must not be empty"));
    }
    let name = format!("selfie_{}.jpg", now.timestamp_millis());
    let rel = util::paths::onduty_selfie_rel(request_id, &name);
    write_storage_file(&rel, &upload.bytes)?;
    Ok(util::paths::storage_url(&rel))
}

fn write_storage_file(rel: &str, bytes: &[u8]) -> ServiceResult<()> {
    let path = util::paths::storage_path(rel);
    util::paths::ensure_parent_dir(&path)?;
    fs::write(&path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_admin, seed_student, seed_student_with_status};
    use chrono::TimeZone;
    use db::models::student::Status as StudentStatus;
    use db::test_utils::setup_test_db;
    use sea_orm::PaginatorTrait;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at_noon(s: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day(s).and_hms_opt(12, 0, 0).unwrap())
    }

    fn window(start: &str, end: &str) -> NewOnDutyRequest {
        NewOnDutyRequest {
            college_name: "IIT Madras".into(),
            reason: "Inter-college hackathon".into(),
            start_date: day(start),
            start_time: None,
            end_date: day(end),
            end_time: None,
            document: None,
        }
    }

    async fn approved_request(
        db: &DatabaseConnection,
        user_id: i64,
        admin_id: i64,
        start: &str,
        end: &str,
        now: DateTime<Utc>,
    ) -> on_duty_request::Model {
        let request = create_request(db, user_id, window(start, end), now)
            .await
            .unwrap();
        review_request(
            db,
            admin_id,
            request.id,
            ReviewDecision {
                status: RequestStatus::Approved,
                rejection_reason: None,
            },
            now,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn window_validation() {
        let db = setup_test_db().await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let now = at_noon("2025-03-01");

        // Past start.
        let err = create_request(&db, user.id, window("2025-02-28", "2025-03-02"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // End before start.
        let err = create_request(&db, user.id, window("2025-03-10", "2025-03-09"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // More than a year out.
        let err = create_request(&db, user.id, window("2026-04-01", "2026-04-02"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // Missing end time runs to end of day, so a one-day window is valid.
        let request = create_request(&db, user.id, window("2025-03-10", "2025-03-10"), now)
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn unapproved_students_cannot_apply() {
        let db = setup_test_db().await;
        let (user, _) =
            seed_student_with_status(&db, "p@example.com", "REG-P", StudentStatus::Pending).await;

        let err = create_request(
            &db,
            user.id,
            window("2025-03-10", "2025-03-12"),
            at_noon("2025-03-01"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn review_is_terminal_and_rejection_needs_a_reason() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let now = at_noon("2025-03-01");
        let request = create_request(&db, user.id, window("2025-03-10", "2025-03-12"), now)
            .await
            .unwrap();

        // Rejecting without a reason fails and leaves the request pending.
        let err = review_request(
            &db,
            admin.id,
            request.id,
            ReviewDecision {
                status: RequestStatus::Rejected,
                rejection_reason: None,
            },
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let reviewed = review_request(
            &db,
            admin.id,
            request.id,
            ReviewDecision {
                status: RequestStatus::Rejected,
                rejection_reason: Some("insufficient documentation".into()),
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(reviewed.status, RequestStatus::Rejected);
        assert_eq!(reviewed.reviewed_by, Some(admin.id));

        // A decided request cannot be reviewed again.
        let err = review_request(
            &db,
            admin.id,
            request.id,
            ReviewDecision {
                status: RequestStatus::Approved,
                rejection_reason: None,
            },
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn delete_only_while_pending_and_only_own() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let (other, _) = seed_student(&db, "b@example.com", "REG-2").await;
        let now = at_noon("2025-03-01");

        let request = create_request(&db, user.id, window("2025-03-10", "2025-03-12"), now)
            .await
            .unwrap();

        let err = delete_request(&db, other.id, request.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        delete_request(&db, user.id, request.id).await.unwrap();

        let approved = approved_request(&db, user.id, admin.id, "2025-03-10", "2025-03-12", now).await;
        let err = delete_request(&db, user.id, approved.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn same_day_attendance_is_rejected_but_different_days_accumulate() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let request = approved_request(
            &db,
            user.id,
            admin.id,
            "2025-03-10",
            "2025-03-12",
            at_noon("2025-03-01"),
        )
        .await;

        let check_in = |day: &'static str| OnDutyCheckIn {
            on_duty_request_id: request.id,
            latitude: 12.9716,
            longitude: 77.5946,
            address: Some(format!("IIT Madras campus, {day}")),
            qr_data: None,
            selfie: None,
        };

        mark_attendance(&db, user.id, check_in("day one"), at_noon("2025-03-10"))
            .await
            .unwrap();

        let err = mark_attendance(&db, user.id, check_in("day one again"), at_noon("2025-03-10"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        mark_attendance(&db, user.id, check_in("day two"), at_noon("2025-03-11"))
            .await
            .unwrap();

        let count = on_duty_attendance::Entity::find()
            .filter(on_duty_attendance::Column::OnDutyRequestId.eq(request.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn attendance_outside_the_window_or_before_approval_is_rejected() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let now = at_noon("2025-03-01");

        let pending = create_request(&db, user.id, window("2025-03-10", "2025-03-12"), now)
            .await
            .unwrap();

        let check_in = |id: i64| OnDutyCheckIn {
            on_duty_request_id: id,
            latitude: 12.9716,
            longitude: 77.5946,
            address: None,
            qr_data: None,
            selfie: None,
        };

        let err = mark_attendance(&db, user.id, check_in(pending.id), at_noon("2025-03-10"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let approved =
            approved_request(&db, user.id, admin.id, "2025-03-20", "2025-03-21", now).await;
        let err = mark_attendance(&db, user.id, check_in(approved.id), at_noon("2025-03-19"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = mark_attendance(&db, user.id, check_in(approved.id), at_noon("2025-03-22"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
