//! Event lifecycle rules: the completion gate, registration eligibility,
//! admin-driven status transitions, and the absence sweep.

use crate::attendance::ensure_absent_log;
use crate::error::{ServiceError, ServiceResult};
use crate::students::{require_approved, resolve_student_with_fallback};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use db::models::{
    event::{self, Entity as EventEntity, Status as EventStatus},
    event_participant::{self, Status as ParticipantStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, SqlErr, TransactionTrait,
};

/// Parses the event's calendar date. Malformed dates are a logged anomaly,
/// not an error: the completion gate fails open on them.
pub fn parse_event_date(event: &event::Model) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(event.event_date.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!(
                event_id = event.id,
                raw_date = %event.event_date,
                "event has an unparseable date; treating it as not completed"
            );
            None
        }
    }
}

/// Parses the event's optional clock time (`HH:MM:SS`, falling back to `HH:MM`).
pub fn parse_event_time(event: &event::Model) -> Option<NaiveTime> {
    let raw = event.event_time.as_deref()?.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// The event's start instant: date combined with its time, defaulting to
/// midnight when no time is set. `None` when the date is unparseable.
///
/// Check-in uses this midnight default; the registration gate deliberately
/// does not (an event with no time stays open for registration all day).
pub fn event_start(event: &event::Model) -> Option<DateTime<Utc>> {
    let date = parse_event_date(event)?;
    let time = parse_event_time(event).unwrap_or(NaiveTime::MIN);
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Whether the event should be treated as over for registration purposes.
///
/// - Explicitly completed/archived events are always over.
/// - A malformed date fails open: the event stays available.
/// - A future date is never over; a past date always is.
/// - On the event's own day, the event stays open all day unless it carries a
///   time, in which case it is over once that instant has been reached.
pub fn is_event_completed(event: &event::Model, now: DateTime<Utc>) -> bool {
    if event.status.is_concluded() {
        return true;
    }

    let Some(date) = parse_event_date(event) else {
        return false;
    };

    let today = now.date_naive();
    if date > today {
        return false;
    }
    if date < today {
        return true;
    }

    match parse_event_time(event) {
        None => false,
        Some(time) => Utc.from_utc_datetime(&date.and_time(time)) <= now,
    }
}

/// Whether the event's calendar day has fully passed (or it was explicitly
/// concluded). Check-in uses this instead of [`is_event_completed`]: on the
/// event day itself a scan after the start instant must still be accepted and
/// classified, not rejected as "completed".
pub fn is_event_day_over(event: &event::Model, now: DateTime<Utc>) -> bool {
    if event.status.is_concluded() {
        return true;
    }
    match parse_event_date(event) {
        Some(date) => date < now.date_naive(),
        None => false,
    }
}

/// Outcome of a registration attempt. Re-registration is idempotent rather
/// than an error, so callers can distinguish the cases for messaging.
#[derive(Debug)]
pub enum RegistrationOutcome {
    Registered(event_participant::Model),
    AlreadyRegistered(event_participant::Model),
    AlreadyCheckedIn(event_participant::Model),
}

impl RegistrationOutcome {
    pub fn participant(&self) -> &event_participant::Model {
        match self {
            RegistrationOutcome::Registered(p)
            | RegistrationOutcome::AlreadyRegistered(p)
            | RegistrationOutcome::AlreadyCheckedIn(p) => p,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RegistrationOutcome::Registered(_) => "Registered for event",
            RegistrationOutcome::AlreadyRegistered(_) => "Already registered for this event",
            RegistrationOutcome::AlreadyCheckedIn(_) => "Already checked in to this event",
        }
    }
}

/// Registers the acting student for an event.
///
/// The capacity check and insert run inside one transaction; the unique index
/// on (event_id, student_id) backstops concurrent duplicates.
pub async fn register_for_event(
    db: &DatabaseConnection,
    event_id: i64,
    user_id: i64,
    fallback_student_id: Option<i64>,
    now: DateTime<Utc>,
) -> ServiceResult<RegistrationOutcome> {
    let event = EventEntity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("event not found"))?;

    if event.status == EventStatus::Cancelled {
        return Err(ServiceError::invalid_state("event has been cancelled"));
    }
    if is_event_completed(&event, now) {
        return Err(ServiceError::invalid_state(
            "event has concluded; registration is closed",
        ));
    }

    let student = resolve_student_with_fallback(db, user_id, fallback_student_id).await?;
    require_approved(&student)?;

    let txn = db.begin().await?;

    if let Some(existing) =
        event_participant::Model::find_by_event_and_student(&txn, event.id, student.id).await?
    {
        txn.commit().await?;
        return match existing.status {
            s if s.is_checked_in() => Ok(RegistrationOutcome::AlreadyCheckedIn(existing)),
            ParticipantStatus::Absent => Err(ServiceError::invalid_state(
                "event has concluded; registration is closed",
            )),
            _ => Ok(RegistrationOutcome::AlreadyRegistered(existing)),
        };
    }

    if let Some(cap) = event.max_participants {
        let seated = event_participant::Model::count_seated(&txn, event.id).await?;
        if seated >= cap as u64 {
            return Err(ServiceError::conflict("event has reached its capacity"));
        }
    }

    let inserted = event_participant::ActiveModel {
        event_id: Set(event.id),
        student_id: Set(student.id),
        status: Set(ParticipantStatus::Registered),
        check_in_time: Set(None),
        note: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::conflict("already registered for this event")
        }
        _ => ServiceError::from(e),
    })?;

    txn.commit().await?;
    Ok(RegistrationOutcome::Registered(inserted))
}

/// Admin-editable event fields. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub status: Option<EventStatus>,
    pub max_participants: Option<i32>,
    pub grace_period_minutes: Option<i32>,
}

/// Applies an admin update. Transitioning into a concluded status runs the
/// absence sweep in the same transaction; re-applying a concluded status
/// re-runs the sweep, which is idempotent.
pub async fn update_event(
    db: &DatabaseConnection,
    event_id: i64,
    changes: EventUpdate,
    now: DateTime<Utc>,
) -> ServiceResult<event::Model> {
    let event = EventEntity::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("event not found"))?;

    let txn = db.begin().await?;

    let mut active = event.into_active_model();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }
    if let Some(venue) = changes.venue {
        active.venue = Set(Some(venue));
    }
    if let Some(event_date) = changes.event_date {
        active.event_date = Set(event_date);
    }
    if let Some(event_time) = changes.event_time {
        active.event_time = Set(Some(event_time));
    }
    if let Some(status) = changes.status {
        active.status = Set(status);
    }
    if let Some(max) = changes.max_participants {
        active.max_participants = Set(Some(max));
    }
    if let Some(grace) = changes.grace_period_minutes {
        active.grace_period_minutes = Set(grace);
    }
    active.updated_at = Set(now);

    let updated = active.update(&txn).await?;

    if updated.status.is_concluded() {
        mark_pending_participants_absent(&txn, &updated, now).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// The absence sweep: every participant still `registered` when an event
/// concludes is marked absent, and an absent attendance log is created for
/// them unless one already exists. The only transition not triggered by a
/// student action.
pub async fn mark_pending_participants_absent<C: ConnectionTrait>(
    conn: &C,
    event: &event::Model,
    now: DateTime<Utc>,
) -> ServiceResult<u64> {
    let pending = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(event.id))
        .filter(event_participant::Column::Status.eq(ParticipantStatus::Registered))
        .all(conn)
        .await?;

    let swept = pending.len() as u64;
    for participant in pending {
        ensure_absent_log(conn, participant.student_id, event.id, now).await?;

        let mut active = participant.into_active_model();
        active.status = Set(ParticipantStatus::Absent);
        active.updated_at = Set(now);
        active.update(conn).await?;
    }

    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_admin, seed_event, seed_student, seed_student_with_status};
    use db::models::attendance_log::{self, Status as LogStatus};
    use db::models::student::Status as StudentStatus;
    use db::test_utils::setup_test_db;
    use sea_orm::PaginatorTrait;

    fn at(date: &str, time: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_time(NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap()),
        )
    }

    fn make_event(date: &str, time: Option<&str>, status: EventStatus) -> event::Model {
        event::Model {
            id: 1,
            title: "T".into(),
            description: None,
            venue: None,
            event_date: date.into(),
            event_time: time.map(Into::into),
            status,
            max_participants: None,
            grace_period_minutes: 15,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn completion_gate_rules() {
        let now = at("2025-03-15", "12:00:00");

        // Explicit status always wins.
        let done = make_event("2099-01-01", None, EventStatus::Completed);
        assert!(is_event_completed(&done, now));
        let archived = make_event("2099-01-01", None, EventStatus::Archived);
        assert!(is_event_completed(&archived, now));

        // Malformed date fails open.
        let broken = make_event("next tuesday", None, EventStatus::Active);
        assert!(!is_event_completed(&broken, now));

        // Future / past days.
        assert!(!is_event_completed(
            &make_event("2025-03-16", None, EventStatus::Active),
            now
        ));
        assert!(is_event_completed(
            &make_event("2025-03-14", Some("23:00:00"), EventStatus::Active),
            now
        ));

        // Same day, no time: open all day.
        assert!(!is_event_completed(
            &make_event("2025-03-15", None, EventStatus::Active),
            now
        ));

        // Same day with time: completed once the instant is reached.
        assert!(is_event_completed(
            &make_event("2025-03-15", Some("10:00:00"), EventStatus::Active),
            now
        ));
        assert!(!is_event_completed(
            &make_event("2025-03-15", Some("18:00:00"), EventStatus::Active),
            now
        ));
    }

    #[test]
    fn completion_is_monotonic() {
        // Once completed at some instant, completed at every later instant.
        let event = make_event("2025-03-15", Some("10:00:00"), EventStatus::Active);
        let first_completed = at("2025-03-15", "10:00:00");
        assert!(is_event_completed(&event, first_completed));

        for later in [
            at("2025-03-15", "10:00:01"),
            at("2025-03-15", "23:59:59"),
            at("2025-03-16", "00:00:00"),
            at("2026-01-01", "00:00:00"),
        ] {
            assert!(is_event_completed(&event, later));
        }
    }

    #[test]
    fn event_start_defaults_to_midnight() {
        let no_time = make_event("2025-03-15", None, EventStatus::Active);
        assert_eq!(event_start(&no_time).unwrap(), at("2025-03-15", "00:00:00"));

        let short_time = make_event("2025-03-15", Some("10:30"), EventStatus::Active);
        assert_eq!(
            event_start(&short_time).unwrap(),
            at("2025-03-15", "10:30:00")
        );

        let broken = make_event("soon", None, EventStatus::Active);
        assert!(event_start(&broken).is_none());
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", Some("10:00:00"), None).await;
        let (user, student) = seed_student(&db, "a@example.com", "REG-1").await;
        let now = Utc::now();

        let first = register_for_event(&db, event.id, user.id, None, now)
            .await
            .unwrap();
        assert!(matches!(first, RegistrationOutcome::Registered(_)));
        assert_eq!(first.participant().status, ParticipantStatus::Registered);

        let second = register_for_event(&db, event.id, user.id, None, now)
            .await
            .unwrap();
        assert!(matches!(second, RegistrationOutcome::AlreadyRegistered(_)));

        let rows = event_participant::Entity::find()
            .filter(event_participant::Column::EventId.eq(event.id))
            .filter(event_participant::Column::StudentId.eq(student.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", Some("10:00:00"), Some(2)).await;
        let now = Utc::now();

        let (u1, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let (u2, _) = seed_student(&db, "b@example.com", "REG-2").await;
        let (u3, _) = seed_student(&db, "c@example.com", "REG-3").await;

        register_for_event(&db, event.id, u1.id, None, now)
            .await
            .unwrap();
        register_for_event(&db, event.id, u2.id, None, now)
            .await
            .unwrap();

        let err = register_for_event(&db, event.id, u3.id, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn cancelled_and_completed_events_reject_registration() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;
        let now = Utc::now();

        let cancelled = seed_event(&db, admin.id, "2099-06-01", None, None).await;
        update_event(
            &db,
            cancelled.id,
            EventUpdate {
                status: Some(EventStatus::Cancelled),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
        let err = register_for_event(&db, cancelled.id, user.id, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // Date in the past: derived completion, same rejection.
        let past = seed_event(&db, admin.id, "2001-01-01", None, None).await;
        let err = register_for_event(&db, past.id, user.id, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn unapproved_students_cannot_register() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", None, None).await;
        let (user, _) =
            seed_student_with_status(&db, "p@example.com", "REG-9", StudentStatus::Pending).await;

        let err = register_for_event(&db, event.id, user.id, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn absence_sweep_marks_pending_and_is_idempotent() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", Some("10:00:00"), None).await;
        let now = Utc::now();

        let (u1, s1) = seed_student(&db, "a@example.com", "REG-1").await;
        let (u2, s2) = seed_student(&db, "b@example.com", "REG-2").await;
        register_for_event(&db, event.id, u1.id, None, now)
            .await
            .unwrap();
        register_for_event(&db, event.id, u2.id, None, now)
            .await
            .unwrap();

        let updated = update_event(
            &db,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Completed),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(updated.status, EventStatus::Completed);

        for student_id in [s1.id, s2.id] {
            let participant =
                event_participant::Model::find_by_event_and_student(&db, event.id, student_id)
                    .await
                    .unwrap()
                    .unwrap();
            assert_eq!(participant.status, ParticipantStatus::Absent);

            let log = attendance_log::Model::find_by_student_and_event(&db, student_id, event.id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(log.status, LogStatus::Absent);
        }

        // Re-applying the concluded status re-runs the sweep without duplicates.
        update_event(
            &db,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Completed),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();

        let log_count = attendance_log::Entity::find()
            .filter(attendance_log::Column::EventId.eq(event.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(log_count, 2);
    }

    #[tokio::test]
    async fn full_event_lifecycle_preserves_check_ins() {
        // Cap-2 event at 10:00 with a 15-minute grace period. Two students
        // register, a third bounces off capacity, one scans on time and one
        // late, then the admin completes the event. Nobody who checked in is
        // demoted by the sweep and no extra logs appear.
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", Some("10:00:00"), Some(2)).await;
        let registration_time = at("2099-05-20", "09:00:00");

        let (u1, s1) = seed_student(&db, "a@example.com", "REG-1").await;
        let (u2, s2) = seed_student(&db, "b@example.com", "REG-2").await;
        let (u3, _) = seed_student(&db, "c@example.com", "REG-3").await;

        register_for_event(&db, event.id, u1.id, None, registration_time)
            .await
            .unwrap();
        register_for_event(&db, event.id, u2.id, None, registration_time)
            .await
            .unwrap();
        let err = register_for_event(&db, event.id, u3.id, None, registration_time)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let qr = format!("{{\"event_id\": {}}}", event.id);

        let on_time = crate::attendance::check_in(
            &db,
            u1.id,
            crate::attendance::CheckInInput {
                qr_data: qr.clone(),
                location: None,
                device_info: None,
            },
            at("2099-06-01", "10:05:00"),
        )
        .await
        .unwrap();
        assert_eq!(on_time.participant_status, ParticipantStatus::Attended);

        let late = crate::attendance::check_in(
            &db,
            u2.id,
            crate::attendance::CheckInInput {
                qr_data: qr.clone(),
                location: None,
                device_info: None,
            },
            at("2099-06-01", "10:20:00"),
        )
        .await
        .unwrap();
        assert_eq!(late.participant_status, ParticipantStatus::Late);

        update_event(
            &db,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Completed),
                ..Default::default()
            },
            at("2099-06-01", "12:00:00"),
        )
        .await
        .unwrap();

        // The sweep found nothing pending: check-in statuses survive.
        for (student_id, participant_status, log_status) in [
            (s1.id, ParticipantStatus::Attended, LogStatus::Present),
            (s2.id, ParticipantStatus::Late, LogStatus::Late),
        ] {
            let participant =
                event_participant::Model::find_by_event_and_student(&db, event.id, student_id)
                    .await
                    .unwrap()
                    .unwrap();
            assert_eq!(participant.status, participant_status);

            let log = attendance_log::Model::find_by_student_and_event(&db, student_id, event.id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(log.status, log_status);
        }

        let log_count = attendance_log::Entity::find()
            .filter(attendance_log::Column::EventId.eq(event.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(log_count, 2);
    }

    #[tokio::test]
    async fn absent_participant_cannot_reregister() {
        let db = setup_test_db().await;
        let admin = seed_admin(&db).await;
        let event = seed_event(&db, admin.id, "2099-06-01", Some("10:00:00"), None).await;
        let now = Utc::now();
        let (user, _) = seed_student(&db, "a@example.com", "REG-1").await;

        register_for_event(&db, event.id, user.id, None, now)
            .await
            .unwrap();
        update_event(
            &db,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Completed),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();

        // Reopen the event; the swept participant still may not re-register.
        update_event(
            &db,
            event.id,
            EventUpdate {
                status: Some(EventStatus::Active),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();

        let err = register_for_event(&db, event.id, user.id, None, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
