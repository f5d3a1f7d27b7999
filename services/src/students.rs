use crate::error::{ServiceError, ServiceResult};
use db::models::student::{self, Entity as StudentEntity, Status};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Resolves the acting student's profile row from the authenticated user id.
pub async fn resolve_student(
    db: &DatabaseConnection,
    user_id: i64,
) -> ServiceResult<student::Model> {
    student::Model::find_by_user_id(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("student profile not found"))
}

/// Like [`resolve_student`], but accepts a caller-supplied student id as a
/// fallback when the identity-based lookup fails. The fallback is honored
/// only when the row it names belongs to the authenticated user; anything
/// else is rejected rather than trusted.
pub async fn resolve_student_with_fallback(
    db: &DatabaseConnection,
    user_id: i64,
    fallback_student_id: Option<i64>,
) -> ServiceResult<student::Model> {
    if let Some(student) = student::Model::find_by_user_id(db, user_id).await? {
        return Ok(student);
    }

    if let Some(student_id) = fallback_student_id {
        if let Some(student) = StudentEntity::find_by_id(student_id).one(db).await? {
            if student.user_id == user_id {
                return Ok(student);
            }
            return Err(ServiceError::forbidden(
                "student_id does not belong to the authenticated user",
            ));
        }
    }

    Err(ServiceError::not_found("student profile not found"))
}

/// Guard for flows restricted to approved students.
pub fn require_approved(student: &student::Model) -> ServiceResult<()> {
    if student.status != Status::Approved {
        return Err(ServiceError::forbidden(
            "student profile has not been approved",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_student, seed_student_with_status};
    use db::models::student::Status;
    use db::test_utils::setup_test_db;

    #[tokio::test]
    async fn resolves_by_user_id() {
        let db = setup_test_db().await;
        let (user, student) = seed_student(&db, "s1@example.com", "REG-1").await;

        let resolved = resolve_student(&db, user.id).await.unwrap();
        assert_eq!(resolved.id, student.id);
    }

    #[tokio::test]
    async fn fallback_rejects_foreign_student_id() {
        let db = setup_test_db().await;
        let (_u1, s1) = seed_student(&db, "s1@example.com", "REG-1").await;

        // A user with no profile supplying someone else's student id is refused.
        let stray = db::models::user::Model::create(&db, "stray@example.com", "password1", false)
            .await
            .unwrap();
        let err = resolve_student_with_fallback(&db, stray.id, Some(s1.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn fallback_without_profile_is_not_found() {
        let db = setup_test_db().await;
        let stray = db::models::user::Model::create(&db, "stray@example.com", "password1", false)
            .await
            .unwrap();

        let err = resolve_student_with_fallback(&db, stray.id, Some(999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unapproved_student_fails_guard() {
        let db = setup_test_db().await;
        let (_u, pending) =
            seed_student_with_status(&db, "p@example.com", "REG-2", Status::Pending).await;

        assert!(matches!(
            require_approved(&pending).unwrap_err(),
            ServiceError::Forbidden(_)
        ));
    }
}
