pub mod attendance;
pub mod error;
pub mod events;
pub mod on_duty;
pub mod proof;
pub mod students;

pub use error::{ServiceError, ServiceResult};

#[cfg(test)]
pub(crate) mod testing {
    use db::models::{event, student, user};
    use sea_orm::DatabaseConnection;

    pub async fn seed_admin(db: &DatabaseConnection) -> user::Model {
        user::Model::create(db, "admin@example.com", "admin-password", true)
            .await
            .unwrap()
    }

    /// Creates a user + approved student profile, returning both.
    pub async fn seed_student(
        db: &DatabaseConnection,
        email: &str,
        reg_number: &str,
    ) -> (user::Model, student::Model) {
        seed_student_with_status(db, email, reg_number, student::Status::Approved).await
    }

    pub async fn seed_student_with_status(
        db: &DatabaseConnection,
        email: &str,
        reg_number: &str,
        status: student::Status,
    ) -> (user::Model, student::Model) {
        let user = user::Model::create(db, email, "password123", false)
            .await
            .unwrap();
        let student = student::Model::create(db, user.id, reg_number, "Test Student", None, status)
            .await
            .unwrap();
        (user, student)
    }

    pub async fn seed_event(
        db: &DatabaseConnection,
        created_by: i64,
        event_date: &str,
        event_time: Option<&str>,
        max_participants: Option<i32>,
    ) -> event::Model {
        event::Model::create(
            db,
            event::NewEvent {
                title: "Tech Symposium",
                description: None,
                venue: Some("Main Hall"),
                event_date,
                event_time,
                max_participants,
                grace_period_minutes: Some(15),
                created_by,
            },
        )
        .await
        .unwrap()
    }
}
