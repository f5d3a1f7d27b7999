use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};

/// A student profile, projected off a user account. Only `approved` students
/// may register for events or submit on-duty requests.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// Unique registration number assigned by the institution.
    pub reg_number: String,
    pub full_name: String,
    pub college_name: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Approval state of a student profile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    sea_orm::strum::Display,
    sea_orm::strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::event_participant::Entity")]
    Participations,
    #[sea_orm(has_many = "super::attendance_log::Entity")]
    AttendanceLogs,
    #[sea_orm(has_many = "super::on_duty_request::Entity")]
    OnDutyRequests,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        user_id: i64,
        reg_number: &str,
        full_name: &str,
        college_name: Option<&str>,
        status: Status,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            user_id: Set(user_id),
            reg_number: Set(reg_number.to_owned()),
            full_name: Set(full_name.to_owned()),
            college_name: Set(college_name.map(|s| s.to_owned())),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_user_id(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{Model as Student, Status};
    use crate::models::user::Model as User;
    use crate::models::{attendance_log, event};
    use crate::test_utils::setup_test_db;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, ModelTrait, Set};

    #[tokio::test]
    async fn create_and_lookup_by_user() {
        let db = setup_test_db().await;

        let user = User::create(&db, "stud@example.com", "password1", false)
            .await
            .unwrap();
        let student = Student::create(&db, user.id, "REG-1001", "Sam Student", None, Status::Pending)
            .await
            .unwrap();
        assert_eq!(student.status, Status::Pending);

        let found = Student::find_by_user_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(found.id, student.id);
        assert_eq!(found.reg_number, "REG-1001");
    }

    #[tokio::test]
    async fn duplicate_reg_number_rejected() {
        let db = setup_test_db().await;

        let u1 = User::create(&db, "a@example.com", "password1", false)
            .await
            .unwrap();
        let u2 = User::create(&db, "b@example.com", "password1", false)
            .await
            .unwrap();

        Student::create(&db, u1.id, "REG-1", "A", None, Status::Approved)
            .await
            .unwrap();
        let dup = Student::create(&db, u2.id, "REG-1", "B", None, Status::Approved).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn attendance_log_links_back_to_its_student() {
        let db = setup_test_db().await;

        let user = User::create(&db, "stud@example.com", "password1", false)
            .await
            .unwrap();
        let student = Student::create(&db, user.id, "REG-7", "Sam Student", None, Status::Approved)
            .await
            .unwrap();
        let event = event::Model::create(
            &db,
            event::NewEvent {
                title: "Tech Symposium",
                description: None,
                venue: None,
                event_date: "2099-06-01",
                event_time: None,
                max_participants: None,
                grace_period_minutes: None,
                created_by: user.id,
            },
        )
        .await
        .unwrap();

        let log = attendance_log::ActiveModel {
            student_id: Set(student.id),
            event_id: Set(event.id),
            status: Set(attendance_log::Status::Present),
            timestamp: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let owner = log
            .find_related(super::Entity)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.id, student.id);
    }
}
