use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};

/// A student's registration record for one event. Carries its own status
/// independent of the attendance log; at most one row per (event, student).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "event_participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub student_id: i64,
    pub status: Status,
    pub check_in_time: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

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
    #[sea_orm(string_value = "registered")]
    Registered,
    #[sea_orm(string_value = "attended")]
    Attended,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "absent")]
    Absent,
}

impl Status {
    /// Statuses counted against an event's capacity.
    pub fn occupies_seat(self) -> bool {
        matches!(self, Status::Registered | Status::Attended | Status::Late)
    }

    pub fn is_checked_in(self) -> bool {
        matches!(self, Status::Attended | Status::Late)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_event_and_student<C: ConnectionTrait>(
        conn: &C,
        event_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::StudentId.eq(student_id))
            .one(conn)
            .await
    }

    /// Number of participants holding a seat (registered, attended, or late).
    pub async fn count_seated<C: ConnectionTrait>(conn: &C, event_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::Status.is_in([Status::Registered, Status::Attended, Status::Late]))
            .count(conn)
            .await
    }
}
