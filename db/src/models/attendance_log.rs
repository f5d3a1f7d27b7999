use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter};
use serde::{Deserialize, Serialize};

/// The canonical per-(student, event) record of whether, how, and with what
/// proof a check-in occurred. QR check-in and photo proof both converge on
/// this row; at most one exists per pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub event_id: i64,
    pub status: Status,
    pub location: Option<String>,
    pub proof_photo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_taken_at: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
    /// The opaque QR payload presented at check-in, kept verbatim.
    pub qr_data: Option<String>,
    pub timestamp: DateTime<Utc>,
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
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "absent")]
    Absent,
}

/// Boundary mapping from participant status to the attendance-log taxonomy.
/// `Registered` has no log-side counterpart and maps to `Absent` only through
/// the completion sweep.
impl From<super::event_participant::Status> for Status {
    fn from(s: super::event_participant::Status) -> Self {
        use super::event_participant::Status as P;
        match s {
            P::Registered | P::Absent => Status::Absent,
            P::Attended => Status::Present,
            P::Late => Status::Late,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
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
    pub async fn find_by_student_and_event<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        event_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::EventId.eq(event_id))
            .one(conn)
            .await
    }
}
