use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};

/// An event students can register for and check in to.
///
/// `event_date` and `event_time` are stored as text on purpose: rows imported
/// from the legacy system can carry unparseable values, and the completion
/// gate treats those as "not completed" rather than erroring.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    /// Calendar date, expected format `YYYY-MM-DD`.
    pub event_date: String,
    /// Optional clock time, expected format `HH:MM:SS` or `HH:MM`.
    pub event_time: Option<String>,
    pub status: Status,
    pub max_participants: Option<i32>,
    /// Minutes after the start time during which check-in still counts as on-time.
    pub grace_period_minutes: i32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of an event.
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
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl Status {
    /// Statuses that mean the event is administratively over.
    pub fn is_concluded(self) -> bool {
        matches!(self, Status::Completed | Status::Archived)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::event_participant::Entity")]
    Participants,
    #[sea_orm(has_many = "super::attendance_log::Entity")]
    AttendanceLogs,
}

impl Related<super::event_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewEvent<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub venue: Option<&'a str>,
    pub event_date: &'a str,
    pub event_time: Option<&'a str>,
    pub max_participants: Option<i32>,
    pub grace_period_minutes: Option<i32>,
    pub created_by: i64,
}

impl Model {
    pub async fn create(db: &DatabaseConnection, new: NewEvent<'_>) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            title: Set(new.title.to_owned()),
            description: Set(new.description.map(|s| s.to_owned())),
            venue: Set(new.venue.map(|s| s.to_owned())),
            event_date: Set(new.event_date.to_owned()),
            event_time: Set(new.event_time.map(|s| s.to_owned())),
            status: Set(Status::Active),
            max_participants: Set(new.max_participants),
            grace_period_minutes: Set(new.grace_period_minutes.unwrap_or(15)),
            created_by: Set(new.created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
