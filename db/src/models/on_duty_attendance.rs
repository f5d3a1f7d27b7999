use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, QueryFilter};
use serde::Serialize;

/// One check-in during an approved on-duty window. Not unique per request —
/// multiple check-ins across days are allowed, but at most one per calendar
/// day per request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "on_duty_attendance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub on_duty_request_id: i64,
    pub student_id: i64,
    pub check_in_date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub qr_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::on_duty_request::Entity",
        from = "Column::OnDutyRequestId",
        to = "super::on_duty_request::Column::Id"
    )]
    Request,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::on_duty_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for_day<C: ConnectionTrait>(
        conn: &C,
        request_id: i64,
        student_id: i64,
        day: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::OnDutyRequestId.eq(request_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::CheckInDate.eq(day))
            .one(conn)
            .await
    }
}
