use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601150007_create_on_duty_attendance"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("on_duty_attendance"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("on_duty_request_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("student_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("check_in_date"))
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("latitude")).double().not_null())
                    .col(ColumnDef::new(Alias::new("longitude")).double().not_null())
                    .col(ColumnDef::new(Alias::new("address")).string().null())
                    .col(
                        ColumnDef::new(Alias::new("selfie_photo_url"))
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Alias::new("qr_data")).text().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_on_duty_attendance_request")
                            .from(
                                Alias::new("on_duty_attendance"),
                                Alias::new("on_duty_request_id"),
                            )
                            .to(Alias::new("on_duty_requests"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_on_duty_attendance_student")
                            .from(Alias::new("on_duty_attendance"), Alias::new("student_id"))
                            .to(Alias::new("students"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one check-in per request per calendar day.
        manager
            .create_index(
                Index::create()
                    .name("uq_on_duty_attendance_request_student_date")
                    .table(Alias::new("on_duty_attendance"))
                    .col(Alias::new("on_duty_request_id"))
                    .col(Alias::new("student_id"))
                    .col(Alias::new("check_in_date"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("on_duty_attendance"))
                    .to_owned(),
            )
            .await
    }
}
