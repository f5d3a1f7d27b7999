use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202601150001_create_users::Migration),
            Box::new(migrations::m202601150002_create_students::Migration),
            Box::new(migrations::m202601150003_create_events::Migration),
            Box::new(migrations::m202601150004_create_event_participants::Migration),
            Box::new(migrations::m202601150005_create_attendance_logs::Migration),
            Box::new(migrations::m202601150006_create_on_duty_requests::Migration),
            Box::new(migrations::m202601150007_create_on_duty_attendance::Migration),
        ]
    }
}
