use colored::Colorize;
use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

pub async fn run_all_migrations(url: &str) {
    let db = Database::connect(url)
        .await
        .expect("Failed to connect to database");

    match Migrator::up(&db, None).await {
        Ok(()) => println!("{}", "All migrations applied".green()),
        Err(e) => {
            eprintln!("{} {e}", "Migration failed:".red());
            std::process::exit(1);
        }
    }
}
