use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::Serialize;

/// Represents an account in the `users` table. Both admins and students
/// authenticate through this table; students additionally carry a profile
/// row in `students`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique email address used for login.
    pub email: String,
    /// Securely hashed password string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account has admin privileges.
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::student::Entity")]
    Student,
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
    /// Creates a new user with an argon2-hashed password.
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
        admin: bool,
    ) -> Result<Self, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))?
            .to_string();

        let now = Utc::now();
        ActiveModel {
            email: Set(email.to_owned()),
            password_hash: Set(hash),
            admin: Set(admin),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Email.eq(email)).one(db).await
    }

    /// Verifies a plaintext password against this user's stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::Model as User;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn create_and_verify_password() {
        let db = setup_test_db().await;

        let user = User::create(&db, "alice@example.com", "hunter242", false)
            .await
            .unwrap();
        assert!(!user.admin);
        assert_ne!(user.password_hash, "hunter242");

        assert!(user.verify_password("hunter242"));
        assert!(!user.verify_password("wrong-password"));

        let found = User::find_by_email(&db, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let db = setup_test_db().await;

        User::create(&db, "bob@example.com", "password1", false)
            .await
            .unwrap();
        let dup = User::create(&db, "bob@example.com", "password2", false).await;
        assert!(dup.is_err());
    }
}
