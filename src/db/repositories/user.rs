//! User repository
//!
//! Data access layer for the `users` table.

use chrono::Utc;

use crate::db::models::{NewUser, User};
use crate::db::Database;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

/// Repository for user operations
#[derive(Clone, Debug)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up a user by primary key
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    /// Look up a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    /// Insert a new user and return the stored row
    ///
    /// Fails with `UserError::AlreadyExists` when the username or email is taken.
    pub async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, created_at) \
             VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(Utc::now().timestamp())
            .fetch_one(self.db.pool())
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User created");

        Ok(user)
    }

    /// Delete a user. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Errors that can occur during user operations
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("User already exists")]
    AlreadyExists,
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                UserError::AlreadyExists
            }
            _ => UserError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> UserRepository {
        let db = Database::connect_with("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        UserRepository::new(db)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$2b$04$not-a-real-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repo().await;

        let created = repo.create(new_user("ada")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.username, "ada");
        assert!(created.created_at > 0);

        let by_id = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));

        let by_name = repo.find_by_username("ada").await.unwrap();
        assert_eq!(by_name, Some(created));
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let repo = repo().await;
        assert!(repo.find_by_id(999_999).await.unwrap().is_none());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = repo().await;
        repo.create(new_user("ada")).await.unwrap();

        let mut duplicate = new_user("ada");
        duplicate.email = "other@example.com".to_string();

        let err = repo.create(duplicate).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let user = repo.create(new_user("ada")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
    }
}
