//! Mapping between users and token subjects

use crate::db::{User, UserError, UserRepository};

/// Identifier embedded as the subject of a user's tokens
pub fn user_identity_lookup(user: &User) -> i64 {
    user.id
}

/// Resolve a token subject back to the user it was issued for.
///
/// Returns `Ok(None)` when no user has that id, including subjects that are
/// not integer ids at all.
pub async fn user_lookup_callback(
    users: &UserRepository,
    subject: &str,
) -> Result<Option<User>, UserError> {
    let Ok(id) = subject.parse::<i64>() else {
        tracing::debug!(subject = %subject, "Token subject is not a user id");
        return Ok(None);
    };

    users.find_by_id(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser};

    async fn repo_with_user() -> (UserRepository, User) {
        let db = Database::connect_with("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        let users = UserRepository::new(db);
        let user = users
            .create(NewUser {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "$2b$04$unused".to_string(),
            })
            .await
            .unwrap();
        (users, user)
    }

    #[tokio::test]
    async fn test_identity_is_primary_key() {
        let (_, user) = repo_with_user().await;
        assert_eq!(user.id, 1);
        assert_eq!(user_identity_lookup(&user), 1);
    }

    #[tokio::test]
    async fn test_lookup_known_subject() {
        let (users, user) = repo_with_user().await;
        let found = user_lookup_callback(&users, "1").await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_lookup_unknown_subject() {
        let (users, _) = repo_with_user().await;
        assert!(user_lookup_callback(&users, "999999").await.unwrap().is_none());
        assert!(user_lookup_callback(&users, "ada").await.unwrap().is_none());
        assert!(user_lookup_callback(&users, "").await.unwrap().is_none());
    }
}
