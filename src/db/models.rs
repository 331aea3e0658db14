//! Database row models

use serde::Serialize;
use sqlx::FromRow;

/// A registered user.
///
/// Stored in the `users` table with `id` as primary key. `id` is also the
/// subject of every access token issued for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    /// bcrypt hash; never leaves the service
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Unix timestamp when the user was created
    pub created_at: i64,
}

/// Insert payload for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: 0,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "ada");
        assert!(json.get("password_hash").is_none());
    }
}
