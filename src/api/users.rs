//! Account endpoints: signup, login and the current user

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{NewUser, User};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// A user together with a freshly issued access token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    fn issue(state: &AppState, user: User) -> Result<Self, ApiError> {
        let access_token = state
            .jwt
            .create_access_token(&user)
            .map_err(|e| ApiError::Internal(e.into()))?;

        Ok(Self {
            user,
            access_token,
            token_type: state.settings.jwt.header_type.clone(),
            expires_in: state.jwt.access_token_ttl().num_seconds(),
        })
    }
}

/// POST /signup
///
/// Unreadable bodies and failed validation both produce a 400.
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let password_hash = state.passwords.hash(&payload.password).await?;

    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::issue(&state, user)?)))
}

/// POST /login
///
/// Unknown usernames and wrong passwords produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let Some(user) = state.users.find_by_username(&payload.username).await? else {
        tracing::info!(username = %payload.username, "Login for unknown user");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !state
        .passwords
        .verify(&payload.password, &user.password_hash)
        .await?
    {
        tracing::info!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(TokenResponse::issue(&state, user)?))
}

/// GET /me (JWT required)
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_signup_request_validation() {
        assert!(signup_request("ada", "ada@example.com", "correct horse")
            .validate()
            .is_ok());

        assert!(signup_request("", "ada@example.com", "correct horse")
            .validate()
            .is_err());
        assert!(signup_request(&"a".repeat(65), "ada@example.com", "correct horse")
            .validate()
            .is_err());
        assert!(signup_request("ada", "ada", "correct horse")
            .validate()
            .is_err());
        assert!(signup_request("ada", "ada@example.com", "x").validate().is_err());
    }
}
