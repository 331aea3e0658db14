//! JWT authentication middleware
//!
//! Protected routes require an access token in a request header. The token
//! subject is resolved to a user with `user_lookup_callback`; the user is
//! then available to handlers as `Extension<CurrentUser>`.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::auth::{user_lookup_callback, JwtManager, TokenError};
use crate::config::JwtConfig;
use crate::db::{User, UserRepository};
use crate::error::ErrorResponse;

/// The user a request was authenticated as
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Authentication Errors
// ============================================================================

#[derive(Debug)]
pub enum AuthError {
    /// The configured token header is absent
    MissingToken { header: String },
    /// The header is present but not `<type> <token>`
    MalformedHeader { header: String, header_type: String },
    /// Signature, claims or token type failed verification
    InvalidToken(String),
    /// The token's `exp` is in the past
    TokenExpired,
    /// The token is valid but names no existing user
    UserNotFound { subject: String },
    /// Internal error during authentication
    InternalError(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid(msg) => AuthError::InvalidToken(msg),
            TokenError::Encoding(msg) => AuthError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::MissingToken { header } => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                format!("Missing {header} Header"),
            ),
            AuthError::MalformedHeader {
                header,
                header_type,
            } => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                format!("Bad {header} header. Expected '{header}: {header_type} <JWT>'"),
            ),
            AuthError::InvalidToken(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_token_error",
                msg,
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "Token has expired".to_string(),
            ),
            AuthError::UserNotFound { subject } => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                format!("Error loading the user {subject}"),
            ),
            AuthError::InternalError(msg) => {
                tracing::error!(error = %msg, "Authentication internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "api_error",
                    "An internal error occurred during authentication.".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, &message))).into_response()
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// State required by the JWT middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtManager>,
    pub users: UserRepository,
    pub header_name: String,
    pub header_type: String,
}

impl AuthState {
    pub fn new(config: &JwtConfig, jwt: Arc<JwtManager>, users: UserRepository) -> Self {
        Self {
            jwt,
            users,
            header_name: config.header_name.clone(),
            header_type: config.header_type.clone(),
        }
    }
}

/// Middleware that rejects requests without a valid access token
///
/// # Errors
/// - 401 Unauthorized: missing/malformed header, expired token, unknown user
/// - 422 Unprocessable Entity: token fails verification
/// - 500 Internal Server Error: database error during user lookup
pub async fn require_jwt(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(request.headers(), &auth.header_name, &auth.header_type)?;

    let claims = auth.jwt.decode_token(&token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected access token");
        AuthError::from(e)
    })?;

    let user = user_lookup_callback(&auth.users, &claims.sub)
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    let Some(user) = user else {
        tracing::warn!(subject = %claims.sub, "Token subject does not match any user");
        return Err(AuthError::UserNotFound {
            subject: claims.sub,
        });
    };

    tracing::debug!(user_id = user.id, "Access token authenticated");

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Pull the raw token out of `header_name`.
///
/// With an empty `header_type` the whole header value is the token;
/// otherwise the value must read `<header_type> <token>`.
pub fn extract_token(
    headers: &HeaderMap,
    header_name: &str,
    header_type: &str,
) -> Result<String, AuthError> {
    let value = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingToken {
            header: header_name.to_string(),
        })?;

    if header_type.is_empty() {
        return Ok(value.to_string());
    }

    let malformed = || AuthError::MalformedHeader {
        header: header_name.to_string(),
        header_type: header_type.to_string(),
    };

    match value.split_once(' ') {
        Some((prefix, token)) if prefix == header_type && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(malformed()),
    }
}

// ============================================================================
// Tests
// ============================================================================
