//! Access token issuance and verification (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::identity::user_identity_lookup;
use crate::config::{JwtConfig, MAX_ACCESS_TOKEN_EXPIRES_SECONDS};
use crate::db::User;

/// Value of the `type` claim on access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a string
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub fresh: bool,
}

impl Claims {
    /// Fresh access-token claims for `subject`, valid for `ttl` from now
    pub fn access(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.into(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl.num_seconds()),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            fresh: false,
        }
    }
}

/// Signs and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        let ttl_seconds = config
            .access_token_expires_seconds
            .clamp(1, MAX_ACCESS_TOKEN_EXPIRES_SECONDS);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_token_ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Issue an access token whose subject is the user's identity
    pub fn create_access_token(&self, user: &User) -> Result<String, TokenError> {
        let subject = user_identity_lookup(user).to_string();
        self.encode_claims(&Claims::access(subject, self.access_token_ttl))
    }

    /// Sign arbitrary claims
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature, time window and token type
    pub fn decode_token(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::Invalid(
                "Only access tokens are allowed".to_string(),
            ));
        }

        Ok(data.claims)
    }

    /// Lifetime of newly issued access tokens
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }
}

/// Token errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}
