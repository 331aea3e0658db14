//! Authentication primitives
//!
//! Token issuance/verification, identity resolution between users and token
//! subjects, and password hashing. The HTTP side lives in
//! `crate::middleware::auth`.

pub mod identity;
pub mod jwt;
pub mod password;

pub use identity::{user_identity_lookup, user_lookup_callback};
pub use jwt::{Claims, JwtManager, TokenError, ACCESS_TOKEN_TYPE};
pub use password::{PasswordError, PasswordHasher};
