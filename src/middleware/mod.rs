//! Middleware module
//!
//! Contains HTTP middleware for JWT authentication and request logging.

pub mod auth;
pub mod logging;

pub use auth::{require_jwt, AuthError, AuthState, CurrentUser};
pub use logging::{log_request, TraceId, REQUEST_ID_HEADER, TRACE_ID_HEADER};
