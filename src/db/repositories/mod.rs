//! Repository pattern implementations
//!
//! Data access objects for database tables.

pub mod user;

pub use user::{UserError, UserRepository};
