//! Database module
//!
//! Contains the SQLite pool wrapper, row models and repositories.

pub mod database;
pub mod models;
pub mod repositories;

pub use database::{Database, MIGRATOR};
pub use models::{NewUser, User};
pub use repositories::{UserError, UserRepository};
