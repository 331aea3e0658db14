//! Configuration management module
//!
//! Loads and validates application configuration from environment
//! variables and `.env` files.

pub mod settings;

pub use settings::{
    CorsConfig, Environment, JwtConfig, Settings, MAX_ACCESS_TOKEN_EXPIRES_SECONDS,
};
