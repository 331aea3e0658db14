//! Application state container
//!
//! The shared state handed to every handler through axum's `State`
//! extractor. Cloning is cheap: every field is reference counted or `Copy`.

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{JwtManager, PasswordHasher};
use crate::config::Settings;
use crate::db::{Database, UserRepository};
use crate::middleware::AuthState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Database pool
    pub database: Database,

    /// User table access
    pub users: UserRepository,

    /// Access token issuer/verifier
    pub jwt: Arc<JwtManager>,

    /// bcrypt hasher with the configured cost
    pub passwords: PasswordHasher,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Connect to the database, apply migrations and build the state
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        if settings.jwt.ephemeral_secret {
            tracing::warn!(
                "JWT_SECRET_KEY is not set; using a generated secret. \
                 Issued tokens will not survive a restart."
            );
        }

        tracing::debug!("Connecting to database");
        let database = Database::connect(&settings)
            .await
            .context("Failed to connect to DATABASE_URI")?;

        database
            .migrate()
            .await
            .context("Failed to apply database migrations")?;

        let state = Self::with_database(settings, database);

        tracing::info!("Application state initialized successfully");

        Ok(state)
    }

    /// Build the state around an already prepared database
    pub fn with_database(settings: Settings, database: Database) -> Self {
        let jwt = Arc::new(JwtManager::new(&settings.jwt));
        let passwords = PasswordHasher::new(settings.bcrypt_cost);
        let users = UserRepository::new(database.clone());

        Self {
            settings: Arc::new(settings),
            database,
            users,
            jwt,
            passwords,
            start_time: Instant::now(),
        }
    }

    /// State for the JWT middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState::new(&self.settings.jwt, self.jwt.clone(), self.users.clone())
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory database, fixed JWT secret and the cheapest bcrypt cost
    pub(crate) async fn for_tests() -> Self {
        use crate::config::JwtConfig;

        let settings = Settings {
            bcrypt_cost: 4,
            jwt: JwtConfig {
                secret_key: "test-secret".to_string(),
                ephemeral_secret: false,
                ..JwtConfig::default()
            },
            ..Settings::default()
        };

        let database = Database::connect_with("sqlite::memory:", 1).await.unwrap();
        database.migrate().await.unwrap();

        Self::with_database(settings, database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_connects_and_migrates() {
        let settings = Settings::default();
        let state = AppState::new(settings).await.unwrap();

        assert!(state.database.health_check().await);
        assert!(state.users.find_by_id(1).await.unwrap().is_none());
        assert_eq!(state.passwords.cost(), 12);
    }

    #[tokio::test]
    async fn test_auth_state_uses_configured_header() {
        let state = AppState::for_tests().await;
        let auth = state.auth_state();
        assert_eq!(auth.header_name, "Authorization");
        assert_eq!(auth.header_type, "Bearer");
    }
}
