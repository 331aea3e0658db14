//! SQLite connection pool wrapper

use sqlx::{
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Settings;

/// Migrations embedded from `./migrations` at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Database handle shared by repositories.
///
/// Cloning is cheap: the underlying pool is reference counted.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect using the configured `DATABASE_URI` and pool size
    pub async fn connect(settings: &Settings) -> Result<Self, sqlx::Error> {
        Self::connect_with(&settings.database_uri, settings.database_max_connections).await
    }

    /// Connect to `uri` with at most `max_connections` pooled connections.
    ///
    /// An in-memory database lives only as long as its connection, so it is
    /// pinned to a single connection that is never recycled.
    pub async fn connect_with(uri: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = uri.contains(":memory:") || uri.contains("mode=memory");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        tracing::debug!(in_memory, max_connections, "Opening database pool");

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(8))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that the database answers a trivial query
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                tracing::debug!("Database health check passed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        }
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_migrates_and_is_healthy() {
        let db = Database::connect_with("sqlite::memory:", 5).await.unwrap();
        db.migrate().await.unwrap();
        assert!(db.health_check().await);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::connect_with("sqlite::memory:", 1).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
