//! Application settings and configuration
//!
//! Settings are read from environment variables (after an optional `.env`
//! file). `DATABASE_URI` has no default: the service refuses to start
//! without it.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Lowest and highest cost accepted by bcrypt
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Longest accepted access token lifetime (ten years)
pub const MAX_ACCESS_TOKEN_EXPIRES_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Application environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// JWT issuance and lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// HS256 signing secret
    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Access token lifetime in seconds
    pub access_token_expires_seconds: i64,

    /// Header carrying the token
    pub header_name: String,

    /// Prefix in front of the token inside the header (e.g. `Bearer`)
    pub header_type: String,

    /// True when no secret was configured and one was generated for this process
    #[serde(skip)]
    pub ephemeral_secret: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: generate_ephemeral_secret(),
            access_token_expires_seconds: 900,
            header_name: "Authorization".to_string(),
            header_type: "Bearer".to_string(),
            ephemeral_secret: true,
        }
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|o| o == "*") {
            return Self::default();
        }

        Self {
            allowed_origins: origins,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty()
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Database
    #[serde(skip_serializing)]
    pub database_uri: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,

    // Cross-origin
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let environment: Environment = get_or("ENVIRONMENT", "development").parse()?;

        let database_uri = get("DATABASE_URI")
            .context("DATABASE_URI must be set to the database connection string")?;

        let jwt = match get("JWT_SECRET_KEY") {
            Some(secret_key) => JwtConfig {
                secret_key,
                ephemeral_secret: false,
                ..JwtConfig::default()
            },
            None => JwtConfig::default(),
        };

        let jwt = JwtConfig {
            access_token_expires_seconds: get_or("JWT_ACCESS_TOKEN_EXPIRES", "900")
                .parse()
                .context("Invalid JWT_ACCESS_TOKEN_EXPIRES value")?,
            header_name: get_or("JWT_HEADER_NAME", "Authorization"),
            // Set but blank means the header carries the bare token
            header_type: lookup("JWT_HEADER_TYPE")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| "Bearer".to_string()),
            ..jwt
        };

        let settings = Self {
            app_name: get_or("APP_NAME", "musify"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            log_level: get_or("LOG_LEVEL", "info"),

            host: get_or("HOST", "0.0.0.0"),
            port: get_or("PORT", "5000")
                .parse()
                .context("Invalid PORT value")?,

            database_uri,
            database_max_connections: get_or("DATABASE_MAX_CONNECTIONS", "5")
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS value")?,

            jwt,
            bcrypt_cost: get_or("BCRYPT_LOG_ROUNDS", "12")
                .parse()
                .context("Invalid BCRYPT_LOG_ROUNDS value")?,

            cors: CorsConfig::parse(&get_or("CORS_ORIGINS", "*")),
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Check cross-field constraints
    ///
    /// Runs at the end of `from_lookup`; call it again after applying CLI
    /// overrides.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            anyhow::bail!(
                "BCRYPT_LOG_ROUNDS must be between {} and {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            );
        }

        let expires = self.jwt.access_token_expires_seconds;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRES_SECONDS).contains(&expires) {
            anyhow::bail!(
                "JWT_ACCESS_TOKEN_EXPIRES must be between 1 and {} seconds",
                MAX_ACCESS_TOKEN_EXPIRES_SECONDS
            );
        }

        if self.is_production() && self.jwt.ephemeral_secret {
            anyhow::bail!("JWT_SECRET_KEY must be set in production");
        }

        if self.jwt.header_name.is_empty() {
            anyhow::bail!("JWT_HEADER_NAME cannot be empty");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "musify".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_uri: "sqlite::memory:".to_string(),
            database_max_connections: 5,
            jwt: JwtConfig::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors: CorsConfig::default(),
        }
    }
}

/// Random signing secret for processes started without `JWT_SECRET_KEY`.
/// Tokens signed with it stop verifying after a restart.
fn generate_ephemeral_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_database_uri_is_an_error() {
        let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URI"));

        let err = Settings::from_lookup(lookup_from(&[("DATABASE_URI", "  ")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URI"));
    }

    #[test]
    fn test_defaults_from_minimal_environment() {
        let settings =
            Settings::from_lookup(lookup_from(&[("DATABASE_URI", "sqlite://musify.db")])).unwrap();

        assert_eq!(settings.database_uri, "sqlite://musify.db");
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.jwt.header_name, "Authorization");
        assert_eq!(settings.jwt.header_type, "Bearer");
        assert_eq!(settings.jwt.access_token_expires_seconds, 900);
        assert!(settings.jwt.ephemeral_secret);
        assert!(!settings.jwt.secret_key.is_empty());
        assert_eq!(settings.bcrypt_cost, 12);
        assert!(settings.cors.allows_any_origin());
    }

    #[test]
    fn test_configured_jwt_secret() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("JWT_SECRET_KEY", "super-secret"),
            ("JWT_ACCESS_TOKEN_EXPIRES", "60"),
        ]))
        .unwrap();

        assert_eq!(settings.jwt.secret_key, "super-secret");
        assert!(!settings.jwt.ephemeral_secret);
        assert_eq!(settings.jwt.access_token_expires_seconds, 60);
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let err = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("ENVIRONMENT", "prod"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET_KEY"));
    }

    #[test]
    fn test_production_override_revalidated() {
        let mut settings =
            Settings::from_lookup(lookup_from(&[("DATABASE_URI", "sqlite::memory:")])).unwrap();
        assert!(settings.jwt.ephemeral_secret);

        settings.environment = Environment::Production;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET_KEY"));

        settings.jwt.secret_key = "configured".to_string();
        settings.jwt.ephemeral_secret = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_access_token_lifetime_bounds() {
        for value in ["0", "-5", "9223372036854775807", "315360001"] {
            let err = Settings::from_lookup(lookup_from(&[
                ("DATABASE_URI", "sqlite::memory:"),
                ("JWT_ACCESS_TOKEN_EXPIRES", value),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_ACCESS_TOKEN_EXPIRES"), "{value}");
        }

        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("JWT_ACCESS_TOKEN_EXPIRES", "315360000"),
        ]))
        .unwrap();
        assert_eq!(
            settings.jwt.access_token_expires_seconds,
            MAX_ACCESS_TOKEN_EXPIRES_SECONDS
        );
    }

    #[test]
    fn test_jwt_header_type_is_trimmed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("JWT_HEADER_TYPE", "  "),
        ]))
        .unwrap();
        assert_eq!(settings.jwt.header_type, "");

        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("JWT_HEADER_TYPE", " JWT "),
        ]))
        .unwrap();
        assert_eq!(settings.jwt.header_type, "JWT");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("PORT", "not-a-port"),
        ]))
        .is_err());

        assert!(Settings::from_lookup(lookup_from(&[
            ("DATABASE_URI", "sqlite::memory:"),
            ("BCRYPT_LOG_ROUNDS", "2"),
        ]))
        .is_err());
    }

    #[test]
    fn test_cors_origins_parsing() {
        let cors = CorsConfig::parse("https://a.example, https://b.example,");
        assert_eq!(
            cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );

        assert!(CorsConfig::parse("https://a.example,*").allows_any_origin());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:5000");
    }
}
