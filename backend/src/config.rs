//! Configuration for the RecordVault backend.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

use crate::aggregate::AggregationMode;
use crate::store::password::{DEFAULT_HASH_ROUNDS, MIN_HASH_ROUNDS};

/// Password the admin account is seeded with when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Account seeded on every boot if missing.
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for paths no API route matches.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, with or without a `sqlite:` prefix. `:memory:` is accepted.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// PBKDF2 iteration count for new password hashes.
    #[serde(default = "default_hash_rounds")]
    pub hash_rounds: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hash_rounds: default_hash_rounds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AggregationConfig {
    #[serde(default)]
    pub mode: AggregationMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("security.hash_rounds must be at least {min}, got {got}")]
    HashRoundsTooLow { got: u32, min: u32 },
    #[error("admin.{0} must not be empty")]
    EmptyAdminField(&'static str),
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_database_url() -> String {
    "sqlite:./data/database.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_email() -> String {
    "admin@recordvault.local".to_string()
}
fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}
fn default_hash_rounds() -> u32 {
    DEFAULT_HASH_ROUNDS
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (RECORDVAULT__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("database.url", default_database_url())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RECORDVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the store cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.hash_rounds < MIN_HASH_ROUNDS {
            return Err(ConfigError::HashRoundsTooLow {
                got: self.security.hash_rounds,
                min: MIN_HASH_ROUNDS,
            });
        }
        if self.admin.username.is_empty() {
            return Err(ConfigError::EmptyAdminField("username"));
        }
        if self.admin.email.is_empty() {
            return Err(ConfigError::EmptyAdminField("email"));
        }
        if self.admin.password.is_empty() {
            return Err(ConfigError::EmptyAdminField("password"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);
        assert!(server.static_dir.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.aggregation.mode, AggregationMode::BestEffort);
    }

    #[test]
    fn test_low_hash_rounds_rejected() {
        let mut config = Config::default();
        config.security.hash_rounds = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HashRoundsTooLow { got: 10, .. })
        ));
    }

    #[test]
    fn test_empty_admin_password_rejected() {
        let mut config = Config::default();
        config.admin.password = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyAdminField("password"))
        ));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let loaded = ConfigLoader::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 9000

                [aggregation]
                mode = "strict"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = loaded.try_deserialize().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.aggregation.mode, AggregationMode::Strict);
        assert_eq!(config.security.hash_rounds, DEFAULT_HASH_ROUNDS);
    }
}
