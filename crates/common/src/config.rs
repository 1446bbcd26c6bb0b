//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bulk removal workflow configuration.
    #[serde(default)]
    pub removal: RemovalConfig,
    /// Privileged user administration configuration.
    #[serde(default)]
    pub user_admin: UserAdminConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Bulk removal workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemovalConfig {
    /// Word the operator must type before a removal may run.
    #[serde(default = "default_confirmation_word")]
    pub confirmation_word: String,
    /// How long an unfinished removal session is kept, in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            confirmation_word: default_confirmation_word(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Privileged user administration configuration.
///
/// When `endpoint` is unset the procedure runs in-process against the database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAdminConfig {
    /// URL of an externally hosted user administration function.
    #[serde(default)]
    pub endpoint: Option<url::Url>,
    /// Service key sent as a bearer token to the external function.
    #[serde(default)]
    pub service_key: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_confirmation_word() -> String {
    "REMOVER".to_string()
}

const fn default_session_ttl_secs() -> u64 {
    30 * 60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `GRANTDESK_ENV`)
    /// 4. Environment variables with `GRANTDESK__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("GRANTDESK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GRANTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("GRANTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [server]
            [database]
            url = "postgres://localhost/grantdesk"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.removal.confirmation_word, "REMOVER");
        assert_eq!(config.removal.session_ttl_secs, 1800);
        assert!(config.user_admin.endpoint.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_remote_user_admin_endpoint() {
        let config = parse(
            r#"
            [server]
            port = 8080
            [database]
            url = "postgres://localhost/grantdesk"
            [removal]
            confirmation_word = "DELETE"
            [user_admin]
            endpoint = "https://functions.example.com/manage-users"
            service_key = "secret"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.removal.confirmation_word, "DELETE");
        assert_eq!(
            config.user_admin.endpoint.unwrap().as_str(),
            "https://functions.example.com/manage-users"
        );
        assert_eq!(config.user_admin.service_key.as_deref(), Some("secret"));
    }
}
