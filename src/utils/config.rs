//! Layered configuration for medrec.
//!
//! Values come from built-in defaults, then an optional `medrec.toml`, then
//! `MEDREC__SECTION__KEY` environment variables (for example
//! `MEDREC__SERVER__PORT=8080`). Secrets never live in the file: the file
//! names the environment variable that holds them.

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure loaded from medrec.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedrecConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Largest accepted request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
}

fn default_jwt_secret_env() -> String {
    "SECRET_KEY".to_string()
}

fn default_jwt_expiry_hours() -> i64 {
    24
}

/// Upper bound on token lifetime: one year.
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            jwt_expiry_hours: default_jwt_expiry_hours(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, `:memory:`, or a `libsql://` URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable that overrides `url` when set
    #[serde(default = "default_database_url_env")]
    pub url_env: Option<String>,

    /// Environment variable for the remote libsql auth token
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/medrec.db".to_string()
}

fn default_database_url_env() -> Option<String> {
    Some("DATABASE_URL".to_string())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            url_env: default_database_url_env(),
            auth_token_env: None,
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl MedrecConfig {
    /// Load configuration from an optional TOML file plus `MEDREC__*` overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
        }

        let settings = ::config::Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("MEDREC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from TOML text, without environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check the configuration is usable for serving requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt_secret()?;

        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.auth.jwt_expiry_hours) {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_expiry_hours must be between 1 and {}",
                MAX_JWT_EXPIRY_HOURS
            )));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.body_limit_bytes must be positive".to_string(),
            ));
        }
        if let Some(ref env) = self.database.auth_token_env {
            self.resolve_env(env)
                .ok_or_else(|| ConfigError::MissingEnvVar(env.clone()))?;
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// Get the JWT secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    /// Token lifetime in seconds, clamped to the range `validate` accepts.
    pub fn jwt_expiry_seconds(&self) -> i64 {
        self.auth.jwt_expiry_hours.clamp(1, MAX_JWT_EXPIRY_HOURS) * 3600
    }

    /// Database location: the `url_env` variable when set, else `database.url`.
    pub fn database_url(&self) -> String {
        self.database
            .url_env
            .as_deref()
            .and_then(|env| self.resolve_env(env))
            .unwrap_or_else(|| self.database.url.clone())
    }

    pub fn database_auth_token(&self) -> Option<String> {
        self.database
            .auth_token_env
            .as_deref()
            .and_then(|env| self.resolve_env(env))
    }

    /// Effective settings as display pairs. Secrets are reported only as
    /// set or missing.
    pub fn redacted(&self) -> Vec<(&'static str, String)> {
        let presence = |env: &str| match self.resolve_env(env) {
            Some(_) => format!("{env} (set)"),
            None => format!("{env} (missing)"),
        };

        vec![
            ("server.host", self.server.host.clone()),
            ("server.port", self.server.port.to_string()),
            ("server.log_level", self.server.log_level.clone()),
            ("server.log_format", format!("{:?}", self.server.log_format).to_lowercase()),
            ("server.body_limit_bytes", self.server.body_limit_bytes.to_string()),
            ("auth.jwt_secret_env", presence(&self.auth.jwt_secret_env)),
            ("auth.jwt_expiry_hours", self.auth.jwt_expiry_hours.to_string()),
            ("database.url", self.database_url()),
            (
                "database.auth_token_env",
                self.database
                    .auth_token_env
                    .as_deref()
                    .map(presence)
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = MedrecConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.auth.jwt_secret_env, "SECRET_KEY");
        assert_eq!(config.jwt_expiry_seconds(), 24 * 3600);
        assert_eq!(config.database.url, "./data/medrec.db");
    }

    #[test]
    fn test_parse_config() {
        let content = r#"
[server]
host = "0.0.0.0"
port = 8080
log_format = "json"

[auth]
jwt_secret_env = "MEDREC_TEST_PARSE_SECRET"
jwt_expiry_hours = 2

[database]
url = ":memory:"
"#;
        let config = MedrecConfig::from_toml_str(content).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.jwt_expiry_seconds(), 7200);
        assert_eq!(config.database.url, ":memory:");
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = MedrecConfig::from_toml_str(
            "[auth]\njwt_secret_env = \"MEDREC_TEST_UNSET_SECRET\"\n",
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "MEDREC_TEST_UNSET_SECRET"
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_expiry() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("MEDREC_TEST_EXPIRY_SECRET", "test-secret-at-least-32-characters-long");
        }

        let config = MedrecConfig::from_toml_str(
            "[auth]\njwt_secret_env = \"MEDREC_TEST_EXPIRY_SECRET\"\njwt_expiry_hours = 0\n",
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_absurd_expiry() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("MEDREC_TEST_LONG_EXPIRY_SECRET", "test-secret-at-least-32-characters-long");
        }

        let config = MedrecConfig::from_toml_str(&format!(
            "[auth]\njwt_secret_env = \"MEDREC_TEST_LONG_EXPIRY_SECRET\"\njwt_expiry_hours = {}\n",
            i64::MAX
        ))
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("jwt_expiry_hours")
        ));
        assert_eq!(config.jwt_expiry_seconds(), MAX_JWT_EXPIRY_HOURS * 3600);

        let year = MedrecConfig::from_toml_str(&format!(
            "[auth]\njwt_secret_env = \"MEDREC_TEST_LONG_EXPIRY_SECRET\"\njwt_expiry_hours = {}\n",
            MAX_JWT_EXPIRY_HOURS
        ))
        .unwrap();
        assert!(year.validate().is_ok());
    }

    #[test]
    fn test_database_url_env_override() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("MEDREC_TEST_DB_URL", "/tmp/override.db");
        }

        let config = MedrecConfig::from_toml_str(
            "[database]\nurl = \"./local.db\"\nurl_env = \"MEDREC_TEST_DB_URL\"\n",
        )
        .unwrap();
        assert_eq!(config.database_url(), "/tmp/override.db");

        let config = MedrecConfig::from_toml_str(
            "[database]\nurl = \"./local.db\"\nurl_env = \"MEDREC_TEST_DB_URL_UNSET\"\n",
        )
        .unwrap();
        assert_eq!(config.database_url(), "./local.db");
    }

    #[test]
    fn test_redacted_never_prints_secret() {
        // SAFETY: Tests are run single-threaded for env var safety
        unsafe {
            std::env::set_var("MEDREC_TEST_REDACT_SECRET", "super-secret-value");
        }

        let config = MedrecConfig::from_toml_str(
            "[auth]\njwt_secret_env = \"MEDREC_TEST_REDACT_SECRET\"\n",
        )
        .unwrap();
        let pairs = config.redacted();

        assert!(pairs.iter().all(|(_, v)| !v.contains("super-secret-value")));
        assert!(
            pairs
                .iter()
                .any(|(k, v)| *k == "auth.jwt_secret_env" && v.ends_with("(set)"))
        );
    }
}
