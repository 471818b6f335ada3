use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret; changing it logs everybody out
    pub secret: String,
    pub token_ttl_minutes: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// One year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

impl AuthConfig {
    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.token_ttl_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy variables (SECRET_KEY, ACCESS_TOKEN_EXPIRE_MINUTES, DATABASE_URL)
    /// 2. Environment variables (DOKIRA__AUTH__SECRET, etc.)
    /// 3. Config file specified by path
    /// 4. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, env::vars().collect())
    }

    /// Same as [`Config::load`] but reads variables from `vars` instead of the
    /// process environment.
    pub fn load_with_env(
        config_path: Option<String>,
        vars: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite:dokira.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.secret", "")?
            .set_default("auth.token_ttl_minutes", 1440)?
            .set_default("auth.secure_cookie", false)?;

        let config_file_path = config_path
            .or_else(|| vars.get("CONFIG_PATH").cloned())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Try to load config file (optional - ignore if not found)
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("DOKIRA")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        if let Some(database_url) = vars.get("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url.as_str())?;
        }
        if let Some(secret) = vars.get("SECRET_KEY") {
            builder = builder.set_override("auth.secret", secret.as_str())?;
        }
        if let Some(minutes) = vars.get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            let minutes: i64 = minutes.trim().parse().map_err(|_| {
                ConfigError::Message(format!(
                    "ACCESS_TOKEN_EXPIRE_MINUTES must be an integer, got {minutes:?}"
                ))
            })?;
            builder = builder.set_override("auth.token_ttl_minutes", minutes)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.secret.len() < 32 {
            return Err("Auth secret must be at least 32 characters long".to_string());
        }
        if self.auth.token_ttl_minutes < 1 {
            return Err("Auth token_ttl_minutes must be at least 1".to_string());
        }
        if self.auth.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(format!(
                "Auth token_ttl_minutes must be at most {MAX_TOKEN_TTL_MINUTES}"
            ));
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        Ok(())
    }
}
