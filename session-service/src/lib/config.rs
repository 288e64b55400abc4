use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::session::models::SessionSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub refresh_token_ttl_secs: i64,
    pub password_reset_ttl_secs: i64,
    pub revoke_all_on_reuse: bool,
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.jwt.access_token_ttl_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            refresh_token_ttl: Duration::seconds(self.session.refresh_token_ttl_secs),
            password_reset_ttl: Duration::seconds(self.session.password_reset_ttl_secs),
            revoke_all_on_reuse: self.session.revoke_all_on_reuse,
        }
    }
}
