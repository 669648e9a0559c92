use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub server: GymWebServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtAuthConfig,
    pub smtp: SmtpConfig,
    pub app: ApplicationConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(format!("Failed to find the current dir: {}", e)))?;
        let config_dir = base_path.join("configuration");

        let app_environment: Environment = std::env::var("GYM_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.yaml")).required(true))
            .add_source(
                config::File::from(config_dir.join(format!("{}.yaml", app_environment.as_str())))
                    .required(false),
            )
            // GYM__JWT__SECRET=... overrides jwt.secret
            .add_source(
                config::Environment::with_prefix("GYM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone)]
pub struct GymWebServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        Ok(options.log_statements(tracing::log::LevelFilter::Trace))
    }
}

#[derive(Deserialize, Clone)]
pub struct JwtAuthConfig {
    pub secret: Secret<String>,
    pub token_expiration_hours: i64,
}

#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_name: String,
    pub from_email: String,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationConfig {
    pub frontend_url: String,
    pub verification_token_hours: i64,
    pub reset_token_minutes: i64,
}

impl ApplicationConfig {
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email/{}", self.frontend_url.trim_end_matches('/'), token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.frontend_url.trim_end_matches('/'), token)
    }
}

impl JwtAuthConfig {
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local` or `production` ",
                other
            )),
        }
    }
}
