use std::env;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Decides the session cookie flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(mode) if mode.eq_ignore_ascii_case("production") => DeploymentMode::Production,
            _ => DeploymentMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub token_secret: String,
    pub port: u16,
    pub mode: DeploymentMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = required(&lookup, "DB_USER")?;
                let pass = required(&lookup, "DB_PASS")?;
                let host = lookup("DB_HOST").unwrap_or_else(|| "cluster0.mongodb.net".to_string());
                // Credentials may hold URI delimiters such as `@` or `:`.
                format!(
                    "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority&appName=Cluster0",
                    urlencoding::encode(&user),
                    urlencoding::encode(&pass),
                    host
                )
            }
        };

        let database_name = lookup("DB_NAME").unwrap_or_else(|| "zenovaDB".to_string());
        let token_secret = required(&lookup, "ACCESS_TOKEN_SECRET")?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::ParseError {
                key: "PORT".to_string(),
                details: format!("{}", e),
            })?,
            None => 7000,
        };

        let mode = DeploymentMode::from_value(lookup("NODE_ENV").as_deref());

        Ok(AppConfig {
            database_url,
            database_name,
            token_secret,
            port,
            mode,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
