//! Configuration types.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

/// Deployment mode. Development exposes full error diagnostics; production hides non-operational detail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// Absent means the in-memory document store is used.
    pub database_url: Option<String>,
    /// JSON array of user documents inserted at startup.
    pub users_seed_path: Option<PathBuf>,
    pub body_limit_bytes: usize,
}

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024;

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            environment: Environment::Development,
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            database_url: None,
            users_seed_path: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
