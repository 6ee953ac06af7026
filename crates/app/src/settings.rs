//! Settings of the `topup` binary.
//!
//! Read from `settings.toml` (optional) and overridden by `TOPUP__*`
//! environment variables, e.g. `TOPUP__SERVER__PORT=8080`. A missing
//! `[server]` or `[categorizer]` section disables that task.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,
    #[serde(default = "default_categorizer_url")]
    pub categorizer_url: String,
    #[serde(default = "default_categorizer_timeout_ms")]
    pub categorizer_timeout_ms: u64,
    /// Insert the demo users on an empty database.
    #[serde(default)]
    pub seed_demo: bool,
}

fn default_token_ttl_minutes() -> u64 {
    30
}

fn default_categorizer_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_categorizer_timeout_ms() -> u64 {
    5000
}

impl Server {
    pub fn config(&self) -> server::ServerConfig {
        server::ServerConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl: Duration::from_secs(self.token_ttl_minutes * 60),
            categorizer_url: self.categorizer_url.clone(),
            categorizer_timeout: Duration::from_millis(self.categorizer_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Categorizer {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub categorizer: Option<Categorizer>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("TOPUP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
