use anyhow::{Context, Result};
use cnpg_broker_orchestrations::AdapterOptions;
use std::path::PathBuf;

/// Process configuration, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Basic auth credentials; auth is on only when both are set
    pub username: Option<String>,
    pub password: Option<String>,
    pub log_level: String,
    pub log_timestamp: bool,
    pub log_dir: Option<PathBuf>,
    /// YAML catalog replacing the built-in offering
    pub catalog_path: Option<PathBuf>,
    /// Delete a partially created namespace; off unless BROKER_ROLLBACK_ON_FAILURE is set
    pub rollback_on_failure: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            username: non_empty_var("BROKER_USERNAME"),
            password: non_empty_var("BROKER_PASSWORD"),
            log_level: non_empty_var("BROKER_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_timestamp: bool_var("BROKER_LOG_TIMESTAMP", false)?,
            log_dir: non_empty_var("BROKER_LOG_DIR").map(PathBuf::from),
            catalog_path: non_empty_var("BROKER_CATALOG_PATH").map(PathBuf::from),
            rollback_on_failure: bool_var(
                "BROKER_ROLLBACK_ON_FAILURE",
                AdapterOptions::default().rollback_on_failure,
            )?,
        })
    }

    /// `(username, password)` when basic auth is enabled
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match non_empty_var(name) {
        Some(value) => parse_bool(&value).with_context(|| format!("{} must be true or false", name)),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => anyhow::bail!("invalid boolean '{}'", other),
    }
}
