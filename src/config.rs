use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub email_webhook_url: Option<String>,
    pub notification_webhook_url: Option<String>,
    pub webhook_secret: String,
    pub reminder_lead_minutes: i64,
    pub reminder_interval_secs: u64,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            email_webhook_url: get_env_opt("EMAIL_WEBHOOK_URL"),
            notification_webhook_url: get_env_opt("NOTIFICATION_WEBHOOK_URL"),
            webhook_secret: get_env_opt("WEBHOOK_SECRET").unwrap_or_default(),
            reminder_lead_minutes: get_env_parse_or("REMINDER_LEAD_MINUTES", 24 * 60)?,
            reminder_interval_secs: get_env_parse_or("REMINDER_INTERVAL_SECS", 60)?,
            log_format: parse_log_format(get_env_opt("LOG_FORMAT").as_deref())?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat> {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(LogFormat::Pretty),
        Some(v) if v == "pretty" || v == "text" => Ok(LogFormat::Pretty),
        Some(v) if v == "json" => Ok(LogFormat::Json),
        Some(other) => Err(Error::Config(format!(
            "Invalid value for LOG_FORMAT: {}",
            other
        ))),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
