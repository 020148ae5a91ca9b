use std::time::Duration;

use chrono::NaiveTime;
use garage_core::CoreError;
use garage_events::FcmConfig;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection string for the document store.
    pub database_url: String,
    /// Connection pool size (default: `10`).
    pub database_max_connections: u32,
    /// Push backend settings.
    pub fcm: FcmConfig,
    /// Local time of the daily reminder sweep (default: `09:00`).
    pub sweep_time: NaiveTime,
    /// Run one sweep right after startup (default: `false`).
    pub sweep_on_start: bool,
    /// Log output format (default: text).
    pub log_format: LogFormat,
    /// How long shutdown waits for background services (default: `30`).
    pub shutdown_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                      |
    /// |----------------------------|------------------------------|
    /// | `DATABASE_URL`             | required                     |
    /// | `DATABASE_MAX_CONNECTIONS` | `10`                         |
    /// | `FCM_PROJECT_ID`           | project of the credentials   |
    /// | `FCM_ENDPOINT`             | `https://fcm.googleapis.com` |
    /// | `PUSH_TIMEOUT_SECS`        | `10`                         |
    /// | `SWEEP_TIME`               | `09:00`                      |
    /// | `SWEEP_ON_START`           | `false`                      |
    /// | `LOG_FORMAT`               | `text`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                         |
    ///
    /// The local timezone for quiet hours and the sweep comes from `TZ`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CoreError::Validation("DATABASE_URL must be set".into()))?;

        let database_max_connections: u32 =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let sweep_time = match lookup("SWEEP_TIME") {
            Some(value) => parse_sweep_time(&value)?,
            None => NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        };

        let sweep_on_start = match lookup("SWEEP_ON_START") {
            Some(value) => parse_flag("SWEEP_ON_START", &value)?,
            None => false,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{other}'"
                )))
            }
        };

        let shutdown_timeout_secs: u64 = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?;
        let fcm = FcmConfig::from_lookup(&lookup)?;

        Ok(Self {
            database_url,
            database_max_connections,
            fcm,
            sweep_time,
            sweep_on_start,
            log_format,
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} must be a valid number, got '{value}'"))),
        None => Ok(default),
    }
}

/// Parse a sweep time given as `HH:MM` or `HH:MM:SS`.
pub fn parse_sweep_time(value: &str) -> Result<NaiveTime, CoreError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| CoreError::Validation(format!("SWEEP_TIME must be HH:MM, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, CoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CoreError::Validation(format!("{key} must be a boolean, got '{other}'"))),
    }
}
