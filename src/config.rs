use std::env;

use crate::error::AppError;

const DEV_AUTH_SECRET: &str = "pakload-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub auth_secret: String,
    pub event_queue_size: usize,
    pub notification_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact or json"
                )));
            }
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            auth_secret: env::var("AUTH_SECRET").unwrap_or_else(|_| DEV_AUTH_SECRET.to_string()),
            event_queue_size: parse_or_default("EVENT_QUEUE_SIZE", 1024)?,
            notification_buffer_size: parse_or_default("NOTIFICATION_BUFFER_SIZE", 1024)?,
        })
    }

    /// True when no `AUTH_SECRET` was configured and tokens are verified
    /// against the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth_secret == DEV_AUTH_SECRET
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
