use serde::Deserialize;
use std::env;

// Top-level configuration container, filled from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    /// Upper bound on any single store call; an elapsed timeout surfaces as
    /// a persistence error, not a cancelled booking attempt.
    pub query_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Unset disables outbound notifications entirely.
    pub endpoint_url: Option<String>,
    pub timeout_seconds: u64,
    pub failure_threshold: u32,
    pub breaker_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "reservation_system=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
                query_timeout_seconds: env::var("DB_QUERY_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("DB_QUERY_TIMEOUT_SECONDS must be a valid number"),
            },
            notification: NotificationConfig {
                endpoint_url: env::var("NOTIFICATION_ENDPOINT_URL").ok(),
                timeout_seconds: env::var("NOTIFICATION_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("NOTIFICATION_TIMEOUT_SECONDS must be a valid number"),
                failure_threshold: env::var("NOTIFICATION_FAILURE_THRESHOLD")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("NOTIFICATION_FAILURE_THRESHOLD must be a valid number"),
                breaker_timeout_seconds: env::var("NOTIFICATION_BREAKER_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("NOTIFICATION_BREAKER_TIMEOUT_SECONDS must be a valid number"),
            },
        }
    }
}
